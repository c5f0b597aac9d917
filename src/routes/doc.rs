use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        auth::{
            CurrentUserData, ForgotPasswordRequest, LoginData, LoginRequest, ProfileData,
            ProfileSummary, RegisterData, RegisterRequest, TwoFactorChallenge,
            UpdateProfileRequest, UserSummary,
        },
        catalog::{
            CategoryDto, IngredientDetail, IngredientSummary, SupermarketAvailability,
            SupermarketLocation,
        },
        collections::{CollectionPayload, CollectionSummary, LatestRecipe},
        recipes::{
            CollectionWithRecipes, IngredientInput, RecipeDetail, RecipeOwner, RecipePayload,
            StepInput, ToggleCollectionData, ToggleCollectionRequest, ToggleFavoriteData,
        },
    },
    models::{Collection, Recipe, RecipeIngredient, RecipeStep, User},
    response::{ApiResponse, Meta},
    routes::{auth, catalog, collections, health, params, recipes},
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        auth::register,
        auth::login,
        auth::forgot_password,
        auth::logout,
        auth::current_user,
        auth::update_profile,
        catalog::recipe_categories,
        catalog::ingredient_categories,
        catalog::ingredients_full,
        catalog::ingredient_detail,
        recipes::store,
        recipes::index,
        recipes::show,
        recipes::update,
        recipes::destroy,
        recipes::toggle_favorite,
        recipes::favorites,
        recipes::toggle_collection,
        recipes::collection_recipes,
        recipes::remove_from_collection,
        collections::index,
        collections::store,
        collections::update,
        collections::destroy
    ),
    components(
        schemas(
            User,
            Recipe,
            RecipeIngredient,
            RecipeStep,
            Collection,
            RegisterRequest,
            LoginRequest,
            ForgotPasswordRequest,
            UpdateProfileRequest,
            RegisterData,
            LoginData,
            UserSummary,
            TwoFactorChallenge,
            CurrentUserData,
            ProfileData,
            ProfileSummary,
            CategoryDto,
            IngredientSummary,
            IngredientDetail,
            SupermarketAvailability,
            SupermarketLocation,
            RecipePayload,
            IngredientInput,
            StepInput,
            RecipeDetail,
            RecipeOwner,
            ToggleFavoriteData,
            ToggleCollectionRequest,
            ToggleCollectionData,
            CollectionWithRecipes,
            CollectionPayload,
            CollectionSummary,
            LatestRecipe,
            params::Pagination,
            params::RecipeListQuery,
            Meta,
            ApiResponse<RecipeDetail>,
            ApiResponse<Vec<RecipeDetail>>,
            ApiResponse<RegisterData>,
            ApiResponse<Vec<CategoryDto>>,
            ApiResponse<Vec<CollectionSummary>>
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Auth", description = "Registration, sessions and profile"),
        (name = "Catalog", description = "Categories, shopping ingredients and supermarkets"),
        (name = "Recipes", description = "Recipe CRUD"),
        (name = "Favorites", description = "Favorite toggling and listing"),
        (name = "Collections", description = "User-curated recipe collections"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
