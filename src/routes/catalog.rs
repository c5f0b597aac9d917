use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};
use uuid::Uuid;

use crate::{
    dto::catalog::{CategoryDto, IngredientDetail, IngredientSummary},
    error::AppResult,
    response::ApiResponse,
    services::catalog_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/recipecategories", get(recipe_categories))
        .route("/ingredientcategories", get(ingredient_categories))
        .route("/ingredients/full", get(ingredients_full))
        .route("/ingredient/{id}", get(ingredient_detail))
}

#[utoipa::path(
    get,
    path = "/api/recipecategories",
    responses(
        (status = 200, description = "All recipe categories", body = ApiResponse<Vec<CategoryDto>>)
    ),
    tag = "Catalog"
)]
pub async fn recipe_categories(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<Vec<CategoryDto>>>> {
    let resp = catalog_service::list_recipe_categories(&state).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/ingredientcategories",
    responses(
        (status = 200, description = "All ingredient categories", body = ApiResponse<Vec<CategoryDto>>)
    ),
    tag = "Catalog"
)]
pub async fn ingredient_categories(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<Vec<CategoryDto>>>> {
    let resp = catalog_service::list_ingredient_categories(&state).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/ingredients/full",
    responses(
        (status = 200, description = "Catalog ingredients", body = ApiResponse<Vec<IngredientSummary>>)
    ),
    tag = "Catalog"
)]
pub async fn ingredients_full(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<Vec<IngredientSummary>>>> {
    let resp = catalog_service::list_ingredients_full(&state).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/ingredient/{id}",
    params(("id" = Uuid, Path, description = "Ingredient ID")),
    responses(
        (status = 200, description = "Ingredient with supermarket availability", body = ApiResponse<IngredientDetail>),
        (status = 404, description = "Ingredient not found")
    ),
    tag = "Catalog"
)]
pub async fn ingredient_detail(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<IngredientDetail>>> {
    let resp = catalog_service::ingredient_detail(&state, id).await?;
    Ok(Json(resp))
}
