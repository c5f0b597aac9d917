use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, post},
};
use uuid::Uuid;

use crate::{
    dto::recipes::{
        CollectionWithRecipes, RecipeDetail, RecipePayload, ToggleCollectionData,
        ToggleCollectionRequest, ToggleFavoriteData,
    },
    error::AppResult,
    middleware::auth::{AuthUser, OptionalAuthUser},
    response::ApiResponse,
    routes::params::{Pagination, RecipeListQuery},
    services::recipe_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/recipes", get(index).post(store))
        .route(
            "/recipes/{id}",
            get(show).put(update).delete(destroy),
        )
        .route("/recipes/{id}/favorite", post(toggle_favorite))
        .route("/favorites", get(favorites))
        .route("/toggle-collection", post(toggle_collection))
        .route("/collections/recipes", get(collection_recipes))
        .route(
            "/collections/{collection_id}/recipes/{recipe_id}",
            delete(remove_from_collection),
        )
}

#[utoipa::path(
    post,
    path = "/api/recipes",
    request_body = RecipePayload,
    responses(
        (status = 201, description = "Recipe created", body = ApiResponse<RecipeDetail>),
        (status = 422, description = "Validation error")
    ),
    security(("bearer_auth" = [])),
    tag = "Recipes"
)]
pub async fn store(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<RecipePayload>,
) -> AppResult<(StatusCode, Json<ApiResponse<RecipeDetail>>)> {
    let resp = recipe_service::create_recipe(&state, &user, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    get,
    path = "/api/recipes",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 10"),
        ("category_id" = Option<Uuid>, Query, description = "Filter by category")
    ),
    responses(
        (status = 200, description = "Paginated recipes", body = ApiResponse<Vec<RecipeDetail>>)
    ),
    security(("bearer_auth" = [])),
    tag = "Recipes"
)]
pub async fn index(
    State(state): State<AppState>,
    _user: AuthUser,
    Query(query): Query<RecipeListQuery>,
) -> AppResult<Json<ApiResponse<Vec<RecipeDetail>>>> {
    let resp = recipe_service::list_recipes(&state, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/recipes/{id}",
    params(("id" = Uuid, Path, description = "Recipe ID")),
    responses(
        (status = 200, description = "Recipe detail with viewer flags", body = ApiResponse<RecipeDetail>),
        (status = 404, description = "Recipe not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Recipes"
)]
pub async fn show(
    State(state): State<AppState>,
    OptionalAuthUser(viewer): OptionalAuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<RecipeDetail>>> {
    let resp = recipe_service::get_recipe(&state, viewer.as_ref(), id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/recipes/{id}",
    params(("id" = Uuid, Path, description = "Recipe ID")),
    request_body = RecipePayload,
    responses(
        (status = 200, description = "Recipe updated", body = ApiResponse<RecipeDetail>),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Recipe not found"),
        (status = 422, description = "Validation error")
    ),
    security(("bearer_auth" = [])),
    tag = "Recipes"
)]
pub async fn update(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<RecipePayload>,
) -> AppResult<Json<ApiResponse<RecipeDetail>>> {
    let resp = recipe_service::update_recipe(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/recipes/{id}",
    params(("id" = Uuid, Path, description = "Recipe ID")),
    responses(
        (status = 200, description = "Recipe deleted", body = ApiResponse<serde_json::Value>),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Recipe not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Recipes"
)]
pub async fn destroy(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = recipe_service::delete_recipe(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/recipes/{id}/favorite",
    params(("id" = Uuid, Path, description = "Recipe ID")),
    responses(
        (status = 200, description = "Favorite state flipped", body = ApiResponse<ToggleFavoriteData>),
        (status = 404, description = "Recipe not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Favorites"
)]
pub async fn toggle_favorite(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<ToggleFavoriteData>>> {
    let resp = recipe_service::toggle_favorite(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/favorites",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 10"),
        ("category_id" = Option<Uuid>, Query, description = "Filter by category")
    ),
    responses(
        (status = 200, description = "Caller's favorited recipes", body = ApiResponse<Vec<RecipeDetail>>)
    ),
    security(("bearer_auth" = [])),
    tag = "Favorites"
)]
pub async fn favorites(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<RecipeListQuery>,
) -> AppResult<Json<ApiResponse<Vec<RecipeDetail>>>> {
    let resp = recipe_service::list_favorites(&state, &user, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/toggle-collection",
    request_body = ToggleCollectionRequest,
    responses(
        (status = 200, description = "Membership flipped", body = ApiResponse<ToggleCollectionData>),
        (status = 404, description = "Collection not owned by caller")
    ),
    security(("bearer_auth" = [])),
    tag = "Collections"
)]
pub async fn toggle_collection(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<ToggleCollectionRequest>,
) -> AppResult<Json<ApiResponse<ToggleCollectionData>>> {
    let resp = recipe_service::toggle_collection_membership(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/collections/recipes",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 10")
    ),
    responses(
        (status = 200, description = "Collections with member recipes", body = ApiResponse<Vec<CollectionWithRecipes>>)
    ),
    security(("bearer_auth" = [])),
    tag = "Collections"
)]
pub async fn collection_recipes(
    State(state): State<AppState>,
    user: AuthUser,
    Query(pagination): Query<Pagination>,
) -> AppResult<Json<ApiResponse<Vec<CollectionWithRecipes>>>> {
    let resp = recipe_service::list_collections_with_recipes(&state, &user, pagination).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/collections/{collection_id}/recipes/{recipe_id}",
    params(
        ("collection_id" = Uuid, Path, description = "Collection ID"),
        ("recipe_id" = Uuid, Path, description = "Recipe ID")
    ),
    responses(
        (status = 200, description = "Removed from collection", body = ApiResponse<serde_json::Value>),
        (status = 404, description = "Collection not owned or recipe not in it")
    ),
    security(("bearer_auth" = [])),
    tag = "Collections"
)]
pub async fn remove_from_collection(
    State(state): State<AppState>,
    user: AuthUser,
    Path((collection_id, recipe_id)): Path<(Uuid, Uuid)>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp =
        recipe_service::remove_recipe_from_collection(&state, &user, collection_id, recipe_id)
            .await?;
    Ok(Json(resp))
}
