use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, put},
};
use uuid::Uuid;

use crate::{
    dto::collections::{CollectionPayload, CollectionSummary},
    error::AppResult,
    middleware::auth::AuthUser,
    models::Collection,
    response::ApiResponse,
    services::collection_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/collections", get(index).post(store))
        .route("/collections/{id}", put(update).delete(destroy))
}

#[utoipa::path(
    get,
    path = "/api/collections",
    responses(
        (status = 200, description = "Caller's collections with counts and cover", body = ApiResponse<Vec<CollectionSummary>>)
    ),
    security(("bearer_auth" = [])),
    tag = "Collections"
)]
pub async fn index(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<Vec<CollectionSummary>>>> {
    let resp = collection_service::list_collections(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/collections",
    request_body = CollectionPayload,
    responses(
        (status = 201, description = "Collection created", body = ApiResponse<Collection>),
        (status = 422, description = "Validation error")
    ),
    security(("bearer_auth" = [])),
    tag = "Collections"
)]
pub async fn store(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CollectionPayload>,
) -> AppResult<(StatusCode, Json<ApiResponse<Collection>>)> {
    let resp = collection_service::create_collection(&state, &user, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    put,
    path = "/api/collections/{id}",
    params(("id" = Uuid, Path, description = "Collection ID")),
    request_body = CollectionPayload,
    responses(
        (status = 200, description = "Collection renamed", body = ApiResponse<Collection>),
        (status = 404, description = "Collection not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Collections"
)]
pub async fn update(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<CollectionPayload>,
) -> AppResult<Json<ApiResponse<Collection>>> {
    let resp = collection_service::update_collection(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/collections/{id}",
    params(("id" = Uuid, Path, description = "Collection ID")),
    responses(
        (status = 200, description = "Collection deleted", body = ApiResponse<serde_json::Value>),
        (status = 404, description = "Collection not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Collections"
)]
pub async fn destroy(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = collection_service::delete_collection(&state, &user, id).await?;
    Ok(Json(resp))
}
