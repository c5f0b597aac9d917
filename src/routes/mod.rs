use axum::Router;

use crate::state::AppState;

pub mod auth;
pub mod catalog;
pub mod collections;
pub mod doc;
pub mod health;
pub mod params;
pub mod recipes;

// Build the API router without binding state; it will be provided at the top level.
pub fn create_api_router() -> Router<AppState> {
    Router::new()
        .merge(auth::router())
        .merge(catalog::router())
        .merge(recipes::router())
        .merge(collections::router())
}
