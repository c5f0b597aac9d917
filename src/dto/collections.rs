use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CollectionPayload {
    pub name: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LatestRecipe {
    pub recipe_id: Uuid,
    pub thumbnail_photo: Option<String>,
}

/// Lightweight index entry: total member count plus the newest member's
/// thumbnail for display.
#[derive(Debug, Serialize, ToSchema)]
pub struct CollectionSummary {
    pub collection_id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub recipes_count: i64,
    pub latest_recipe: Option<LatestRecipe>,
}
