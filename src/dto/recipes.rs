use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::{RecipeIngredient, RecipeStep};

#[derive(Debug, Deserialize, ToSchema)]
pub struct IngredientInput {
    pub name: String,
    pub quantity: Option<String>,
    pub unit: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct StepInput {
    pub step_number: i32,
    pub description: String,
}

/// Shared body for create and update; updates use full-replace semantics for
/// the nested arrays.
#[derive(Debug, Deserialize, ToSchema)]
pub struct RecipePayload {
    pub title: String,
    pub description: Option<String>,
    /// Stored path of an already-uploaded thumbnail.
    pub thumbnail_photo: Option<String>,
    pub category_id: Option<Uuid>,
    pub preparation_time: Option<i32>,
    pub cooking_time: Option<i32>,
    pub servings: Option<i32>,
    pub ingredients: Vec<IngredientInput>,
    pub steps: Vec<StepInput>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RecipeOwner {
    pub user_id: Uuid,
    pub username: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RecipeDetail {
    pub recipe_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    /// Derived URL, not the raw stored path.
    pub thumbnail_photo: Option<String>,
    pub preparation_time: Option<i32>,
    pub cooking_time: Option<i32>,
    pub servings: Option<i32>,
    pub category: Option<String>,
    pub user: RecipeOwner,
    pub ingredients: Vec<RecipeIngredient>,
    pub steps: Vec<RecipeStep>,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_favorited: Option<bool>,
    #[serde(rename = "isInCollection", skip_serializing_if = "Option::is_none")]
    pub is_in_collection: Option<bool>,
    /// Pivot data, present only inside collection listings.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collection_recipe_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub added_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ToggleFavoriteData {
    pub is_favorited: bool,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ToggleCollectionRequest {
    pub recipe_id: Uuid,
    pub collection_id: Uuid,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ToggleCollectionData {
    pub is_in_collection: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CollectionWithRecipes {
    pub collection_id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub recipes: Vec<RecipeDetail>,
}
