use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Serialize, FromRow, ToSchema)]
pub struct User {
    pub user_id: Uuid,
    pub username: String,
    pub email: String,
    // The hash must never leave the server.
    #[serde(skip_serializing)]
    #[schema(ignore)]
    pub password_hash: String,
    pub profile_picture: Option<String>,
    pub email_verified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, FromRow, ToSchema)]
pub struct Recipe {
    pub recipe_id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub thumbnail_photo: Option<String>,
    pub category_id: Option<Uuid>,
    pub preparation_time: Option<i32>,
    pub cooking_time: Option<i32>,
    pub servings: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct RecipeIngredient {
    pub ingredient_id: Uuid,
    pub recipe_id: Uuid,
    pub name: String,
    pub quantity: Option<String>,
    pub unit: Option<String>,
    pub position: i32,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct RecipeStep {
    pub step_id: Uuid,
    pub recipe_id: Uuid,
    pub step_number: i32,
    pub description: String,
}

#[derive(Debug, Serialize, FromRow, ToSchema)]
pub struct Collection {
    pub collection_id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
}
