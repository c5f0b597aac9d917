use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Serialize, FromRow, ToSchema)]
pub struct CategoryDto {
    pub category_id: Uuid,
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct IngredientSummary {
    pub id: Uuid,
    pub name: String,
    pub price: Option<f64>,
    #[serde(rename = "imageUrl")]
    pub image_url: String,
    pub category: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SupermarketLocation {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SupermarketAvailability {
    pub id: Uuid,
    pub name: String,
    pub address: Option<String>,
    pub location: SupermarketLocation,
    #[serde(rename = "isAvailable")]
    pub is_available: bool,
    #[serde(rename = "lastUpdated")]
    pub last_updated: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct IngredientDetail {
    pub id: Uuid,
    pub name: String,
    pub price: Option<f64>,
    #[serde(rename = "imageUrl")]
    pub image_url: String,
    pub category: String,
    pub description: String,
    pub supermarkets: Vec<SupermarketAvailability>,
}
