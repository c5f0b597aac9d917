use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use crate::{
    dto::catalog::{
        CategoryDto, IngredientDetail, IngredientSummary, SupermarketAvailability,
        SupermarketLocation,
    },
    error::{AppError, AppResult},
    response::ApiResponse,
    state::AppState,
    storage,
};

pub async fn list_recipe_categories(
    state: &AppState,
) -> AppResult<ApiResponse<Vec<CategoryDto>>> {
    let categories: Vec<CategoryDto> = sqlx::query_as(
        "SELECT category_id, name, description FROM recipe_categories ORDER BY name",
    )
    .fetch_all(&state.pool)
    .await?;

    Ok(ApiResponse::success("OK", categories, None))
}

pub async fn list_ingredient_categories(
    state: &AppState,
) -> AppResult<ApiResponse<Vec<CategoryDto>>> {
    let categories: Vec<CategoryDto> = sqlx::query_as(
        "SELECT category_id, name, description FROM ingredient_categories ORDER BY name",
    )
    .fetch_all(&state.pool)
    .await?;

    Ok(ApiResponse::success("OK", categories, None))
}

#[derive(FromRow)]
struct IngredientRow {
    ingredient_id: Uuid,
    name: String,
    price: Option<f64>,
    photo: Option<String>,
    category: Option<String>,
}

pub async fn list_ingredients_full(
    state: &AppState,
) -> AppResult<ApiResponse<Vec<IngredientSummary>>> {
    let rows: Vec<IngredientRow> = sqlx::query_as(
        r#"
        SELECT i.ingredient_id, i.name, i.price, i.photo, c.name AS category
        FROM ingredients i
        LEFT JOIN ingredient_categories c ON c.category_id = i.category_id
        ORDER BY i.name
        "#,
    )
    .fetch_all(&state.pool)
    .await?;

    let app_url = &state.config.app_url;
    let ingredients = rows
        .into_iter()
        .map(|row| IngredientSummary {
            id: row.ingredient_id,
            name: row.name,
            price: row.price,
            image_url: storage::ingredient_image_url(app_url, row.photo.as_deref()),
            category: row.category,
        })
        .collect();

    Ok(ApiResponse::success("OK", ingredients, None))
}

#[derive(FromRow)]
struct IngredientDetailRow {
    ingredient_id: Uuid,
    name: String,
    price: Option<f64>,
    photo: Option<String>,
    description: Option<String>,
    category: Option<String>,
}

#[derive(FromRow)]
struct SupermarketRow {
    supermarket_id: Uuid,
    name: String,
    address: Option<String>,
    latitude: f64,
    longitude: f64,
    is_available: bool,
    last_updated: Option<DateTime<Utc>>,
}

pub async fn ingredient_detail(
    state: &AppState,
    id: Uuid,
) -> AppResult<ApiResponse<IngredientDetail>> {
    let row: Option<IngredientDetailRow> = sqlx::query_as(
        r#"
        SELECT i.ingredient_id, i.name, i.price, i.photo, i.description, c.name AS category
        FROM ingredients i
        LEFT JOIN ingredient_categories c ON c.category_id = i.category_id
        WHERE i.ingredient_id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(&state.pool)
    .await?;

    let row = match row {
        Some(r) => r,
        None => return Err(AppError::NotFound("Ingredient not found".into())),
    };

    let supermarkets: Vec<SupermarketRow> = sqlx::query_as(
        r#"
        SELECT s.supermarket_id, s.name, s.address, s.latitude, s.longitude,
               si.is_available, si.last_updated
        FROM supermarket_ingredients si
        JOIN supermarkets s ON s.supermarket_id = si.supermarket_id
        WHERE si.ingredient_id = $1
        ORDER BY s.name
        "#,
    )
    .bind(id)
    .fetch_all(&state.pool)
    .await?;

    let detail = IngredientDetail {
        id: row.ingredient_id,
        name: row.name,
        price: row.price,
        image_url: storage::ingredient_image_url(&state.config.app_url, row.photo.as_deref()),
        category: row.category.unwrap_or_else(|| "Umum".to_string()),
        description: row.description.unwrap_or_default(),
        supermarkets: supermarkets
            .into_iter()
            .map(|s| SupermarketAvailability {
                id: s.supermarket_id,
                name: s.name,
                address: s.address,
                location: SupermarketLocation {
                    latitude: s.latitude,
                    longitude: s.longitude,
                },
                is_available: s.is_available,
                last_updated: s.last_updated,
            })
            .collect(),
    };

    Ok(ApiResponse::success("OK", detail, None))
}
