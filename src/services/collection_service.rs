use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use crate::{
    dto::collections::{CollectionPayload, CollectionSummary, LatestRecipe},
    error::{AppError, AppResult, FieldValidator},
    middleware::auth::AuthUser,
    models::Collection,
    response::ApiResponse,
    state::AppState,
    storage,
};

fn validate_name(name: &str) -> AppResult<String> {
    let name = name.trim().to_string();
    let mut v = FieldValidator::new();
    if name.is_empty() {
        v.add("name", "The name field is required.");
    } else if name.chars().count() > 100 {
        v.add("name", "The name may not be greater than 100 characters.");
    }
    v.finish()?;
    Ok(name)
}

#[derive(FromRow)]
struct CollectionSummaryRow {
    collection_id: Uuid,
    user_id: Uuid,
    name: String,
    created_at: DateTime<Utc>,
    recipes_count: i64,
    latest_recipe_id: Option<Uuid>,
    latest_thumbnail: Option<String>,
}

/// Index view: every collection the caller owns, newest first, with member
/// count and the most recently created member recipe for the cover image.
pub async fn list_collections(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<Vec<CollectionSummary>>> {
    let rows: Vec<CollectionSummaryRow> = sqlx::query_as(
        r#"
        SELECT c.collection_id, c.user_id, c.name, c.created_at,
               (SELECT COUNT(*) FROM collection_recipe cr
                 WHERE cr.collection_id = c.collection_id) AS recipes_count,
               latest.recipe_id AS latest_recipe_id,
               latest.thumbnail_photo AS latest_thumbnail
        FROM collections c
        LEFT JOIN LATERAL (
            SELECT r.recipe_id, r.thumbnail_photo
            FROM collection_recipe cr
            JOIN recipes r ON r.recipe_id = cr.recipe_id
            WHERE cr.collection_id = c.collection_id
            ORDER BY r.created_at DESC
            LIMIT 1
        ) latest ON true
        WHERE c.user_id = $1
        ORDER BY c.created_at DESC
        "#,
    )
    .bind(user.user_id)
    .fetch_all(&state.pool)
    .await?;

    let app_url = &state.config.app_url;
    let collections = rows
        .into_iter()
        .map(|row| CollectionSummary {
            collection_id: row.collection_id,
            user_id: row.user_id,
            name: row.name,
            created_at: row.created_at,
            recipes_count: row.recipes_count,
            latest_recipe: row.latest_recipe_id.map(|recipe_id| LatestRecipe {
                recipe_id,
                thumbnail_photo: storage::thumbnail_url(app_url, row.latest_thumbnail.as_deref()),
            }),
        })
        .collect();

    Ok(ApiResponse::success("OK", collections, None))
}

pub async fn create_collection(
    state: &AppState,
    user: &AuthUser,
    payload: CollectionPayload,
) -> AppResult<ApiResponse<Collection>> {
    let name = validate_name(&payload.name)?;

    let collection: Collection = sqlx::query_as(
        "INSERT INTO collections (collection_id, user_id, name) VALUES ($1, $2, $3) RETURNING *",
    )
    .bind(Uuid::new_v4())
    .bind(user.user_id)
    .bind(&name)
    .fetch_one(&state.pool)
    .await?;

    Ok(ApiResponse::success(
        "Collection created successfully",
        collection,
        None,
    ))
}

pub async fn update_collection(
    state: &AppState,
    user: &AuthUser,
    collection_id: Uuid,
    payload: CollectionPayload,
) -> AppResult<ApiResponse<Collection>> {
    let name = validate_name(&payload.name)?;

    let updated: Option<Collection> = sqlx::query_as(
        "UPDATE collections SET name = $3 WHERE collection_id = $1 AND user_id = $2 RETURNING *",
    )
    .bind(collection_id)
    .bind(user.user_id)
    .bind(&name)
    .fetch_optional(&state.pool)
    .await?;

    match updated {
        Some(collection) => Ok(ApiResponse::success(
            "Collection updated successfully",
            collection,
            None,
        )),
        None => Err(AppError::NotFound("Collection not found".into())),
    }
}

pub async fn delete_collection(
    state: &AppState,
    user: &AuthUser,
    collection_id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let result = sqlx::query("DELETE FROM collections WHERE collection_id = $1 AND user_id = $2")
        .bind(collection_id)
        .bind(user.user_id)
        .execute(&state.pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Collection not found".into()));
    }

    Ok(ApiResponse::message_only("Collection deleted successfully"))
}
