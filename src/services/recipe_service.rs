use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sqlx::{FromRow, Postgres, Transaction};
use uuid::Uuid;

use crate::{
    db::DbPool,
    dto::recipes::{
        CollectionWithRecipes, RecipeDetail, RecipeOwner, RecipePayload, ToggleCollectionData,
        ToggleCollectionRequest, ToggleFavoriteData,
    },
    error::{AppError, AppResult, FieldValidator},
    middleware::auth::AuthUser,
    models::{Collection, Recipe, RecipeIngredient, RecipeStep},
    response::{ApiResponse, Meta},
    routes::params::{Pagination, RecipeListQuery},
    state::AppState,
    storage,
};

/// Joined recipe + owner + category projection. The pivot columns are only
/// selected by the collection listing query and default to NULL elsewhere.
#[derive(FromRow)]
struct RecipeDetailRow {
    recipe_id: Uuid,
    title: String,
    description: Option<String>,
    thumbnail_photo: Option<String>,
    preparation_time: Option<i32>,
    cooking_time: Option<i32>,
    servings: Option<i32>,
    created_at: DateTime<Utc>,
    user_id: Uuid,
    username: String,
    category: Option<String>,
    #[sqlx(default)]
    collection_recipe_id: Option<Uuid>,
    #[sqlx(default)]
    added_at: Option<DateTime<Utc>>,
}

impl RecipeDetailRow {
    fn into_detail(self, app_url: &str) -> RecipeDetail {
        RecipeDetail {
            recipe_id: self.recipe_id,
            title: self.title,
            description: self.description,
            thumbnail_photo: storage::thumbnail_url(app_url, self.thumbnail_photo.as_deref()),
            preparation_time: self.preparation_time,
            cooking_time: self.cooking_time,
            servings: self.servings,
            category: self.category,
            user: RecipeOwner {
                user_id: self.user_id,
                username: self.username,
            },
            ingredients: Vec::new(),
            steps: Vec::new(),
            created_at: self.created_at,
            is_favorited: None,
            is_in_collection: None,
            collection_recipe_id: self.collection_recipe_id,
            added_at: self.added_at,
        }
    }
}

const RECIPE_DETAIL_SELECT: &str = r#"
    SELECT r.recipe_id, r.title, r.description, r.thumbnail_photo,
           r.preparation_time, r.cooking_time, r.servings, r.created_at,
           u.user_id, u.username, c.name AS category
    FROM recipes r
    JOIN users u ON u.user_id = r.user_id
    LEFT JOIN recipe_categories c ON c.category_id = r.category_id
"#;

/// Fills in ingredient and step lists for the given details with two batched
/// queries. The same recipe may appear more than once (collection listings).
async fn attach_children(pool: &DbPool, details: &mut [RecipeDetail]) -> AppResult<()> {
    let ids: Vec<Uuid> = details.iter().map(|d| d.recipe_id).collect();
    if ids.is_empty() {
        return Ok(());
    }

    let mut positions: HashMap<Uuid, Vec<usize>> = HashMap::new();
    for (index, detail) in details.iter().enumerate() {
        positions.entry(detail.recipe_id).or_default().push(index);
    }

    let ingredients: Vec<RecipeIngredient> = sqlx::query_as(
        "SELECT * FROM recipe_ingredients WHERE recipe_id = ANY($1) ORDER BY position",
    )
    .bind(&ids)
    .fetch_all(pool)
    .await?;

    let steps: Vec<RecipeStep> =
        sqlx::query_as("SELECT * FROM recipe_steps WHERE recipe_id = ANY($1) ORDER BY step_number")
            .bind(&ids)
            .fetch_all(pool)
            .await?;

    for ingredient in ingredients {
        if let Some(indexes) = positions.get(&ingredient.recipe_id) {
            for &index in indexes {
                details[index].ingredients.push(ingredient.clone());
            }
        }
    }
    for step in steps {
        if let Some(indexes) = positions.get(&step.recipe_id) {
            for &index in indexes {
                details[index].steps.push(step.clone());
            }
        }
    }

    Ok(())
}

async fn load_recipe_detail(state: &AppState, recipe_id: Uuid) -> AppResult<Option<RecipeDetail>> {
    let sql = format!("{RECIPE_DETAIL_SELECT} WHERE r.recipe_id = $1");
    let row: Option<RecipeDetailRow> = sqlx::query_as(&sql)
        .bind(recipe_id)
        .fetch_optional(&state.pool)
        .await?;

    let Some(row) = row else {
        return Ok(None);
    };

    let mut details = vec![row.into_detail(&state.config.app_url)];
    attach_children(&state.pool, &mut details).await?;
    Ok(details.pop())
}

/// One page of recipes, newest first, optionally narrowed to a category or to
/// the recipes a user has favorited.
async fn load_recipe_page(
    state: &AppState,
    favorited_by: Option<Uuid>,
    category_id: Option<Uuid>,
    pagination: &Pagination,
) -> AppResult<(Vec<RecipeDetail>, Meta)> {
    let (page, per_page, offset) = pagination.normalize();

    let sql = format!(
        r#"{RECIPE_DETAIL_SELECT}
        WHERE ($1::uuid IS NULL OR r.category_id = $1)
          AND ($2::uuid IS NULL OR EXISTS (
                SELECT 1 FROM favorites f
                WHERE f.recipe_id = r.recipe_id AND f.user_id = $2))
        ORDER BY r.created_at DESC
        LIMIT $3 OFFSET $4
        "#
    );
    let rows: Vec<RecipeDetailRow> = sqlx::query_as(&sql)
        .bind(category_id)
        .bind(favorited_by)
        .bind(per_page)
        .bind(offset)
        .fetch_all(&state.pool)
        .await?;

    let total: (i64,) = sqlx::query_as(
        r#"
        SELECT COUNT(*) FROM recipes r
        WHERE ($1::uuid IS NULL OR r.category_id = $1)
          AND ($2::uuid IS NULL OR EXISTS (
                SELECT 1 FROM favorites f
                WHERE f.recipe_id = r.recipe_id AND f.user_id = $2))
        "#,
    )
    .bind(category_id)
    .bind(favorited_by)
    .fetch_one(&state.pool)
    .await?;

    let app_url = &state.config.app_url;
    let mut details: Vec<RecipeDetail> = rows
        .into_iter()
        .map(|row| row.into_detail(app_url))
        .collect();
    attach_children(&state.pool, &mut details).await?;

    Ok((details, Meta::new(page, per_page, total.0)))
}

async fn validate_payload(state: &AppState, payload: &RecipePayload) -> AppResult<()> {
    let mut v = FieldValidator::new();

    let title = payload.title.trim();
    if title.is_empty() {
        v.add("title", "The title field is required.");
    } else if title.chars().count() > 255 {
        v.add("title", "The title may not be greater than 255 characters.");
    }

    if payload.preparation_time.is_some_and(|t| t < 0) {
        v.add("preparation_time", "The preparation time must be at least 0.");
    }
    if payload.cooking_time.is_some_and(|t| t < 0) {
        v.add("cooking_time", "The cooking time must be at least 0.");
    }
    if payload.servings.is_some_and(|s| s < 1) {
        v.add("servings", "The servings must be at least 1.");
    }

    if payload.ingredients.is_empty() {
        v.add("ingredients", "At least one ingredient is required.");
    }
    for (i, ingredient) in payload.ingredients.iter().enumerate() {
        if ingredient.name.trim().is_empty() {
            v.add(
                format!("ingredients.{i}.name"),
                "The ingredient name is required.",
            );
        } else if ingredient.name.chars().count() > 100 {
            v.add(
                format!("ingredients.{i}.name"),
                "The ingredient name may not be greater than 100 characters.",
            );
        }
        if ingredient
            .quantity
            .as_deref()
            .is_some_and(|q| q.chars().count() > 50)
        {
            v.add(
                format!("ingredients.{i}.quantity"),
                "The quantity may not be greater than 50 characters.",
            );
        }
        if ingredient
            .unit
            .as_deref()
            .is_some_and(|u| u.chars().count() > 20)
        {
            v.add(
                format!("ingredients.{i}.unit"),
                "The unit may not be greater than 20 characters.",
            );
        }
    }

    if payload.steps.is_empty() {
        v.add("steps", "At least one step is required.");
    }
    for (i, step) in payload.steps.iter().enumerate() {
        if step.step_number < 1 {
            v.add(
                format!("steps.{i}.step_number"),
                "The step number must be at least 1.",
            );
        }
        if step.description.trim().is_empty() {
            v.add(
                format!("steps.{i}.description"),
                "The step description is required.",
            );
        }
    }

    if let Some(category_id) = payload.category_id {
        let found: Option<(Uuid,)> =
            sqlx::query_as("SELECT category_id FROM recipe_categories WHERE category_id = $1")
                .bind(category_id)
                .fetch_optional(&state.pool)
                .await?;
        if found.is_none() {
            v.add("category_id", "The selected category is invalid.");
        }
    }

    v.finish()
}

/// Child rows are always rewritten as a whole; ingredient position comes from
/// payload order, not from anything the client numbers itself.
async fn replace_children(
    tx: &mut Transaction<'_, Postgres>,
    recipe_id: Uuid,
    payload: &RecipePayload,
) -> AppResult<()> {
    sqlx::query("DELETE FROM recipe_ingredients WHERE recipe_id = $1")
        .bind(recipe_id)
        .execute(&mut **tx)
        .await?;
    sqlx::query("DELETE FROM recipe_steps WHERE recipe_id = $1")
        .bind(recipe_id)
        .execute(&mut **tx)
        .await?;

    for (i, ingredient) in payload.ingredients.iter().enumerate() {
        sqlx::query(
            r#"
            INSERT INTO recipe_ingredients (ingredient_id, recipe_id, name, quantity, unit, position)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(recipe_id)
        .bind(ingredient.name.trim())
        .bind(&ingredient.quantity)
        .bind(&ingredient.unit)
        .bind((i + 1) as i32)
        .execute(&mut **tx)
        .await?;
    }

    for step in &payload.steps {
        sqlx::query(
            r#"
            INSERT INTO recipe_steps (step_id, recipe_id, step_number, description)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(recipe_id)
        .bind(step.step_number)
        .bind(&step.description)
        .execute(&mut **tx)
        .await?;
    }

    Ok(())
}

pub async fn create_recipe(
    state: &AppState,
    user: &AuthUser,
    payload: RecipePayload,
) -> AppResult<ApiResponse<RecipeDetail>> {
    validate_payload(state, &payload).await?;

    let recipe_id = Uuid::new_v4();

    // Recipe and children land together or not at all.
    let mut tx = state.pool.begin().await?;
    sqlx::query(
        r#"
        INSERT INTO recipes (recipe_id, user_id, title, description, thumbnail_photo,
                             category_id, preparation_time, cooking_time, servings)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        "#,
    )
    .bind(recipe_id)
    .bind(user.user_id)
    .bind(payload.title.trim())
    .bind(&payload.description)
    .bind(&payload.thumbnail_photo)
    .bind(payload.category_id)
    .bind(payload.preparation_time)
    .bind(payload.cooking_time)
    .bind(payload.servings)
    .execute(&mut *tx)
    .await?;
    replace_children(&mut tx, recipe_id, &payload).await?;
    tx.commit().await?;

    let detail = load_recipe_detail(state, recipe_id)
        .await?
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("recipe missing after insert")))?;

    Ok(ApiResponse::success(
        "Recipe created successfully",
        detail,
        None,
    ))
}

pub async fn list_recipes(
    state: &AppState,
    query: RecipeListQuery,
) -> AppResult<ApiResponse<Vec<RecipeDetail>>> {
    let (details, meta) =
        load_recipe_page(state, None, query.category_id, &query.pagination()).await?;
    Ok(ApiResponse::success("OK", details, Some(meta)))
}

pub async fn get_recipe(
    state: &AppState,
    viewer: Option<&AuthUser>,
    recipe_id: Uuid,
) -> AppResult<ApiResponse<RecipeDetail>> {
    let detail = load_recipe_detail(state, recipe_id).await?;
    let mut detail = match detail {
        Some(d) => d,
        None => return Err(AppError::NotFound("Recipe not found".into())),
    };

    match viewer {
        Some(user) => {
            let (is_favorited,): (bool,) = sqlx::query_as(
                "SELECT EXISTS (SELECT 1 FROM favorites WHERE user_id = $1 AND recipe_id = $2)",
            )
            .bind(user.user_id)
            .bind(recipe_id)
            .fetch_one(&state.pool)
            .await?;

            let (is_in_collection,): (bool,) = sqlx::query_as(
                r#"
                SELECT EXISTS (
                    SELECT 1 FROM collection_recipe cr
                    JOIN collections c ON c.collection_id = cr.collection_id
                    WHERE cr.recipe_id = $1 AND c.user_id = $2
                )
                "#,
            )
            .bind(recipe_id)
            .bind(user.user_id)
            .fetch_one(&state.pool)
            .await?;

            detail.is_favorited = Some(is_favorited);
            detail.is_in_collection = Some(is_in_collection);
        }
        None => {
            detail.is_favorited = Some(false);
            detail.is_in_collection = Some(false);
        }
    }

    Ok(ApiResponse::success("OK", detail, None))
}

pub async fn update_recipe(
    state: &AppState,
    user: &AuthUser,
    recipe_id: Uuid,
    payload: RecipePayload,
) -> AppResult<ApiResponse<RecipeDetail>> {
    let existing: Option<Recipe> = sqlx::query_as("SELECT * FROM recipes WHERE recipe_id = $1")
        .bind(recipe_id)
        .fetch_optional(&state.pool)
        .await?;
    let existing = match existing {
        Some(r) => r,
        None => return Err(AppError::NotFound("Recipe not found".into())),
    };
    if existing.user_id != user.user_id {
        return Err(AppError::Forbidden("Not allowed to modify this recipe".into()));
    }

    validate_payload(state, &payload).await?;

    // No new thumbnail keeps the stored one.
    let thumbnail = payload
        .thumbnail_photo
        .clone()
        .or_else(|| existing.thumbnail_photo.clone());
    let thumbnail_replaced = payload.thumbnail_photo.is_some()
        && payload.thumbnail_photo != existing.thumbnail_photo;

    let mut tx = state.pool.begin().await?;
    sqlx::query(
        r#"
        UPDATE recipes
        SET title = $2, description = $3, thumbnail_photo = $4, category_id = $5,
            preparation_time = $6, cooking_time = $7, servings = $8, updated_at = now()
        WHERE recipe_id = $1
        "#,
    )
    .bind(recipe_id)
    .bind(payload.title.trim())
    .bind(&payload.description)
    .bind(&thumbnail)
    .bind(payload.category_id)
    .bind(payload.preparation_time)
    .bind(payload.cooking_time)
    .bind(payload.servings)
    .execute(&mut *tx)
    .await?;
    replace_children(&mut tx, recipe_id, &payload).await?;
    tx.commit().await?;

    if thumbnail_replaced {
        if let Some(old) = existing.thumbnail_photo.as_deref() {
            storage::delete_stored_file(&state.config.storage_dir, old).await;
        }
    }

    let detail = load_recipe_detail(state, recipe_id)
        .await?
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("recipe missing after update")))?;

    Ok(ApiResponse::success(
        "Recipe updated successfully",
        detail,
        None,
    ))
}

pub async fn delete_recipe(
    state: &AppState,
    user: &AuthUser,
    recipe_id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let existing: Option<Recipe> = sqlx::query_as("SELECT * FROM recipes WHERE recipe_id = $1")
        .bind(recipe_id)
        .fetch_optional(&state.pool)
        .await?;
    let existing = match existing {
        Some(r) => r,
        None => return Err(AppError::NotFound("Recipe not found".into())),
    };
    if existing.user_id != user.user_id {
        return Err(AppError::Forbidden("Not allowed to delete this recipe".into()));
    }

    // Children, favorites and collection memberships go with the recipe via
    // FK cascade.
    sqlx::query("DELETE FROM recipes WHERE recipe_id = $1")
        .bind(recipe_id)
        .execute(&state.pool)
        .await?;

    if let Some(thumbnail) = existing.thumbnail_photo.as_deref() {
        storage::delete_stored_file(&state.config.storage_dir, thumbnail).await;
    }

    Ok(ApiResponse::message_only("Recipe deleted successfully"))
}

/// Flips favorite state without a read-then-write window: the conditional
/// delete settles "was it there", and the insert leans on the unique pair
/// constraint when two flips race.
pub async fn toggle_favorite(
    state: &AppState,
    user: &AuthUser,
    recipe_id: Uuid,
) -> AppResult<ApiResponse<ToggleFavoriteData>> {
    let recipe: Option<(Uuid,)> = sqlx::query_as("SELECT recipe_id FROM recipes WHERE recipe_id = $1")
        .bind(recipe_id)
        .fetch_optional(&state.pool)
        .await?;
    if recipe.is_none() {
        return Err(AppError::NotFound("Recipe not found".into()));
    }

    let removed = sqlx::query("DELETE FROM favorites WHERE user_id = $1 AND recipe_id = $2")
        .bind(user.user_id)
        .bind(recipe_id)
        .execute(&state.pool)
        .await?
        .rows_affected()
        > 0;

    let is_favorited = if removed {
        false
    } else {
        sqlx::query(
            r#"
            INSERT INTO favorites (favorite_id, user_id, recipe_id)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id, recipe_id) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user.user_id)
        .bind(recipe_id)
        .execute(&state.pool)
        .await?;
        true
    };

    let message = if is_favorited {
        "Added to favorites"
    } else {
        "Removed from favorites"
    };
    Ok(ApiResponse::success(
        message,
        ToggleFavoriteData { is_favorited },
        None,
    ))
}

pub async fn list_favorites(
    state: &AppState,
    user: &AuthUser,
    query: RecipeListQuery,
) -> AppResult<ApiResponse<Vec<RecipeDetail>>> {
    let (details, meta) = load_recipe_page(
        state,
        Some(user.user_id),
        query.category_id,
        &query.pagination(),
    )
    .await?;
    Ok(ApiResponse::success("OK", details, Some(meta)))
}

/// Same flip as favorites, on the collection membership pivot. A bogus
/// recipe id trips the FK and surfaces as a generic 500, detail server-side.
pub async fn toggle_collection_membership(
    state: &AppState,
    user: &AuthUser,
    payload: ToggleCollectionRequest,
) -> AppResult<ApiResponse<ToggleCollectionData>> {
    let owned: Option<(Uuid,)> = sqlx::query_as(
        "SELECT collection_id FROM collections WHERE collection_id = $1 AND user_id = $2",
    )
    .bind(payload.collection_id)
    .bind(user.user_id)
    .fetch_optional(&state.pool)
    .await?;
    if owned.is_none() {
        return Err(AppError::NotFound(
            "Collection not found or you do not have access".into(),
        ));
    }

    let removed = sqlx::query(
        "DELETE FROM collection_recipe WHERE collection_id = $1 AND recipe_id = $2",
    )
    .bind(payload.collection_id)
    .bind(payload.recipe_id)
    .execute(&state.pool)
    .await?
    .rows_affected()
        > 0;

    let is_in_collection = if removed {
        false
    } else {
        sqlx::query(
            r#"
            INSERT INTO collection_recipe (collection_recipe_id, collection_id, recipe_id, added_at)
            VALUES ($1, $2, $3, now())
            ON CONFLICT (collection_id, recipe_id) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(payload.collection_id)
        .bind(payload.recipe_id)
        .execute(&state.pool)
        .await?;
        true
    };

    let message = if is_in_collection {
        "Recipe added to collection"
    } else {
        "Recipe removed from collection"
    };
    Ok(ApiResponse::success(
        message,
        ToggleCollectionData { is_in_collection },
        None,
    ))
}

#[derive(FromRow)]
struct CollectionRecipeRow {
    collection_id: Uuid,
    #[sqlx(flatten)]
    recipe: RecipeDetailRow,
}

/// Caller's collections with every member recipe fully projected, each
/// carrying its pivot id and added-at timestamp.
pub async fn list_collections_with_recipes(
    state: &AppState,
    user: &AuthUser,
    pagination: Pagination,
) -> AppResult<ApiResponse<Vec<CollectionWithRecipes>>> {
    let (page, per_page, offset) = pagination.normalize();

    let collections: Vec<Collection> = sqlx::query_as(
        r#"
        SELECT * FROM collections
        WHERE user_id = $1
        ORDER BY created_at DESC
        LIMIT $2 OFFSET $3
        "#,
    )
    .bind(user.user_id)
    .bind(per_page)
    .bind(offset)
    .fetch_all(&state.pool)
    .await?;

    let total: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM collections WHERE user_id = $1")
        .bind(user.user_id)
        .fetch_one(&state.pool)
        .await?;

    let ids: Vec<Uuid> = collections.iter().map(|c| c.collection_id).collect();
    let rows: Vec<CollectionRecipeRow> = if ids.is_empty() {
        Vec::new()
    } else {
        sqlx::query_as(
            r#"
            SELECT cr.collection_id, cr.collection_recipe_id, cr.added_at,
                   r.recipe_id, r.title, r.description, r.thumbnail_photo,
                   r.preparation_time, r.cooking_time, r.servings, r.created_at,
                   u.user_id, u.username, c.name AS category
            FROM collection_recipe cr
            JOIN recipes r ON r.recipe_id = cr.recipe_id
            JOIN users u ON u.user_id = r.user_id
            LEFT JOIN recipe_categories c ON c.category_id = r.category_id
            WHERE cr.collection_id = ANY($1)
            ORDER BY cr.added_at DESC
            "#,
        )
        .bind(&ids)
        .fetch_all(&state.pool)
        .await?
    };

    let app_url = &state.config.app_url;
    let mut details: Vec<RecipeDetail> = Vec::with_capacity(rows.len());
    let mut owners: Vec<Uuid> = Vec::with_capacity(rows.len());
    for row in rows {
        owners.push(row.collection_id);
        details.push(row.recipe.into_detail(app_url));
    }
    attach_children(&state.pool, &mut details).await?;

    let mut grouped: HashMap<Uuid, Vec<RecipeDetail>> = HashMap::new();
    for (collection_id, detail) in owners.into_iter().zip(details) {
        grouped.entry(collection_id).or_default().push(detail);
    }

    let data = collections
        .into_iter()
        .map(|collection| CollectionWithRecipes {
            recipes: grouped
                .remove(&collection.collection_id)
                .unwrap_or_default(),
            collection_id: collection.collection_id,
            user_id: collection.user_id,
            name: collection.name,
            created_at: collection.created_at,
        })
        .collect();

    Ok(ApiResponse::success(
        "OK",
        data,
        Some(Meta::new(page, per_page, total.0)),
    ))
}

pub async fn remove_recipe_from_collection(
    state: &AppState,
    user: &AuthUser,
    collection_id: Uuid,
    recipe_id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let owned: Option<(Uuid,)> = sqlx::query_as(
        "SELECT collection_id FROM collections WHERE collection_id = $1 AND user_id = $2",
    )
    .bind(collection_id)
    .bind(user.user_id)
    .fetch_optional(&state.pool)
    .await?;
    if owned.is_none() {
        return Err(AppError::NotFound(
            "Collection not found or you do not have access".into(),
        ));
    }

    let result = sqlx::query(
        "DELETE FROM collection_recipe WHERE collection_id = $1 AND recipe_id = $2",
    )
    .bind(collection_id)
    .bind(recipe_id)
    .execute(&state.pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Recipe not found in this collection".into()));
    }

    Ok(ApiResponse::message_only(
        "Recipe removed from collection successfully",
    ))
}
