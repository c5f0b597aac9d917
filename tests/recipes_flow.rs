use recipe_share_api::{
    config::AppConfig,
    db::create_pool,
    dto::{
        auth::RegisterRequest,
        recipes::{IngredientInput, RecipePayload, StepInput},
    },
    error::AppError,
    middleware::auth::AuthUser,
    routes::params::RecipeListQuery,
    services::{auth_service, recipe_service},
    state::AppState,
};
use uuid::Uuid;

// Integration flow: create -> list -> update (full replace) -> favorite
// toggles -> delete with cascade.
#[tokio::test]
async fn recipe_crud_and_favorite_flow() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };

    let chef = register(&state, "chef_one", "chef1@example.com").await?;
    let other = register(&state, "chef_two", "chef2@example.com").await?;

    let category_id = insert_category(&state, "Main Course").await?;

    // Bad payload: all field errors come back at once.
    let invalid = recipe_service::create_recipe(
        &state,
        &chef,
        RecipePayload {
            title: "  ".into(),
            description: None,
            thumbnail_photo: None,
            category_id: Some(Uuid::new_v4()),
            preparation_time: Some(-5),
            cooking_time: None,
            servings: None,
            ingredients: vec![],
            steps: vec![],
        },
    )
    .await;
    match invalid {
        Err(AppError::Validation(errors)) => {
            assert!(errors.contains_key("title"));
            assert!(errors.contains_key("category_id"));
            assert!(errors.contains_key("preparation_time"));
            assert!(errors.contains_key("ingredients"));
            assert!(errors.contains_key("steps"));
        }
        other => panic!("expected validation error, got {other:?}"),
    }

    let created = recipe_service::create_recipe(
        &state,
        &chef,
        RecipePayload {
            title: "Fried Rice".into(),
            description: Some("Weeknight staple".into()),
            thumbnail_photo: Some("recipes/thumbnails/fried-rice.jpg".into()),
            category_id: Some(category_id),
            preparation_time: Some(10),
            cooking_time: Some(15),
            servings: Some(2),
            ingredients: vec![
                ingredient("Rice", "2", "cups"),
                ingredient("Egg", "1", "pc"),
            ],
            steps: vec![step(1, "Cook the rice"), step(2, "Fry everything")],
        },
    )
    .await?;
    let detail = created.data.unwrap();
    let recipe_id = detail.recipe_id;
    assert_eq!(detail.user.username, "chef_one");
    assert_eq!(detail.category.as_deref(), Some("Main Course"));
    assert_eq!(
        detail.thumbnail_photo.as_deref(),
        Some("http://localhost:3000/storage/recipes/thumbnails/fried-rice.jpg")
    );
    assert_eq!(detail.ingredients.len(), 2);
    assert_eq!(detail.ingredients[0].position, 1);
    assert_eq!(detail.ingredients[1].position, 2);
    assert_eq!(detail.steps.len(), 2);
    let old_ingredient_ids: Vec<Uuid> = detail
        .ingredients
        .iter()
        .map(|i| i.ingredient_id)
        .collect();

    // Listing honors the category filter and reports totals.
    let listed = recipe_service::list_recipes(
        &state,
        RecipeListQuery {
            page: Some(1),
            per_page: Some(10),
            category_id: Some(category_id),
        },
    )
    .await?;
    assert_eq!(listed.meta.as_ref().unwrap().total, Some(1));
    assert_eq!(listed.data.unwrap().len(), 1);

    let empty = recipe_service::list_recipes(
        &state,
        RecipeListQuery {
            page: None,
            per_page: None,
            category_id: Some(Uuid::new_v4()),
        },
    )
    .await?;
    assert_eq!(empty.data.unwrap().len(), 0);

    // Viewer flags: owner has not favorited yet, anonymous always gets false.
    let viewed = recipe_service::get_recipe(&state, Some(&chef), recipe_id).await?;
    assert_eq!(viewed.data.unwrap().is_favorited, Some(false));
    let anonymous = recipe_service::get_recipe(&state, None, recipe_id).await?;
    assert_eq!(anonymous.data.unwrap().is_favorited, Some(false));

    // Only the owner may update.
    let forbidden = recipe_service::update_recipe(
        &state,
        &other,
        recipe_id,
        payload_titled("Stolen Rice", category_id),
    )
    .await;
    assert!(matches!(forbidden, Err(AppError::Forbidden(_))));

    // Update rewrites the child rows wholesale.
    let updated = recipe_service::update_recipe(
        &state,
        &chef,
        recipe_id,
        RecipePayload {
            title: "Fried Rice Deluxe".into(),
            description: Some("Now with prawns".into()),
            thumbnail_photo: Some("recipes/thumbnails/fried-rice.jpg".into()),
            category_id: Some(category_id),
            preparation_time: Some(15),
            cooking_time: Some(20),
            servings: Some(4),
            ingredients: vec![
                ingredient("Rice", "3", "cups"),
                ingredient("Prawns", "200", "g"),
                ingredient("Egg", "2", "pcs"),
            ],
            steps: vec![step(1, "Cook the rice"), step(2, "Add prawns and fry")],
        },
    )
    .await?;
    let updated = updated.data.unwrap();
    assert_eq!(updated.title, "Fried Rice Deluxe");
    assert_eq!(updated.ingredients.len(), 3);
    for ingredient in &updated.ingredients {
        assert!(!old_ingredient_ids.contains(&ingredient.ingredient_id));
    }

    // Favorite toggling flips state each call.
    let on = recipe_service::toggle_favorite(&state, &chef, recipe_id).await?;
    assert!(on.data.unwrap().is_favorited);
    let favorites = recipe_service::list_favorites(
        &state,
        &chef,
        RecipeListQuery {
            page: None,
            per_page: None,
            category_id: None,
        },
    )
    .await?;
    assert_eq!(favorites.data.unwrap().len(), 1);

    let off = recipe_service::toggle_favorite(&state, &chef, recipe_id).await?;
    assert!(!off.data.unwrap().is_favorited);
    let rows: (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM favorites WHERE user_id = $1 AND recipe_id = $2")
            .bind(chef.user_id)
            .bind(recipe_id)
            .fetch_one(&state.pool)
            .await?;
    assert_eq!(rows.0, 0);

    let missing = recipe_service::toggle_favorite(&state, &chef, Uuid::new_v4()).await;
    assert!(matches!(missing, Err(AppError::NotFound(_))));

    // Deletion is owner-only and cascades to child rows.
    let forbidden = recipe_service::delete_recipe(&state, &other, recipe_id).await;
    assert!(matches!(forbidden, Err(AppError::Forbidden(_))));

    recipe_service::delete_recipe(&state, &chef, recipe_id).await?;
    let children: (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM recipe_ingredients WHERE recipe_id = $1")
            .bind(recipe_id)
            .fetch_one(&state.pool)
            .await?;
    assert_eq!(children.0, 0);
    let gone = recipe_service::get_recipe(&state, None, recipe_id).await;
    assert!(matches!(gone, Err(AppError::NotFound(_))));

    Ok(())
}

fn ingredient(name: &str, quantity: &str, unit: &str) -> IngredientInput {
    IngredientInput {
        name: name.into(),
        quantity: Some(quantity.into()),
        unit: Some(unit.into()),
    }
}

fn step(step_number: i32, description: &str) -> StepInput {
    StepInput {
        step_number,
        description: description.into(),
    }
}

fn payload_titled(title: &str, category_id: Uuid) -> RecipePayload {
    RecipePayload {
        title: title.into(),
        description: None,
        thumbnail_photo: None,
        category_id: Some(category_id),
        preparation_time: Some(5),
        cooking_time: Some(5),
        servings: Some(1),
        ingredients: vec![ingredient("Salt", "1", "tsp")],
        steps: vec![step(1, "Season")],
    }
}

async fn setup_state() -> anyhow::Result<Option<AppState>> {
    let database_url =
        match std::env::var("TEST_DATABASE_URL").or_else(|_| std::env::var("DATABASE_URL")) {
            Ok(url) => url,
            Err(_) => {
                eprintln!(
                    "Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run integration flow tests."
                );
                return Ok(None);
            }
        };
    if std::env::var("JWT_SECRET").is_err() {
        unsafe { std::env::set_var("JWT_SECRET", "integration-test-secret") };
    }

    let pool = create_pool(&database_url).await?;
    sqlx::migrate!("./migrations").run(&pool).await?;

    sqlx::query(
        "TRUNCATE TABLE collection_recipe, collections, favorites, recipe_steps, \
         recipe_ingredients, recipes, recipe_categories, sessions, \
         email_verification_tokens, password_reset_tokens, two_factor_auth, users CASCADE",
    )
    .execute(&pool)
    .await?;

    let config = AppConfig {
        database_url,
        host: "127.0.0.1".into(),
        port: 0,
        app_url: "http://localhost:3000".into(),
        storage_dir: std::env::temp_dir()
            .join("recipe-share-test-storage")
            .to_string_lossy()
            .into_owned(),
    };

    Ok(Some(AppState { pool, config }))
}

async fn register(state: &AppState, username: &str, email: &str) -> anyhow::Result<AuthUser> {
    let registered = auth_service::register(
        state,
        RegisterRequest {
            username: username.into(),
            email: email.into(),
            password: "secret123".into(),
        },
    )
    .await?;
    let user_id = registered.data.unwrap().user.user_id;
    let (session_id,): (Uuid,) =
        sqlx::query_as("SELECT session_id FROM sessions WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(&state.pool)
            .await?;
    Ok(AuthUser {
        user_id,
        session_id,
    })
}

async fn insert_category(state: &AppState, name: &str) -> anyhow::Result<Uuid> {
    let (category_id,): (Uuid,) = sqlx::query_as(
        "INSERT INTO recipe_categories (name, description) VALUES ($1, NULL) RETURNING category_id",
    )
    .bind(name)
    .fetch_one(&state.pool)
    .await?;
    Ok(category_id)
}
