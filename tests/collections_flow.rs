use recipe_share_api::{
    config::AppConfig,
    db::create_pool,
    dto::{
        auth::RegisterRequest,
        collections::CollectionPayload,
        recipes::{IngredientInput, RecipePayload, StepInput, ToggleCollectionRequest},
    },
    error::AppError,
    middleware::auth::AuthUser,
    routes::params::Pagination,
    services::{auth_service, collection_service, recipe_service},
    state::AppState,
};
use uuid::Uuid;

// Integration flow: collections CRUD, membership toggling and the merged
// collections-with-recipes listing.
#[tokio::test]
async fn collection_crud_and_membership_flow() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };

    let owner = register(&state, "collector", "collector@example.com").await?;
    let stranger = register(&state, "stranger", "stranger@example.com").await?;

    // Name validation.
    let invalid = collection_service::create_collection(
        &state,
        &owner,
        CollectionPayload { name: "  ".into() },
    )
    .await;
    match invalid {
        Err(AppError::Validation(errors)) => assert!(errors.contains_key("name")),
        other => panic!("expected validation error, got {other:?}"),
    }

    let created = collection_service::create_collection(
        &state,
        &owner,
        CollectionPayload {
            name: "Weeknight Dinners".into(),
        },
    )
    .await?;
    let collection = created.data.unwrap();
    assert_eq!(collection.name, "Weeknight Dinners");

    // Renames are scoped to the owner; a stranger gets a 404, not a 403,
    // so collection ids are not probeable.
    let hidden = collection_service::update_collection(
        &state,
        &stranger,
        collection.collection_id,
        CollectionPayload {
            name: "Hijacked".into(),
        },
    )
    .await;
    assert!(matches!(hidden, Err(AppError::NotFound(_))));

    let renamed = collection_service::update_collection(
        &state,
        &owner,
        collection.collection_id,
        CollectionPayload {
            name: "Quick Dinners".into(),
        },
    )
    .await?;
    assert_eq!(renamed.data.unwrap().name, "Quick Dinners");

    // Membership toggling needs a recipe.
    let recipe_id = create_recipe(&state, &owner, "Garlic Noodles").await?;

    let added = recipe_service::toggle_collection_membership(
        &state,
        &owner,
        ToggleCollectionRequest {
            recipe_id,
            collection_id: collection.collection_id,
        },
    )
    .await?;
    assert!(added.data.unwrap().is_in_collection);

    // A stranger cannot toggle into someone else's collection.
    let foreign = recipe_service::toggle_collection_membership(
        &state,
        &stranger,
        ToggleCollectionRequest {
            recipe_id,
            collection_id: collection.collection_id,
        },
    )
    .await;
    assert!(matches!(foreign, Err(AppError::NotFound(_))));

    // The summary listing carries the member count and newest thumbnail.
    let summaries = collection_service::list_collections(&state, &owner).await?;
    let summaries = summaries.data.unwrap();
    assert_eq!(summaries.len(), 1);
    assert_eq!(summaries[0].recipes_count, 1);
    let latest = summaries[0].latest_recipe.as_ref().expect("latest recipe");
    assert_eq!(latest.recipe_id, recipe_id);

    // The stranger sees only their own (empty) list.
    let empty = collection_service::list_collections(&state, &stranger).await?;
    assert_eq!(empty.data.unwrap().len(), 0);

    // The merged listing projects member recipes with pivot data.
    let merged = recipe_service::list_collections_with_recipes(
        &state,
        &owner,
        Pagination {
            page: None,
            per_page: None,
        },
    )
    .await?;
    let merged = merged.data.unwrap();
    assert_eq!(merged.len(), 1);
    assert_eq!(merged[0].recipes.len(), 1);
    let member = &merged[0].recipes[0];
    assert_eq!(member.recipe_id, recipe_id);
    assert!(member.collection_recipe_id.is_some());
    assert!(member.added_at.is_some());
    assert!(!member.ingredients.is_empty());

    // Second toggle removes the membership again.
    let removed = recipe_service::toggle_collection_membership(
        &state,
        &owner,
        ToggleCollectionRequest {
            recipe_id,
            collection_id: collection.collection_id,
        },
    )
    .await?;
    assert!(!removed.data.unwrap().is_in_collection);

    // Removing a recipe that is not a member is a 404.
    let not_member = recipe_service::remove_recipe_from_collection(
        &state,
        &owner,
        collection.collection_id,
        recipe_id,
    )
    .await;
    assert!(matches!(not_member, Err(AppError::NotFound(_))));

    // Re-add, then remove through the explicit endpoint.
    recipe_service::toggle_collection_membership(
        &state,
        &owner,
        ToggleCollectionRequest {
            recipe_id,
            collection_id: collection.collection_id,
        },
    )
    .await?;
    recipe_service::remove_recipe_from_collection(
        &state,
        &owner,
        collection.collection_id,
        recipe_id,
    )
    .await?;

    // Deleting the collection leaves the recipe itself untouched.
    let foreign_delete =
        collection_service::delete_collection(&state, &stranger, collection.collection_id).await;
    assert!(matches!(foreign_delete, Err(AppError::NotFound(_))));

    collection_service::delete_collection(&state, &owner, collection.collection_id).await?;
    let recipe_still_there = recipe_service::get_recipe(&state, None, recipe_id).await?;
    assert_eq!(recipe_still_there.data.unwrap().recipe_id, recipe_id);

    Ok(())
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

async fn create_recipe(state: &AppState, user: &AuthUser, title: &str) -> anyhow::Result<Uuid> {
    let created = recipe_service::create_recipe(
        state,
        user,
        RecipePayload {
            title: title.into(),
            description: None,
            thumbnail_photo: Some("recipes/thumbnails/noodles.jpg".into()),
            category_id: None,
            preparation_time: Some(5),
            cooking_time: Some(10),
            servings: Some(2),
            ingredients: vec![IngredientInput {
                name: "Noodles".into(),
                quantity: Some("200".into()),
                unit: Some("g".into()),
            }],
            steps: vec![StepInput {
                step_number: 1,
                description: "Boil and toss".into(),
            }],
        },
    )
    .await?;
    Ok(created.data.unwrap().recipe_id)
}
