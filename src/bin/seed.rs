use argon2::{
    Argon2, PasswordHasher,
    password_hash::{SaltString, rand_core::OsRng},
};
use recipe_share_api::{config::AppConfig, db::create_pool};
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let pool = create_pool(&config.database_url).await?;
    // Ensure migrations are applied.
    sqlx::migrate!("./migrations").run(&pool).await?;

    let user_id = ensure_user(&pool, "demo", "demo@example.com", "demo1234").await?;
    seed_recipe_categories(&pool).await?;
    seed_catalog(&pool).await?;

    println!("Seed completed. Demo user ID: {user_id}");
    Ok(())
}

async fn ensure_user(
    pool: &sqlx::PgPool,
    username: &str,
    email: &str,
    password: &str,
) -> anyhow::Result<Uuid> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!(e.to_string()))?
        .to_string();

    let row: Option<(Uuid,)> = sqlx::query_as(
        r#"
        INSERT INTO users (user_id, username, email, password_hash, email_verified)
        VALUES ($1, $2, $3, $4, TRUE)
        ON CONFLICT (email) DO NOTHING
        RETURNING user_id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(username)
    .bind(email)
    .bind(password_hash)
    .fetch_optional(pool)
    .await?;

    // If the user already exists, fetch the id.
    let user_id = match row {
        Some((id,)) => id,
        None => {
            let existing: (Uuid,) = sqlx::query_as("SELECT user_id FROM users WHERE email = $1")
                .bind(email)
                .fetch_one(pool)
                .await?;
            existing.0
        }
    };

    println!("Ensured user {username} <{email}>");
    Ok(user_id)
}

async fn seed_recipe_categories(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    let categories = vec![
        ("Breakfast", "Morning dishes to start the day"),
        ("Main Course", "Hearty lunch and dinner plates"),
        ("Dessert", "Sweet treats and baked goods"),
        ("Soup", "Broths, stews and everything in a bowl"),
        ("Beverage", "Drinks, hot and cold"),
    ];

    for (name, description) in categories {
        sqlx::query(
            r#"
            INSERT INTO recipe_categories (name, description)
            VALUES ($1, $2)
            ON CONFLICT (name) DO NOTHING
            "#,
        )
        .bind(name)
        .bind(description)
        .execute(pool)
        .await?;
    }

    println!("Seeded recipe categories");
    Ok(())
}

async fn seed_catalog(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    let categories = vec![
        ("Vegetables", "Fresh produce"),
        ("Meat", "Beef, poultry and more"),
        ("Dairy", "Milk, cheese and eggs"),
        ("Pantry", "Dry goods and condiments"),
    ];

    for (name, description) in &categories {
        sqlx::query(
            r#"
            INSERT INTO ingredient_categories (name, description)
            VALUES ($1, $2)
            ON CONFLICT (name) DO NOTHING
            "#,
        )
        .bind(name)
        .bind(description)
        .execute(pool)
        .await?;
    }

    // (name, category, price, photo)
    let ingredients = vec![
        ("Carrot", "Vegetables", 1.20, Some("carrot.jpg")),
        ("Spinach", "Vegetables", 2.10, Some("spinach.jpg")),
        ("Chicken Breast", "Meat", 6.50, Some("chicken-breast.jpg")),
        ("Ground Beef", "Meat", 8.90, None),
        ("Whole Milk", "Dairy", 1.80, Some("milk.jpg")),
        ("Eggs", "Dairy", 3.40, None),
        ("Rice", "Pantry", 2.50, Some("rice.jpg")),
        ("Soy Sauce", "Pantry", 3.10, None),
    ];

    for (name, category, price, photo) in ingredients {
        sqlx::query(
            r#"
            INSERT INTO ingredients (name, category_id, price, photo)
            SELECT $1, c.category_id, $3, $4
            FROM ingredient_categories c
            WHERE c.name = $2
              AND NOT EXISTS (SELECT 1 FROM ingredients WHERE name = $1)
            "#,
        )
        .bind(name)
        .bind(category)
        .bind(price)
        .bind(photo)
        .execute(pool)
        .await?;
    }

    let supermarkets = vec![
        ("Fresh Mart", "12 Market Street", -6.2001, 106.8166),
        ("Daily Grocer", "88 Orchard Road", -6.1754, 106.8272),
        ("Corner Store", "3 Hill Avenue", -6.2146, 106.8451),
    ];

    for (name, address, latitude, longitude) in supermarkets {
        sqlx::query(
            r#"
            INSERT INTO supermarkets (name, address, latitude, longitude)
            SELECT $1, $2, $3, $4
            WHERE NOT EXISTS (SELECT 1 FROM supermarkets WHERE name = $1)
            "#,
        )
        .bind(name)
        .bind(address)
        .bind(latitude)
        .bind(longitude)
        .execute(pool)
        .await?;
    }

    // Mark every ingredient available in every supermarket; real availability
    // comes from a later stock sync.
    sqlx::query(
        r#"
        INSERT INTO supermarket_ingredients (supermarket_id, ingredient_id, is_available, last_updated)
        SELECT s.supermarket_id, i.ingredient_id, TRUE, now()
        FROM supermarkets s CROSS JOIN ingredients i
        ON CONFLICT (supermarket_id, ingredient_id) DO NOTHING
        "#,
    )
    .execute(pool)
    .await?;

    println!("Seeded shopping catalog");
    Ok(())
}
