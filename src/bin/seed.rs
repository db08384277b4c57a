use argon2::{
    Argon2, PasswordHasher,
    password_hash::{SaltString, rand_core::OsRng},
};
use chrono::{Duration, Utc};
use eco_market_api::{config::AppConfig, db::create_pool};
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let pool = create_pool(&config.database_url).await?;
    // Ensure migrations are applied.
    sqlx::migrate!("./migrations").run(&pool).await?;

    let market_id = ensure_market(
        &pool,
        "greengrocer@example.com",
        "market123",
        "Green Grocer",
        "Istanbul",
        "Kadikoy",
    )
    .await?;
    let consumer_id = ensure_consumer(
        &pool,
        "buyer@example.com",
        "buyer123",
        "Demo Buyer",
        "Istanbul",
        "Kadikoy",
    )
    .await?;
    seed_products(&pool, market_id).await?;

    println!("Seed completed. Market ID: {market_id}, Consumer ID: {consumer_id}");
    Ok(())
}

fn hash(password: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    Ok(argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!(e.to_string()))?
        .to_string())
}

async fn ensure_market(
    pool: &sqlx::PgPool,
    email: &str,
    password: &str,
    name: &str,
    city: &str,
    district: &str,
) -> anyhow::Result<Uuid> {
    let password_hash = hash(password)?;
    let row: Option<(Uuid,)> = sqlx::query_as(
        r#"
        INSERT INTO markets (id, email, name, password_hash, city, district, verified)
        VALUES ($1, $2, $3, $4, $5, $6, TRUE)
        ON CONFLICT (email) DO NOTHING
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(email)
    .bind(name)
    .bind(password_hash)
    .bind(city)
    .bind(district)
    .fetch_optional(pool)
    .await?;

    let market_id = match row {
        Some((id,)) => id,
        None => {
            let existing: (Uuid,) = sqlx::query_as("SELECT id FROM markets WHERE email = $1")
                .bind(email)
                .fetch_one(pool)
                .await?;
            existing.0
        }
    };

    println!("Ensured market {email}");
    Ok(market_id)
}

async fn ensure_consumer(
    pool: &sqlx::PgPool,
    email: &str,
    password: &str,
    fullname: &str,
    city: &str,
    district: &str,
) -> anyhow::Result<Uuid> {
    let password_hash = hash(password)?;
    let row: Option<(Uuid,)> = sqlx::query_as(
        r#"
        INSERT INTO consumers (id, email, fullname, password_hash, city, district, verified)
        VALUES ($1, $2, $3, $4, $5, $6, TRUE)
        ON CONFLICT (email) DO NOTHING
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(email)
    .bind(fullname)
    .bind(password_hash)
    .bind(city)
    .bind(district)
    .fetch_optional(pool)
    .await?;

    let consumer_id = match row {
        Some((id,)) => id,
        None => {
            let existing: (Uuid,) = sqlx::query_as("SELECT id FROM consumers WHERE email = $1")
                .bind(email)
                .fetch_one(pool)
                .await?;
            existing.0
        }
    };

    println!("Ensured consumer {email}");
    Ok(consumer_id)
}

async fn seed_products(pool: &sqlx::PgPool, market_id: Uuid) -> anyhow::Result<()> {
    let today = Utc::now().date_naive();
    // (title, normal cents, discounted cents, stock, days until expiration)
    let products = vec![
        ("Day-old sourdough loaf", 900, 450, 20, 1),
        ("Organic tomatoes 1kg", 1500, 1000, 35, 3),
        ("Fresh basil bunch", 600, 300, 12, 2),
        ("Yogurt 500g", 1200, 800, 50, 7),
    ];

    for (title, normal, discounted, stock, days) in products {
        let exists: Option<(Uuid,)> =
            sqlx::query_as("SELECT id FROM products WHERE market_id = $1 AND title = $2")
                .bind(market_id)
                .bind(title)
                .fetch_optional(pool)
                .await?;
        if exists.is_some() {
            continue;
        }

        sqlx::query(
            r#"
            INSERT INTO products (id, market_id, title, normal_price, discounted_price, stock, expiration_date)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(market_id)
        .bind(title)
        .bind(normal as i64)
        .bind(discounted as i64)
        .bind(stock)
        .bind(today + Duration::days(days))
        .execute(pool)
        .await?;
    }

    println!("Seeded products");
    Ok(())
}
