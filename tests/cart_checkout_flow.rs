use chrono::{Duration, Utc};
use eco_market_api::{
    db::create_pool,
    dto::cart::{AddToCartRequest, UpdateCartItemRequest},
    error::{AppError, CheckoutReason},
    middleware::auth::AuthConsumer,
    routes::params::Pagination,
    services::{cart_service, checkout_service, pricing},
};
use sqlx::PgPool;
use uuid::Uuid;

// Integration flow: consumer fills a cart, a stock shortfall aborts checkout
// untouched, restored stock lets it commit, and an expired-only cart aborts.
#[tokio::test]
async fn cart_and_checkout_flow() -> anyhow::Result<()> {
    // Allow skipping when no DB is configured in the environment.
    let database_url =
        match std::env::var("TEST_DATABASE_URL").or_else(|_| std::env::var("DATABASE_URL")) {
            Ok(url) => url,
            Err(_) => {
                eprintln!(
                    "Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run integration flow tests."
                );
                return Ok(());
            }
        };

    let pool = setup_pool(&database_url).await?;

    let market_id = create_market(&pool, "flow-market@example.com").await?;
    let consumer_id = create_consumer(&pool, "flow-buyer@example.com").await?;
    let buyer = AuthConsumer { consumer_id };

    // Crate of peaches: stock 10, 20.00 normal, 15.00 discounted.
    let peaches = create_product(&pool, market_id, "Crate of peaches", 10, 2000, 1500, 5).await?;

    // Invalid quantities never touch the cart.
    let err = cart_service::add_to_cart(
        &pool,
        &buyer,
        AddToCartRequest {
            product_id: peaches,
            quantity: 0,
        },
    )
    .await
    .expect_err("zero quantity must be rejected");
    assert!(matches!(err, AppError::InvalidQuantity));

    // Add qty 3; subtotal 45.00.
    let resp = cart_service::add_to_cart(
        &pool,
        &buyer,
        AddToCartRequest {
            product_id: peaches,
            quantity: 3,
        },
    )
    .await?;
    assert_eq!(resp.message, "Product added to cart");
    assert_eq!(resp.data.unwrap().quantity, 3);

    let totals = pricing::get_cart_totals(&pool, &buyer).await?.data.unwrap();
    assert_eq!(totals.subtotal, "45.00");

    // Adding the same product again grows the existing line: one row, qty 5.
    let resp = cart_service::add_to_cart(
        &pool,
        &buyer,
        AddToCartRequest {
            product_id: peaches,
            quantity: 2,
        },
    )
    .await?;
    assert_eq!(resp.message, "Product quantity updated in cart");
    let line = resp.data.unwrap();
    assert_eq!(line.quantity, 5);

    let lines = cart_lines(&pool, consumer_id).await?;
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].1, 5);

    let totals = pricing::get_cart_totals(&pool, &buyer).await?.data.unwrap();
    assert_eq!(totals.subtotal, "75.00");
    assert_eq!(totals.total, "75.00");

    // Asking for more than the stock allows is rejected outright.
    let err = cart_service::add_to_cart(
        &pool,
        &buyer,
        AddToCartRequest {
            product_id: peaches,
            quantity: 6,
        },
    )
    .await
    .expect_err("add beyond stock must fail");
    assert!(matches!(err, AppError::InsufficientStock { available: 10 }));

    let err = cart_service::update_cart_item(
        &pool,
        &buyer,
        line.id,
        UpdateCartItemRequest { quantity: 11 },
    )
    .await
    .expect_err("update beyond stock must fail");
    assert!(matches!(err, AppError::InsufficientStock { available: 10 }));

    // The seller sells most of the stock elsewhere before checkout.
    set_stock(&pool, peaches, 3).await?;

    let err = checkout_service::purchase(&pool, &buyer)
        .await
        .expect_err("shortfall must abort the purchase");
    match err {
        AppError::CheckoutRejected(reasons) => assert_eq!(
            reasons,
            vec![CheckoutReason::StockShortfall {
                title: "Crate of peaches".to_string(),
                available: 3,
            }]
        ),
        other => panic!("expected CheckoutRejected, got {other:?}"),
    }

    // Aborted checkout leaves stock and cart untouched.
    assert_eq!(product_stock(&pool, peaches).await?, 3);
    let lines = cart_lines(&pool, consumer_id).await?;
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].1, 5);

    // Restock and retry: commit decrements stock and empties the cart.
    set_stock(&pool, peaches, 10).await?;
    let resp = checkout_service::purchase(&pool, &buyer).await?;
    assert!(resp.success);

    assert_eq!(product_stock(&pool, peaches).await?, 5);
    assert!(cart_lines(&pool, consumer_id).await?.is_empty());

    // An expired line alone cannot be purchased and is not deleted by the
    // attempt.
    let stale = create_product(&pool, market_id, "Old bread", 50, 900, 450, -1).await?;
    let stale_line = insert_cart_line(&pool, consumer_id, stale, 2).await?;

    let err = checkout_service::purchase(&pool, &buyer)
        .await
        .expect_err("expired-only cart must abort");
    match err {
        AppError::CheckoutRejected(reasons) => {
            assert_eq!(reasons, vec![CheckoutReason::EmptyCart])
        }
        other => panic!("expected CheckoutRejected, got {other:?}"),
    }
    assert_eq!(cart_lines(&pool, consumer_id).await?.len(), 1);
    assert_eq!(product_stock(&pool, stale).await?, 50);

    // Expired lines refuse quantity updates but can be removed, and the
    // listing flags them.
    let err = cart_service::update_cart_item(
        &pool,
        &buyer,
        stale_line,
        UpdateCartItemRequest { quantity: 1 },
    )
    .await
    .expect_err("expired line must refuse updates");
    assert!(matches!(err, AppError::Expired));

    let listed = cart_service::list_cart(
        &pool,
        &buyer,
        Pagination {
            page: Some(1),
            per_page: Some(20),
        },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(listed.items.len(), 1);
    assert!(listed.items[0].expired);

    // Adding an expired product is indistinguishable from a missing one.
    let err = cart_service::add_to_cart(
        &pool,
        &buyer,
        AddToCartRequest {
            product_id: stale,
            quantity: 1,
        },
    )
    .await
    .expect_err("expired product must not be addable");
    assert!(matches!(err, AppError::NotFound));

    // Another consumer cannot touch this cart line.
    let other_id = create_consumer(&pool, "flow-other@example.com").await?;
    let other = AuthConsumer {
        consumer_id: other_id,
    };
    let err = cart_service::remove_from_cart(&pool, &other, stale_line)
        .await
        .expect_err("foreign cart line must not be removable");
    assert!(matches!(err, AppError::NotFound));

    let resp = cart_service::remove_from_cart(&pool, &buyer, stale_line).await?;
    assert!(resp.success);
    assert!(cart_lines(&pool, consumer_id).await?.is_empty());

    Ok(())
}

async fn setup_pool(database_url: &str) -> anyhow::Result<PgPool> {
    let pool = create_pool(database_url).await?;
    sqlx::migrate!("./migrations").run(&pool).await?;

    // Clean tables between runs.
    sqlx::query("TRUNCATE TABLE cart_items, audit_logs, products, consumers, markets CASCADE")
        .execute(&pool)
        .await?;

    Ok(pool)
}

async fn create_market(pool: &PgPool, email: &str) -> anyhow::Result<Uuid> {
    let row: (Uuid,) = sqlx::query_as(
        r#"
        INSERT INTO markets (id, email, name, password_hash, city, district, verified)
        VALUES ($1, $2, 'Flow Market', 'dummy', 'Istanbul', 'Kadikoy', TRUE)
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(email)
    .fetch_one(pool)
    .await?;
    Ok(row.0)
}

async fn create_consumer(pool: &PgPool, email: &str) -> anyhow::Result<Uuid> {
    let row: (Uuid,) = sqlx::query_as(
        r#"
        INSERT INTO consumers (id, email, fullname, password_hash, city, district, verified)
        VALUES ($1, $2, 'Flow Buyer', 'dummy', 'Istanbul', 'Kadikoy', TRUE)
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(email)
    .fetch_one(pool)
    .await?;
    Ok(row.0)
}

async fn create_product(
    pool: &PgPool,
    market_id: Uuid,
    title: &str,
    stock: i32,
    normal_price: i64,
    discounted_price: i64,
    days_until_expiration: i64,
) -> anyhow::Result<Uuid> {
    let expiration = Utc::now().date_naive() + Duration::days(days_until_expiration);
    let row: (Uuid,) = sqlx::query_as(
        r#"
        INSERT INTO products (id, market_id, title, normal_price, discounted_price, stock, expiration_date)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(market_id)
    .bind(title)
    .bind(normal_price)
    .bind(discounted_price)
    .bind(stock)
    .bind(expiration)
    .fetch_one(pool)
    .await?;
    Ok(row.0)
}

async fn insert_cart_line(
    pool: &PgPool,
    consumer_id: Uuid,
    product_id: Uuid,
    quantity: i32,
) -> anyhow::Result<Uuid> {
    let row: (Uuid,) = sqlx::query_as(
        r#"
        INSERT INTO cart_items (id, consumer_id, product_id, quantity)
        VALUES ($1, $2, $3, $4)
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(consumer_id)
    .bind(product_id)
    .bind(quantity)
    .fetch_one(pool)
    .await?;
    Ok(row.0)
}

async fn set_stock(pool: &PgPool, product_id: Uuid, stock: i32) -> anyhow::Result<()> {
    sqlx::query("UPDATE products SET stock = $2 WHERE id = $1")
        .bind(product_id)
        .bind(stock)
        .execute(pool)
        .await?;
    Ok(())
}

async fn product_stock(pool: &PgPool, product_id: Uuid) -> anyhow::Result<i32> {
    let row: (i32,) = sqlx::query_as("SELECT stock FROM products WHERE id = $1")
        .bind(product_id)
        .fetch_one(pool)
        .await?;
    Ok(row.0)
}

async fn cart_lines(pool: &PgPool, consumer_id: Uuid) -> anyhow::Result<Vec<(Uuid, i32)>> {
    let rows: Vec<(Uuid, i32)> =
        sqlx::query_as("SELECT id, quantity FROM cart_items WHERE consumer_id = $1 ORDER BY created_at")
            .bind(consumer_id)
            .fetch_all(pool)
            .await?;
    Ok(rows)
}
