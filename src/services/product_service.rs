use chrono::{DateTime, NaiveDate, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use crate::{
    audit::log_audit,
    db::DbPool,
    dto::products::{
        BrowseList, CreateProductRequest, ProductList, ProductWithMarket, UpdateProductRequest,
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthConsumer, AuthMarket},
    models::Product,
    response::{ApiResponse, Meta},
    routes::params::{BrowseQuery, Pagination},
};

fn validate_pricing(normal_price: i64, discounted_price: i64) -> AppResult<()> {
    if normal_price <= 0 {
        return Err(AppError::BadRequest(
            "Valid normal price is required".to_string(),
        ));
    }
    if discounted_price <= 0 {
        return Err(AppError::BadRequest(
            "Valid discounted price is required".to_string(),
        ));
    }
    if discounted_price >= normal_price {
        return Err(AppError::BadRequest(
            "Discounted price must be less than normal price".to_string(),
        ));
    }
    Ok(())
}

pub async fn create_product(
    pool: &DbPool,
    user: &AuthMarket,
    payload: CreateProductRequest,
) -> AppResult<ApiResponse<Product>> {
    if payload.title.trim().is_empty() {
        return Err(AppError::BadRequest(
            "Product title is required".to_string(),
        ));
    }
    if payload.stock < 1 {
        return Err(AppError::BadRequest(
            "Valid stock quantity is required".to_string(),
        ));
    }
    validate_pricing(payload.normal_price, payload.discounted_price)?;
    if payload.expiration_date < Utc::now().date_naive() {
        return Err(AppError::BadRequest(
            "Expiration date cannot be in the past".to_string(),
        ));
    }

    let product = sqlx::query_as::<_, Product>(
        r#"
        INSERT INTO products (id, market_id, title, normal_price, discounted_price, stock, expiration_date)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user.market_id)
    .bind(payload.title.trim())
    .bind(payload.normal_price)
    .bind(payload.discounted_price)
    .bind(payload.stock)
    .bind(payload.expiration_date)
    .fetch_one(pool)
    .await?;

    log_audit(
        pool,
        Some(user.market_id),
        "product_create",
        Some("products"),
        Some(serde_json::json!({ "product_id": product.id })),
    )
    .await;

    Ok(ApiResponse::success(
        "Product created",
        product,
        Some(Meta::empty()),
    ))
}

pub async fn update_product(
    pool: &DbPool,
    user: &AuthMarket,
    id: Uuid,
    payload: UpdateProductRequest,
) -> AppResult<ApiResponse<Product>> {
    let existing =
        sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = $1 AND market_id = $2")
            .bind(id)
            .bind(user.market_id)
            .fetch_optional(pool)
            .await?;
    let existing = match existing {
        Some(p) => p,
        None => return Err(AppError::NotFound),
    };

    if let Some(date) = payload.expiration_date {
        if date < Utc::now().date_naive() {
            return Err(AppError::BadRequest(
                "Expiration date cannot be in the past".to_string(),
            ));
        }
    }

    let title = payload.title.unwrap_or(existing.title);
    if title.trim().is_empty() {
        return Err(AppError::BadRequest(
            "Product title is required".to_string(),
        ));
    }
    let normal_price = payload.normal_price.unwrap_or(existing.normal_price);
    let discounted_price = payload.discounted_price.unwrap_or(existing.discounted_price);
    validate_pricing(normal_price, discounted_price)?;
    let stock = payload.stock.unwrap_or(existing.stock);
    if stock < 0 {
        return Err(AppError::BadRequest(
            "Valid stock quantity is required".to_string(),
        ));
    }
    let expiration_date = payload.expiration_date.unwrap_or(existing.expiration_date);

    let product = sqlx::query_as::<_, Product>(
        r#"
        UPDATE products
        SET title = $3, normal_price = $4, discounted_price = $5, stock = $6, expiration_date = $7
        WHERE id = $1 AND market_id = $2
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(user.market_id)
    .bind(title.trim())
    .bind(normal_price)
    .bind(discounted_price)
    .bind(stock)
    .bind(expiration_date)
    .fetch_one(pool)
    .await?;

    log_audit(
        pool,
        Some(user.market_id),
        "product_update",
        Some("products"),
        Some(serde_json::json!({ "product_id": product.id })),
    )
    .await;

    Ok(ApiResponse::success("Updated", product, Some(Meta::empty())))
}

/// Deleting a product also deletes every cart line that references it, in
/// the same transaction; cart rows must never point at a missing product.
pub async fn delete_product(
    pool: &DbPool,
    user: &AuthMarket,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let mut txn = pool.begin().await?;

    let owned: Option<(Uuid,)> =
        sqlx::query_as("SELECT id FROM products WHERE id = $1 AND market_id = $2")
            .bind(id)
            .bind(user.market_id)
            .fetch_optional(&mut *txn)
            .await?;
    if owned.is_none() {
        return Err(AppError::NotFound);
    }

    sqlx::query("DELETE FROM cart_items WHERE product_id = $1")
        .bind(id)
        .execute(&mut *txn)
        .await?;

    sqlx::query("DELETE FROM products WHERE id = $1 AND market_id = $2")
        .bind(id)
        .bind(user.market_id)
        .execute(&mut *txn)
        .await?;

    txn.commit().await?;

    log_audit(
        pool,
        Some(user.market_id),
        "product_delete",
        Some("products"),
        Some(serde_json::json!({ "product_id": id })),
    )
    .await;

    Ok(ApiResponse::success(
        "Product deleted successfully",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

pub async fn list_my_products(
    pool: &DbPool,
    user: &AuthMarket,
    pagination: Pagination,
) -> AppResult<ApiResponse<ProductList>> {
    let (page, limit, offset) = pagination.normalize();
    let items = sqlx::query_as::<_, Product>(
        "SELECT * FROM products WHERE market_id = $1 ORDER BY created_at DESC LIMIT $2 OFFSET $3",
    )
    .bind(user.market_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    let total: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM products WHERE market_id = $1")
        .bind(user.market_id)
        .fetch_one(pool)
        .await?;

    let meta = Meta::new(page, limit, total.0);
    Ok(ApiResponse::success(
        "Products",
        ProductList { items },
        Some(meta),
    ))
}

#[derive(FromRow)]
struct BrowseRow {
    id: Uuid,
    market_id: Uuid,
    title: String,
    normal_price: i64,
    discounted_price: i64,
    stock: i32,
    expiration_date: NaiveDate,
    created_at: DateTime<Utc>,
    market_name: String,
    city: String,
    district: String,
}

/// Consumer catalog: non-expired products in the consumer's city, same
/// district first, newest first, with optional title search.
pub async fn browse_products(
    pool: &DbPool,
    user: &AuthConsumer,
    query: BrowseQuery,
) -> AppResult<ApiResponse<BrowseList>> {
    let (page, limit, offset) = query.pagination.normalize();

    let location: Option<(String, String)> =
        sqlx::query_as("SELECT city, district FROM consumers WHERE id = $1")
            .bind(user.consumer_id)
            .fetch_optional(pool)
            .await?;
    let (city, district) = location.ok_or(AppError::NotFound)?;

    let today = Utc::now().date_naive();
    let search = query.q.as_deref().map(str::trim).filter(|s| !s.is_empty());

    let (rows, total) = match search {
        Some(term) => {
            let pattern = format!("%{term}%");
            let rows = sqlx::query_as::<_, BrowseRow>(
                r#"
                SELECT p.id, p.market_id, p.title, p.normal_price, p.discounted_price,
                       p.stock, p.expiration_date, p.created_at,
                       m.name AS market_name, m.city, m.district
                FROM products p
                JOIN markets m ON m.id = p.market_id
                WHERE p.expiration_date >= $1 AND m.city = $2 AND p.title ILIKE $3
                ORDER BY (m.district = $4) DESC, p.created_at DESC
                LIMIT $5 OFFSET $6
                "#,
            )
            .bind(today)
            .bind(city.as_str())
            .bind(pattern.as_str())
            .bind(district.as_str())
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await?;

            let total: (i64,) = sqlx::query_as(
                r#"
                SELECT COUNT(*)
                FROM products p
                JOIN markets m ON m.id = p.market_id
                WHERE p.expiration_date >= $1 AND m.city = $2 AND p.title ILIKE $3
                "#,
            )
            .bind(today)
            .bind(city.as_str())
            .bind(pattern.as_str())
            .fetch_one(pool)
            .await?;

            (rows, total.0)
        }
        None => {
            let rows = sqlx::query_as::<_, BrowseRow>(
                r#"
                SELECT p.id, p.market_id, p.title, p.normal_price, p.discounted_price,
                       p.stock, p.expiration_date, p.created_at,
                       m.name AS market_name, m.city, m.district
                FROM products p
                JOIN markets m ON m.id = p.market_id
                WHERE p.expiration_date >= $1 AND m.city = $2
                ORDER BY (m.district = $3) DESC, p.created_at DESC
                LIMIT $4 OFFSET $5
                "#,
            )
            .bind(today)
            .bind(city.as_str())
            .bind(district.as_str())
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await?;

            let total: (i64,) = sqlx::query_as(
                r#"
                SELECT COUNT(*)
                FROM products p
                JOIN markets m ON m.id = p.market_id
                WHERE p.expiration_date >= $1 AND m.city = $2
                "#,
            )
            .bind(today)
            .bind(city.as_str())
            .fetch_one(pool)
            .await?;

            (rows, total.0)
        }
    };

    let items = rows
        .into_iter()
        .map(|row| ProductWithMarket {
            product: Product {
                id: row.id,
                market_id: row.market_id,
                title: row.title,
                normal_price: row.normal_price,
                discounted_price: row.discounted_price,
                stock: row.stock,
                expiration_date: row.expiration_date,
                created_at: row.created_at,
            },
            market_name: row.market_name,
            city: row.city,
            district: row.district,
        })
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success(
        "Products",
        BrowseList { items },
        Some(meta),
    ))
}

pub async fn get_product(pool: &DbPool, id: Uuid) -> AppResult<ApiResponse<Product>> {
    let product = sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    let product = match product {
        Some(p) => p,
        None => return Err(AppError::NotFound),
    };
    Ok(ApiResponse::success("Product", product, None))
}
