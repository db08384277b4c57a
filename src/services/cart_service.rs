use chrono::{DateTime, NaiveDate, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use crate::{
    audit::log_audit,
    db::DbPool,
    dto::cart::{AddToCartRequest, CartLineDto, CartList, UpdateCartItemRequest},
    error::{AppError, AppResult},
    middleware::auth::AuthConsumer,
    models::{CartItem, Product},
    response::{ApiResponse, Meta},
    routes::params::Pagination,
};

#[derive(FromRow)]
struct CartWithProductRow {
    cart_id: Uuid,
    quantity: i32,
    added_at: DateTime<Utc>,
    product_id: Uuid,
    market_id: Uuid,
    title: String,
    normal_price: i64,
    discounted_price: i64,
    stock: i32,
    expiration_date: NaiveDate,
    created_at: DateTime<Utc>,
}

pub async fn list_cart(
    pool: &DbPool,
    user: &AuthConsumer,
    pagination: Pagination,
) -> AppResult<ApiResponse<CartList>> {
    let (page, limit, offset) = pagination.normalize();
    let rows = sqlx::query_as::<_, CartWithProductRow>(
        r#"
        SELECT ci.id AS cart_id, ci.quantity, ci.created_at AS added_at,
               p.id AS product_id, p.market_id, p.title, p.normal_price,
               p.discounted_price, p.stock, p.expiration_date, p.created_at
        FROM cart_items ci
        JOIN products p ON p.id = ci.product_id
        WHERE ci.consumer_id = $1
        ORDER BY ci.created_at DESC
        LIMIT $2 OFFSET $3
        "#,
    )
    .bind(user.consumer_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    let total: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM cart_items WHERE consumer_id = $1")
        .bind(user.consumer_id)
        .fetch_one(pool)
        .await?;

    let today = Utc::now().date_naive();
    let items = rows
        .into_iter()
        .map(|row| CartLineDto {
            id: row.cart_id,
            expired: row.expiration_date < today,
            product: Product {
                id: row.product_id,
                market_id: row.market_id,
                title: row.title,
                normal_price: row.normal_price,
                discounted_price: row.discounted_price,
                stock: row.stock,
                expiration_date: row.expiration_date,
                created_at: row.created_at,
            },
            quantity: row.quantity,
            added_at: row.added_at,
        })
        .collect();

    let meta = Meta::new(page, limit, total.0);
    Ok(ApiResponse::success("OK", CartList { items }, Some(meta)))
}

/// Add-or-increment: a consumer holds at most one line per product, so a
/// repeated add grows the existing line. The stock check covers the already
/// carted quantity plus the new one, and runs with the product row locked so
/// it is not made against stale stock.
pub async fn add_to_cart(
    pool: &DbPool,
    user: &AuthConsumer,
    payload: AddToCartRequest,
) -> AppResult<ApiResponse<CartItem>> {
    if payload.quantity < 1 {
        return Err(AppError::InvalidQuantity);
    }

    let mut txn = pool.begin().await?;

    let product: Option<(i32, NaiveDate)> =
        sqlx::query_as("SELECT stock, expiration_date FROM products WHERE id = $1 FOR UPDATE")
            .bind(payload.product_id)
            .fetch_optional(&mut *txn)
            .await?;

    // Missing and expired products are indistinguishable to the buyer.
    let (stock, expiration_date) = product.ok_or(AppError::NotFound)?;
    let today = Utc::now().date_naive();
    if expiration_date < today {
        return Err(AppError::NotFound);
    }

    let existing: Option<CartItem> = sqlx::query_as(
        "SELECT * FROM cart_items WHERE consumer_id = $1 AND product_id = $2 FOR UPDATE",
    )
    .bind(user.consumer_id)
    .bind(payload.product_id)
    .fetch_optional(&mut *txn)
    .await?;

    let carted = existing.as_ref().map(|i| i.quantity).unwrap_or(0);
    if (stock as i64) < carted as i64 + payload.quantity as i64 {
        return Err(AppError::InsufficientStock { available: stock });
    }

    let (cart_item, message) = if let Some(line) = existing {
        let item = sqlx::query_as::<_, CartItem>(
            r#"
            UPDATE cart_items
            SET quantity = quantity + $3
            WHERE id = $1 AND consumer_id = $2
            RETURNING *
            "#,
        )
        .bind(line.id)
        .bind(user.consumer_id)
        .bind(payload.quantity)
        .fetch_one(&mut *txn)
        .await?;
        (item, "Product quantity updated in cart")
    } else {
        let item = sqlx::query_as::<_, CartItem>(
            r#"
            INSERT INTO cart_items (id, consumer_id, product_id, quantity)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user.consumer_id)
        .bind(payload.product_id)
        .bind(payload.quantity)
        .fetch_one(&mut *txn)
        .await?;
        (item, "Product added to cart")
    };

    txn.commit().await?;

    log_audit(
        pool,
        Some(user.consumer_id),
        "cart_add",
        Some("cart_items"),
        Some(serde_json::json!({ "product_id": payload.product_id, "quantity": payload.quantity })),
    )
    .await;

    Ok(ApiResponse::success(message, cart_item, None))
}

/// Replace a line's quantity exactly (not additive). Requests beyond the
/// available stock are rejected, never clamped.
pub async fn update_cart_item(
    pool: &DbPool,
    user: &AuthConsumer,
    cart_id: Uuid,
    payload: UpdateCartItemRequest,
) -> AppResult<ApiResponse<CartItem>> {
    if payload.quantity < 1 {
        return Err(AppError::InvalidQuantity);
    }

    let mut txn = pool.begin().await?;

    let row: Option<(i32, NaiveDate)> = sqlx::query_as(
        r#"
        SELECT p.stock, p.expiration_date
        FROM cart_items ci
        JOIN products p ON p.id = ci.product_id
        WHERE ci.id = $1 AND ci.consumer_id = $2
        FOR UPDATE OF ci
        "#,
    )
    .bind(cart_id)
    .bind(user.consumer_id)
    .fetch_optional(&mut *txn)
    .await?;

    let (stock, expiration_date) = row.ok_or(AppError::NotFound)?;

    let today = Utc::now().date_naive();
    if expiration_date < today {
        return Err(AppError::Expired);
    }
    if payload.quantity > stock {
        return Err(AppError::InsufficientStock { available: stock });
    }

    let item = sqlx::query_as::<_, CartItem>(
        r#"
        UPDATE cart_items
        SET quantity = $3
        WHERE id = $1 AND consumer_id = $2
        RETURNING *
        "#,
    )
    .bind(cart_id)
    .bind(user.consumer_id)
    .bind(payload.quantity)
    .fetch_one(&mut *txn)
    .await?;

    txn.commit().await?;

    log_audit(
        pool,
        Some(user.consumer_id),
        "cart_update",
        Some("cart_items"),
        Some(serde_json::json!({ "cart_id": cart_id, "quantity": payload.quantity })),
    )
    .await;

    Ok(ApiResponse::success("Cart updated successfully", item, None))
}

pub async fn remove_from_cart(
    pool: &DbPool,
    user: &AuthConsumer,
    cart_id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let result = sqlx::query("DELETE FROM cart_items WHERE id = $1 AND consumer_id = $2")
        .bind(cart_id)
        .bind(user.consumer_id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound);
    }

    log_audit(
        pool,
        Some(user.consumer_id),
        "cart_remove",
        Some("cart_items"),
        Some(serde_json::json!({ "cart_id": cart_id })),
    )
    .await;

    Ok(ApiResponse::success(
        "Item removed from cart",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}
