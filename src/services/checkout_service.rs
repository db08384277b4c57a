use chrono::{NaiveDate, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use crate::{
    audit::log_audit,
    db::DbPool,
    error::{AppError, AppResult, CheckoutReason},
    middleware::auth::AuthConsumer,
    response::{ApiResponse, Meta},
};

/// Snapshot of one cart line and its product, read under a row lock.
#[derive(Debug, Clone, FromRow)]
pub struct CheckoutRow {
    pub cart_id: Uuid,
    pub product_id: Uuid,
    pub title: String,
    pub quantity: i32,
    pub stock: i32,
    pub expiration_date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockDecrement {
    pub product_id: Uuid,
    pub quantity: i32,
}

/// Decide the outcome of a purchase from a locked snapshot of the cart.
///
/// Expired lines are silently excluded, never an error. Shortfalls are
/// collected across every eligible line before aborting, so the buyer sees
/// all problem lines at once. Any shortfall aborts the whole purchase:
/// partial orders are not allowed.
pub fn plan_purchase(
    rows: &[CheckoutRow],
    today: NaiveDate,
) -> Result<Vec<StockDecrement>, Vec<CheckoutReason>> {
    let eligible: Vec<&CheckoutRow> = rows
        .iter()
        .filter(|r| r.expiration_date >= today)
        .collect();

    if eligible.is_empty() {
        return Err(vec![CheckoutReason::EmptyCart]);
    }

    let shortfalls: Vec<CheckoutReason> = eligible
        .iter()
        .filter(|r| r.quantity > r.stock)
        .map(|r| CheckoutReason::StockShortfall {
            title: r.title.clone(),
            available: r.stock,
        })
        .collect();

    if !shortfalls.is_empty() {
        return Err(shortfalls);
    }

    Ok(eligible
        .into_iter()
        .map(|r| StockDecrement {
            product_id: r.product_id,
            quantity: r.quantity,
        })
        .collect())
}

/// The purchase transaction: validate every eligible line against live
/// stock, decrement, and clear the cart, all-or-nothing.
pub async fn purchase(
    pool: &DbPool,
    user: &AuthConsumer,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let mut txn = pool.begin().await?;

    // Lock the cart lines and their products so the stock figures used for
    // validation are the ones the decrement applies to. Ordered by product
    // id for a stable lock order across concurrent checkouts.
    let rows: Vec<CheckoutRow> = sqlx::query_as(
        r#"
        SELECT ci.id AS cart_id, p.id AS product_id, p.title,
               ci.quantity, p.stock, p.expiration_date
        FROM cart_items ci
        JOIN products p ON p.id = ci.product_id
        WHERE ci.consumer_id = $1
        ORDER BY p.id
        FOR UPDATE
        "#,
    )
    .bind(user.consumer_id)
    .fetch_all(&mut *txn)
    .await?;

    let today = Utc::now().date_naive();

    // Returning here drops the transaction, which rolls everything back.
    let decrements = plan_purchase(&rows, today).map_err(AppError::CheckoutRejected)?;

    for dec in &decrements {
        sqlx::query("UPDATE products SET stock = stock - $2 WHERE id = $1")
            .bind(dec.product_id)
            .bind(dec.quantity)
            .execute(&mut *txn)
            .await?;
    }

    // A successful purchase always empties the whole cart, expired lines
    // included.
    sqlx::query("DELETE FROM cart_items WHERE consumer_id = $1")
        .bind(user.consumer_id)
        .execute(&mut *txn)
        .await?;

    txn.commit().await?;

    log_audit(
        pool,
        Some(user.consumer_id),
        "purchase",
        Some("cart_items"),
        Some(serde_json::json!({ "lines": decrements.len() })),
    )
    .await;

    Ok(ApiResponse::success(
        "Purchase complete",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}
