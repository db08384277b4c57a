use std::collections::BTreeMap;

use chrono::{NaiveDate, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use crate::{
    db::DbPool,
    dto::cart::{CartTotals, LineTotal},
    error::AppResult,
    middleware::auth::AuthConsumer,
    response::{ApiResponse, Meta},
};

/// The slice of a cart line the pricing engine needs.
#[derive(Debug, Clone, FromRow)]
pub struct PricedRow {
    pub cart_id: Uuid,
    pub quantity: i32,
    pub discounted_price: i64,
    pub expiration_date: NaiveDate,
}

/// Render integer cents as a two-decimal string, e.g. 4500 -> "45.00".
pub fn format_money(cents: i64) -> String {
    format!("{}.{:02}", cents / 100, cents % 100)
}

/// Expired lines price at zero; everything else is discounted price times
/// quantity.
pub fn line_subtotal(row: &PricedRow, today: NaiveDate) -> i64 {
    if row.expiration_date < today {
        0
    } else {
        row.discounted_price * row.quantity as i64
    }
}

/// Pure function of the cart rows and today's date; recomputing with the
/// same inputs always yields the same totals.
pub fn compute_totals(rows: &[PricedRow], today: NaiveDate) -> CartTotals {
    let mut subtotal: i64 = 0;
    let mut per_line = BTreeMap::new();

    for row in rows {
        let cents = line_subtotal(row, today);
        subtotal += cents;
        per_line.insert(
            row.cart_id,
            LineTotal {
                expired: row.expiration_date < today,
                subtotal: format_money(cents),
            },
        );
    }

    CartTotals {
        subtotal: format_money(subtotal),
        // Tax or shipping would attach here.
        total: format_money(subtotal),
        per_line,
    }
}

pub async fn get_cart_totals(
    pool: &DbPool,
    user: &AuthConsumer,
) -> AppResult<ApiResponse<CartTotals>> {
    let rows: Vec<PricedRow> = sqlx::query_as(
        r#"
        SELECT ci.id AS cart_id, ci.quantity, p.discounted_price, p.expiration_date
        FROM cart_items ci
        JOIN products p ON p.id = ci.product_id
        WHERE ci.consumer_id = $1
        "#,
    )
    .bind(user.consumer_id)
    .fetch_all(pool)
    .await?;

    let totals = compute_totals(&rows, Utc::now().date_naive());
    Ok(ApiResponse::success("OK", totals, Some(Meta::empty())))
}
