use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

/// Seller account. Never serialized directly; see `dto::profile`.
#[derive(Debug, Clone, FromRow)]
pub struct Market {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub password_hash: String,
    pub city: String,
    pub district: String,
    pub verified: bool,
    pub verification_code: Option<String>,
    pub remember_token: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Buyer account. Never serialized directly; see `dto::profile`.
#[derive(Debug, Clone, FromRow)]
pub struct Consumer {
    pub id: Uuid,
    pub email: String,
    pub fullname: String,
    pub password_hash: String,
    pub city: String,
    pub district: String,
    pub verified: bool,
    pub verification_code: Option<String>,
    pub remember_token: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Prices are integer cents. Invariant: `discounted_price < normal_price`,
/// both positive, `stock >= 0` (also CHECKed in the schema).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Product {
    pub id: Uuid,
    pub market_id: Uuid,
    pub title: String,
    pub normal_price: i64,
    pub discounted_price: i64,
    pub stock: i32,
    pub expiration_date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

/// One (consumer, product) pairing; unique per pair, so adding an
/// already-carted product increments this row instead of creating another.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct CartItem {
    pub id: Uuid,
    pub consumer_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    pub created_at: DateTime<Utc>,
}
