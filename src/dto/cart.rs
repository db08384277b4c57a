use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::Product;

#[derive(Debug, Deserialize, ToSchema)]
pub struct AddToCartRequest {
    pub product_id: Uuid,
    pub quantity: i32,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateCartItemRequest {
    pub quantity: i32,
}

/// A cart line joined with the live product state at query time. Expired
/// lines stay listed (flagged) until the consumer removes them.
#[derive(Debug, Serialize, ToSchema)]
pub struct CartLineDto {
    pub id: Uuid,
    pub product: Product,
    pub quantity: i32,
    pub expired: bool,
    pub added_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CartList {
    pub items: Vec<CartLineDto>,
}

/// Per-line pricing breakdown, keyed by cart line id for UI reconciliation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct LineTotal {
    pub expired: bool,
    /// Two-decimal string, e.g. "45.00".
    pub subtotal: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct CartTotals {
    pub subtotal: String,
    pub total: String,
    pub per_line: BTreeMap<Uuid, LineTotal>,
}
