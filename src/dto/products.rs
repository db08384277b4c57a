use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::Product;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateProductRequest {
    pub title: String,
    /// Cents.
    pub normal_price: i64,
    /// Cents; must be below `normal_price`.
    pub discounted_price: i64,
    pub stock: i32,
    pub expiration_date: NaiveDate,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateProductRequest {
    pub title: Option<String>,
    pub normal_price: Option<i64>,
    pub discounted_price: Option<i64>,
    pub stock: Option<i32>,
    pub expiration_date: Option<NaiveDate>,
}

/// Browse result row: product plus the selling market's name and location.
#[derive(Debug, Serialize, ToSchema)]
pub struct ProductWithMarket {
    pub product: Product,
    pub market_name: String,
    pub city: String,
    pub district: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BrowseList {
    pub items: Vec<ProductWithMarket>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProductList {
    pub items: Vec<Product>,
}
