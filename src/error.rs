use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::response::{ApiResponse, Meta};

/// A reason a purchase was aborted. Reasons are collected across the whole
/// cart before aborting so the buyer sees every problem line at once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckoutReason {
    EmptyCart,
    StockShortfall { title: String, available: i32 },
}

impl std::fmt::Display for CheckoutReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CheckoutReason::EmptyCart => write!(f, "No valid products in cart to purchase"),
            CheckoutReason::StockShortfall { title, available } => {
                write!(f, "Not enough stock for {title}. Available: {available}")
            }
        }
    }
}

fn join_reasons(reasons: &[CheckoutReason]) -> String {
    reasons
        .iter()
        .map(|r| r.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found")]
    NotFound,

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Forbidden")]
    Forbidden,

    #[error("Authentication required")]
    Unauthorized,

    #[error("Quantity must be at least 1")]
    InvalidQuantity,

    #[error("Cannot update expired product")]
    Expired,

    #[error("Not enough stock available. Available: {available}")]
    InsufficientStock { available: i32 },

    #[error("{}", join_reasons(.0))]
    CheckoutRejected(Vec<CheckoutReason>),

    #[error("Database error")]
    Db(#[from] sqlx::Error),

    #[error("Internal Server Error")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::BadRequest(_)
            | AppError::InvalidQuantity
            | AppError::Expired
            | AppError::InsufficientStock { .. } => StatusCode::BAD_REQUEST,
            AppError::CheckoutRejected(_) => StatusCode::CONFLICT,
            AppError::Db(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self, "request failed");
        }

        let body = ApiResponse::<serde_json::Value>::failure(self.to_string(), Some(Meta::empty()));

        (status, axum::Json(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
