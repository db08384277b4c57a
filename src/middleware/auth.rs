use axum::{extract::FromRequestParts, http::header};
use jsonwebtoken::{DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::AppError;

/// Closed set of account kinds. Every kind-dependent query is dispatched by
/// matching on this enum; table names are never built from request data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum UserKind {
    Market,
    Consumer,
}

impl UserKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserKind::Market => "market",
            UserKind::Consumer => "consumer",
        }
    }
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct Claims {
    pub sub: String,
    pub kind: UserKind,
    pub exp: usize,
}

/// Any authenticated account, market or consumer.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub kind: UserKind,
}

/// Authenticated consumer; rejects market tokens with `Forbidden`.
#[derive(Debug, Clone)]
pub struct AuthConsumer {
    pub consumer_id: Uuid,
}

/// Authenticated market; rejects consumer tokens with `Forbidden`.
#[derive(Debug, Clone)]
pub struct AuthMarket {
    pub market_id: Uuid,
}

fn decode_bearer(parts: &axum::http::request::Parts) -> Result<AuthUser, AppError> {
    let auth_header = parts
        .headers
        .get(header::AUTHORIZATION)
        .ok_or(AppError::Unauthorized)?;

    let auth_str = auth_header.to_str().map_err(|_| AppError::Unauthorized)?;

    if !auth_str.starts_with("Bearer ") {
        return Err(AppError::Unauthorized);
    }
    let token = auth_str.trim_start_matches("Bearer ").trim();

    let secret = std::env::var("JWT_SECRET")
        .map_err(|_| AppError::Internal(anyhow::anyhow!("JWT_SECRET is not set")))?;

    let decoded = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| AppError::Unauthorized)?;

    let user_id = Uuid::parse_str(&decoded.claims.sub).map_err(|_| AppError::Unauthorized)?;

    Ok(AuthUser {
        user_id,
        kind: decoded.claims.kind,
    })
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;
    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        decode_bearer(parts)
    }
}

impl<S> FromRequestParts<S> for AuthConsumer
where
    S: Send + Sync,
{
    type Rejection = AppError;
    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        let user = decode_bearer(parts)?;
        match user.kind {
            UserKind::Consumer => Ok(AuthConsumer {
                consumer_id: user.user_id,
            }),
            UserKind::Market => Err(AppError::Forbidden),
        }
    }
}

impl<S> FromRequestParts<S> for AuthMarket
where
    S: Send + Sync,
{
    type Rejection = AppError;
    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        let user = decode_bearer(parts)?;
        match user.kind {
            UserKind::Market => Ok(AuthMarket {
                market_id: user.user_id,
            }),
            UserKind::Consumer => Err(AppError::Forbidden),
        }
    }
}
