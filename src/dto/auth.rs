use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::middleware::auth::UserKind;

#[derive(Debug, Deserialize, ToSchema)]
pub struct RegisterRequest {
    pub kind: UserKind,
    pub email: String,
    /// Market name or consumer full name, depending on `kind`.
    pub name: String,
    pub city: String,
    pub district: String,
    pub password: String,
    pub confirm_password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RegisteredResponse {
    pub email: String,
    pub kind: UserKind,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct VerifyRequest {
    pub kind: UserKind,
    pub email: String,
    pub code: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ResendCodeRequest {
    pub kind: UserKind,
    pub email: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub kind: UserKind,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub remember: bool,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct TokenLoginRequest {
    pub kind: UserKind,
    pub token: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LoginResponse {
    pub token: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remember_token: Option<String>,
}
