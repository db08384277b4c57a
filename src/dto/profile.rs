use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::middleware::auth::UserKind;

#[derive(Debug, Serialize, ToSchema)]
pub struct ProfileDto {
    pub id: Uuid,
    pub kind: UserKind,
    pub email: String,
    /// Market name or consumer full name.
    pub name: String,
    pub city: String,
    pub district: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    pub city: Option<String>,
    pub district: Option<String>,
    /// When set, replaces the password (minimum 6 characters).
    pub password: Option<String>,
}
