use axum::{Json, Router, extract::State, routing::post};

use crate::{
    dto::auth::{
        LoginRequest, LoginResponse, RegisterRequest, RegisteredResponse, ResendCodeRequest,
        TokenLoginRequest, VerifyRequest,
    },
    error::AppResult,
    middleware::auth::AuthUser,
    response::ApiResponse,
    services::auth_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/verify", post(verify))
        .route("/resend", post(resend))
        .route("/login", post(login))
        .route("/token", post(token_login))
        .route("/logout", post(logout))
}

#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 200, description = "Register a market or consumer account", body = ApiResponse<RegisteredResponse>),
        (status = 400, description = "Validation failed or email taken"),
    ),
    tag = "Auth"
)]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> AppResult<Json<ApiResponse<RegisteredResponse>>> {
    let resp = auth_service::register(&state, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/auth/verify",
    request_body = VerifyRequest,
    responses(
        (status = 200, description = "Verify account with emailed code", body = ApiResponse<serde_json::Value>),
        (status = 400, description = "Invalid verification code"),
    ),
    tag = "Auth"
)]
pub async fn verify(
    State(state): State<AppState>,
    Json(payload): Json<VerifyRequest>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = auth_service::verify(&state, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/auth/resend",
    request_body = ResendCodeRequest,
    responses(
        (status = 200, description = "Resend verification code", body = ApiResponse<serde_json::Value>),
        (status = 404, description = "No unverified account for email"),
    ),
    tag = "Auth"
)]
pub async fn resend(
    State(state): State<AppState>,
    Json(payload): Json<ResendCodeRequest>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = auth_service::resend_code(&state, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login", body = ApiResponse<LoginResponse>),
        (status = 400, description = "Invalid credentials"),
    ),
    tag = "Auth"
)]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> AppResult<Json<ApiResponse<LoginResponse>>> {
    let resp = auth_service::login(&state, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/auth/token",
    request_body = TokenLoginRequest,
    responses(
        (status = 200, description = "Exchange remember token for a JWT", body = ApiResponse<LoginResponse>),
        (status = 401, description = "Unknown token"),
    ),
    tag = "Auth"
)]
pub async fn token_login(
    State(state): State<AppState>,
    Json(payload): Json<TokenLoginRequest>,
) -> AppResult<Json<ApiResponse<LoginResponse>>> {
    let resp = auth_service::token_login(&state, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/auth/logout",
    responses(
        (status = 200, description = "Clear remember token", body = ApiResponse<serde_json::Value>),
    ),
    security(("bearer_auth" = [])),
    tag = "Auth"
)]
pub async fn logout(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = auth_service::logout(&state, &user).await?;
    Ok(Json(resp))
}
