use axum::{Json, Router, extract::State, routing::get};

use crate::{
    dto::profile::{ProfileDto, UpdateProfileRequest},
    error::AppResult,
    middleware::auth::AuthUser,
    response::ApiResponse,
    services::profile_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(get_profile).put(update_profile))
}

#[utoipa::path(
    get,
    path = "/api/profile",
    responses(
        (status = 200, description = "Own profile, market or consumer", body = ApiResponse<ProfileDto>)
    ),
    security(("bearer_auth" = [])),
    tag = "Profile"
)]
pub async fn get_profile(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<ProfileDto>>> {
    let resp = profile_service::get_profile(&state.pool, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/profile",
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Update own profile", body = ApiResponse<ProfileDto>),
        (status = 400, description = "Validation failed"),
    ),
    security(("bearer_auth" = [])),
    tag = "Profile"
)]
pub async fn update_profile(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<UpdateProfileRequest>,
) -> AppResult<Json<ApiResponse<ProfileDto>>> {
    let resp = profile_service::update_profile(&state.pool, &user, payload).await?;
    Ok(Json(resp))
}
