use axum::{Json, Router, extract::State, routing::post};

use crate::{
    error::AppResult,
    middleware::auth::AuthConsumer,
    response::ApiResponse,
    services::checkout_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/", post(purchase))
}

#[utoipa::path(
    post,
    path = "/api/purchase",
    responses(
        (status = 200, description = "All eligible lines purchased, stock decremented, cart cleared", body = ApiResponse<serde_json::Value>),
        (status = 409, description = "Purchase aborted; message lists every shortfall"),
    ),
    security(("bearer_auth" = [])),
    tag = "Purchase"
)]
pub async fn purchase(
    State(state): State<AppState>,
    user: AuthConsumer,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = checkout_service::purchase(&state.pool, &user).await?;
    Ok(Json(resp))
}
