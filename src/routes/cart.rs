use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::get,
};
use uuid::Uuid;

use crate::{
    dto::cart::{AddToCartRequest, CartList, CartTotals, UpdateCartItemRequest},
    error::AppResult,
    middleware::auth::AuthConsumer,
    models::CartItem,
    response::ApiResponse,
    routes::params::Pagination,
    services::{cart_service, pricing},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(cart_list).post(add_to_cart))
        .route("/total", get(cart_total))
        .route("/{cart_id}", axum::routing::put(update_cart_item).delete(remove_from_cart))
}

#[utoipa::path(
    get,
    path = "/api/cart",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20")
    ),
    responses(
        (status = 200, description = "List cart lines with live product state", body = ApiResponse<CartList>)
    ),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn cart_list(
    State(state): State<AppState>,
    user: AuthConsumer,
    Query(pagination): Query<Pagination>,
) -> AppResult<Json<ApiResponse<CartList>>> {
    let resp = cart_service::list_cart(&state.pool, &user, pagination).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/cart/total",
    responses(
        (status = 200, description = "Cart totals; expired lines price at zero", body = ApiResponse<CartTotals>)
    ),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn cart_total(
    State(state): State<AppState>,
    user: AuthConsumer,
) -> AppResult<Json<ApiResponse<CartTotals>>> {
    let resp = pricing::get_cart_totals(&state.pool, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/cart",
    request_body = AddToCartRequest,
    responses(
        (status = 200, description = "Add product to cart or increment the existing line", body = ApiResponse<CartItem>),
        (status = 400, description = "Invalid quantity or not enough stock"),
        (status = 404, description = "Product missing or expired"),
    ),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn add_to_cart(
    State(state): State<AppState>,
    user: AuthConsumer,
    Json(payload): Json<AddToCartRequest>,
) -> AppResult<Json<ApiResponse<CartItem>>> {
    let resp = cart_service::add_to_cart(&state.pool, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/cart/{cart_id}",
    params(
        ("cart_id" = Uuid, Path, description = "Cart line ID")
    ),
    request_body = UpdateCartItemRequest,
    responses(
        (status = 200, description = "Replace the line's quantity", body = ApiResponse<CartItem>),
        (status = 400, description = "Invalid quantity, expired product or not enough stock"),
        (status = 404, description = "Cart line not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn update_cart_item(
    State(state): State<AppState>,
    user: AuthConsumer,
    Path(cart_id): Path<Uuid>,
    Json(payload): Json<UpdateCartItemRequest>,
) -> AppResult<Json<ApiResponse<CartItem>>> {
    let resp = cart_service::update_cart_item(&state.pool, &user, cart_id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/cart/{cart_id}",
    params(
        ("cart_id" = Uuid, Path, description = "Cart line ID")
    ),
    responses(
        (status = 200, description = "Remove the line", body = ApiResponse<serde_json::Value>),
        (status = 404, description = "Cart line not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn remove_from_cart(
    State(state): State<AppState>,
    user: AuthConsumer,
    Path(cart_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = cart_service::remove_from_cart(&state.pool, &user, cart_id).await?;
    Ok(Json(resp))
}
