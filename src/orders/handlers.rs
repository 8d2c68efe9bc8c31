use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use tracing::{info, instrument};

use super::{
    dto::{CreateOrderRequest, UpdateStatusRequest},
    repo_types::{Order, StatusUpdate},
    services,
};
use crate::{
    auth::extractors::AuthUser,
    error::{AppError, AppResult},
    extract::{parse_id, ApiJson},
    response::{created, ok, ApiResponse},
    state::AppState,
};

const NOT_FOUND: &str = "Order not found";

pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/orders", post(create_order))
        .route("/orders/my-orders", get(my_orders))
        .route("/orders/:id", get(get_order))
        .route("/orders/:id/status", put(update_status))
}

#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn create_order(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ApiJson(payload): ApiJson<CreateOrderRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Order>>)> {
    let order = services::place_order(state.store.as_ref(), user.id, payload).await?;
    Ok(created(order))
}

#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn my_orders(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> AppResult<Json<ApiResponse<Vec<Order>>>> {
    Ok(ok(state.store.list_orders(user.id).await?))
}

#[instrument(skip_all, fields(user_id = %user.id, order_id = %raw_id))]
pub async fn get_order(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(raw_id): Path<String>,
) -> AppResult<Json<ApiResponse<Order>>> {
    let id = parse_id(&raw_id, NOT_FOUND)?;
    let order = state
        .store
        .get_order(user.id, id)
        .await?
        .ok_or(AppError::NotFound(NOT_FOUND))?;
    Ok(ok(order))
}

#[instrument(skip_all, fields(user_id = %user.id, order_id = %raw_id))]
pub async fn update_status(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(raw_id): Path<String>,
    ApiJson(payload): ApiJson<UpdateStatusRequest>,
) -> AppResult<Json<ApiResponse<Order>>> {
    let id = parse_id(&raw_id, NOT_FOUND)?;
    let update = StatusUpdate {
        order_status: payload.order_status,
        payment_status: payload.payment_status,
    };
    let order = state
        .store
        .update_order_status(user.id, id, update)
        .await?
        .ok_or(AppError::NotFound(NOT_FOUND))?;
    info!(status = %order.order_status, "order status updated");
    Ok(ok(order))
}
