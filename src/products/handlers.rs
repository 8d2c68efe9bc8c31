use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::{info, instrument, warn};

use super::{
    dto::{CreateProductRequest, ProductQuery, UpdateProductRequest},
    repo_types::{Product, ProductFilter},
    services,
};
use crate::{
    auth::extractors::AuthUser,
    error::{AppError, AppResult},
    extract::{parse_id, ApiJson},
    response::{created, ok, ApiResponse},
    state::AppState,
};

const NOT_FOUND: &str = "Product not found";

// no role check: any signed-in user may manage the catalog
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/products", get(list_products).post(create_product))
        .route("/products/featured", get(list_featured))
        .route(
            "/products/:id",
            get(get_product).put(update_product).delete(delete_product),
        )
}

#[instrument(skip(state))]
pub async fn list_products(
    State(state): State<AppState>,
    Query(q): Query<ProductQuery>,
) -> AppResult<Json<ApiResponse<Vec<Product>>>> {
    let filter = services::category_filter(q.category.as_deref())?;
    let products = state.store.list_products(filter).await?;
    Ok(ok(products))
}

#[instrument(skip(state))]
pub async fn list_featured(State(state): State<AppState>) -> AppResult<Json<ApiResponse<Vec<Product>>>> {
    let filter = ProductFilter { category: None, featured_only: true };
    Ok(ok(state.store.list_products(filter).await?))
}

#[instrument(skip(state))]
pub async fn get_product(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> AppResult<Json<ApiResponse<Product>>> {
    let id = parse_id(&raw_id, NOT_FOUND)?;
    let product = state
        .store
        .get_product(id)
        .await?
        .ok_or(AppError::NotFound(NOT_FOUND))?;
    Ok(ok(product))
}

#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn create_product(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ApiJson(payload): ApiJson<CreateProductRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Product>>)> {
    let new = services::validate_new(payload).map_err(|fields| {
        warn!(count = fields.len(), "product rejected");
        AppError::Validation(fields)
    })?;
    let product = state.store.create_product(new).await?;
    info!(product_id = %product.id, name = %product.name, "product created");
    Ok(created(product))
}

#[instrument(skip_all, fields(user_id = %user.id, product_id = %raw_id))]
pub async fn update_product(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(raw_id): Path<String>,
    ApiJson(payload): ApiJson<UpdateProductRequest>,
) -> AppResult<Json<ApiResponse<Product>>> {
    let id = parse_id(&raw_id, NOT_FOUND)?;
    let patch = services::validate_patch(payload).map_err(AppError::Validation)?;
    let product = state
        .store
        .update_product(id, patch)
        .await?
        .ok_or(AppError::NotFound(NOT_FOUND))?;
    info!("product updated");
    Ok(ok(product))
}

#[instrument(skip_all, fields(user_id = %user.id, product_id = %raw_id))]
pub async fn delete_product(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(raw_id): Path<String>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let id = parse_id(&raw_id, NOT_FOUND)?;
    if !state.store.delete_product(id).await? {
        return Err(AppError::NotFound(NOT_FOUND));
    }
    info!("product deleted");
    Ok(ok(serde_json::json!({})))
}
