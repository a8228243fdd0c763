//! Product API Handlers
//!
//! Thin wrappers over [`ProductService`](crate::services::ProductService);
//! catalog errors convert into `AppError` with `?`.

use axum::{
    Json,
    extract::{Path, Query, State},
};

use crate::auth::CurrentUser;
use crate::catalog::query::ProductFilters;
use crate::core::ServerState;
use crate::utils::{ApiResponse, AppResult};
use shared::Page;
use shared::models::{DuplicateReport, FindOrCreateResult, Product, ProductCreate, ProductUpdate};

/// GET /api/products - listing with category/tag/price/search filters
pub async fn list(
    State(state): State<ServerState>,
    Query(filters): Query<ProductFilters>,
) -> AppResult<ApiResponse<Page<Product>>> {
    let page = state.products().list(&filters).await?;
    Ok(ApiResponse::success(page))
}

/// GET /api/products/{id}
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<ApiResponse<Product>> {
    let product = state.products().get(id).await?;
    Ok(ApiResponse::success(product))
}

/// POST /api/products
pub async fn create(
    State(state): State<ServerState>,
    current_user: CurrentUser,
    Json(payload): Json<ProductCreate>,
) -> AppResult<ApiResponse<Product>> {
    let product = state.products().create(payload).await?;
    tracing::info!(
        product_id = product.id,
        sku = %product.sku,
        user_id = current_user.id,
        "Product created"
    );
    Ok(ApiResponse::success_with_message("Product created", product))
}

/// PUT /api/products/{id} - partial update
pub async fn update(
    State(state): State<ServerState>,
    current_user: CurrentUser,
    Path(id): Path<i64>,
    Json(payload): Json<ProductUpdate>,
) -> AppResult<ApiResponse<Product>> {
    let product = state.products().update(id, payload).await?;
    tracing::info!(product_id = id, user_id = current_user.id, "Product updated");
    Ok(ApiResponse::success(product))
}

/// DELETE /api/products/{id}
pub async fn delete(
    State(state): State<ServerState>,
    current_user: CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<ApiResponse<()>> {
    state.products().delete(id).await?;
    tracing::info!(product_id = id, user_id = current_user.id, "Product deleted");
    Ok(ApiResponse::ok_with_message("Product deleted"))
}

/// GET /api/products/duplicates - groups of products that violate a uniqueness rule
pub async fn duplicates(
    State(state): State<ServerState>,
) -> AppResult<ApiResponse<DuplicateReport>> {
    let report = state.products().detect_all_duplicates().await?;
    Ok(ApiResponse::success(report))
}

/// POST /api/products/find-or-create
pub async fn find_or_create(
    State(state): State<ServerState>,
    Json(payload): Json<ProductCreate>,
) -> AppResult<ApiResponse<FindOrCreateResult>> {
    let result = state.products().find_or_create(payload).await?;
    Ok(ApiResponse::success(result))
}
