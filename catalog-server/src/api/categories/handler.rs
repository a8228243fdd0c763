//! Category API Handlers

use axum::{
    Json,
    extract::{Path, State},
};

use crate::core::ServerState;
use crate::db::repository::{RepoError, category};
use crate::utils::validation::{
    MAX_NAME_LEN, MAX_NOTE_LEN, validate_optional_text, validate_required_text,
};
use crate::utils::{ApiResponse, AppError, AppResult, ErrorCode};
use shared::models::{Category, CategoryCreate, CategoryUpdate};

fn not_found(id: i64) -> AppError {
    AppError::with_message(ErrorCode::CategoryNotFound, format!("Category {id} not found"))
        .with_detail("id", id)
}

fn write_error(err: RepoError) -> AppError {
    match err {
        RepoError::Duplicate(msg) => AppError::with_message(ErrorCode::CategoryNameExists, msg),
        RepoError::NotFound(msg) => AppError::with_message(ErrorCode::CategoryNotFound, msg),
        other => other.into(),
    }
}

/// GET /api/categories - all categories, ordered by name
pub async fn list(State(state): State<ServerState>) -> AppResult<ApiResponse<Vec<Category>>> {
    let categories = category::find_all(state.pool()).await?;
    Ok(ApiResponse::success(categories))
}

/// GET /api/categories/{id}
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<ApiResponse<Category>> {
    let c = category::find_by_id(state.pool(), id)
        .await?
        .ok_or_else(|| not_found(id))?;
    Ok(ApiResponse::success(c))
}

/// POST /api/categories
pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<CategoryCreate>,
) -> AppResult<ApiResponse<Category>> {
    validate_required_text(&payload.name, "name", MAX_NAME_LEN)?;
    validate_optional_text(&payload.description, "description", MAX_NOTE_LEN)?;

    let c = category::create(state.pool(), payload)
        .await
        .map_err(write_error)?;
    tracing::info!(category_id = c.id, name = %c.name, "Category created");
    Ok(ApiResponse::success(c))
}

/// PUT /api/categories/{id}
pub async fn update(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    Json(payload): Json<CategoryUpdate>,
) -> AppResult<ApiResponse<Category>> {
    if let Some(name) = &payload.name {
        validate_required_text(name, "name", MAX_NAME_LEN)?;
    }
    validate_optional_text(&payload.description, "description", MAX_NOTE_LEN)?;

    let c = category::update(state.pool(), id, payload)
        .await
        .map_err(write_error)?;
    Ok(ApiResponse::success(c))
}

/// DELETE /api/categories/{id} - products in it become uncategorized
pub async fn delete(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<ApiResponse<()>> {
    if !category::delete(state.pool(), id).await? {
        return Err(not_found(id));
    }
    tracing::info!(category_id = id, "Category deleted");
    Ok(ApiResponse::ok_with_message("Category deleted"))
}
