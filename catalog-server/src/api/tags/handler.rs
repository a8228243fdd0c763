//! Tag API Handlers

use axum::{
    Json,
    extract::{Path, State},
};

use crate::core::ServerState;
use crate::db::repository::{RepoError, tag};
use crate::utils::validation::{MAX_NAME_LEN, validate_required_text};
use crate::utils::{ApiResponse, AppError, AppResult, ErrorCode};
use shared::models::{Tag, TagCreate, TagUpdate};

fn not_found(id: i64) -> AppError {
    AppError::with_message(ErrorCode::TagNotFound, format!("Tag {id} not found"))
        .with_detail("id", id)
}

fn write_error(err: RepoError) -> AppError {
    match err {
        RepoError::Duplicate(msg) => AppError::with_message(ErrorCode::TagNameExists, msg),
        RepoError::NotFound(msg) => AppError::with_message(ErrorCode::TagNotFound, msg),
        other => other.into(),
    }
}

/// GET /api/tags - all tags
pub async fn list(State(state): State<ServerState>) -> AppResult<ApiResponse<Vec<Tag>>> {
    let tags = tag::find_all(state.pool()).await?;
    Ok(ApiResponse::success(tags))
}

/// GET /api/tags/{id}
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<ApiResponse<Tag>> {
    let t = tag::find_by_id(state.pool(), id)
        .await?
        .ok_or_else(|| not_found(id))?;
    Ok(ApiResponse::success(t))
}

/// POST /api/tags
pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<TagCreate>,
) -> AppResult<ApiResponse<Tag>> {
    validate_required_text(&payload.name, "name", MAX_NAME_LEN)?;
    let t = tag::create(state.pool(), payload)
        .await
        .map_err(write_error)?;
    tracing::info!(tag_id = t.id, name = %t.name, "Tag created");
    Ok(ApiResponse::success(t))
}

/// PUT /api/tags/{id}
pub async fn update(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    Json(payload): Json<TagUpdate>,
) -> AppResult<ApiResponse<Tag>> {
    if let Some(name) = &payload.name {
        validate_required_text(name, "name", MAX_NAME_LEN)?;
    }
    let t = tag::update(state.pool(), id, payload)
        .await
        .map_err(write_error)?;
    Ok(ApiResponse::success(t))
}

/// DELETE /api/tags/{id} - also detaches the tag from every product
pub async fn delete(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<ApiResponse<()>> {
    if !tag::delete(state.pool(), id).await? {
        return Err(not_found(id));
    }
    tracing::info!(tag_id = id, "Tag deleted");
    Ok(ApiResponse::ok_with_message("Tag deleted"))
}
