//! User API Handlers

use axum::{
    Json,
    extract::{Path, State},
};

use crate::api::auth::handler::{hash, user_write_error};
use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::repository::user;
use crate::utils::validation::{
    MAX_NAME_LEN, validate_email, validate_password, validate_required_text,
};
use crate::utils::{ApiResponse, AppError, AppResult, ErrorCode};
use shared::models::{UserCreate, UserResponse, UserUpdate};

fn user_not_found(id: i64) -> AppError {
    AppError::with_message(ErrorCode::UserNotFound, format!("User {id} not found"))
}

/// GET /api/users - list users
pub async fn list(State(state): State<ServerState>) -> AppResult<ApiResponse<Vec<UserResponse>>> {
    let users = user::find_all(state.pool()).await?;
    Ok(ApiResponse::success(
        users.into_iter().map(UserResponse::from).collect(),
    ))
}

/// GET /api/users/me - the authenticated user
pub async fn me(
    State(state): State<ServerState>,
    current_user: CurrentUser,
) -> AppResult<ApiResponse<UserResponse>> {
    let u = user::find_by_id(state.pool(), current_user.id)
        .await?
        .ok_or_else(|| user_not_found(current_user.id))?;
    Ok(ApiResponse::success(u.into()))
}

/// GET /api/users/{id}
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<ApiResponse<UserResponse>> {
    let u = user::find_by_id(state.pool(), id)
        .await?
        .ok_or_else(|| user_not_found(id))?;
    Ok(ApiResponse::success(u.into()))
}

/// POST /api/users - create a user
pub async fn create(
    State(state): State<ServerState>,
    current_user: CurrentUser,
    Json(payload): Json<UserCreate>,
) -> AppResult<ApiResponse<UserResponse>> {
    validate_required_text(&payload.full_name, "full_name", MAX_NAME_LEN)?;
    validate_email(&payload.email)?;
    validate_password(&payload.password)?;

    let password_hash = hash(&payload.password)?;
    let u = user::create(
        state.pool(),
        payload.full_name.trim(),
        payload.email.trim(),
        &password_hash,
    )
    .await
    .map_err(user_write_error)?;

    tracing::info!(user_id = u.id, created_by = current_user.id, "User created");
    Ok(ApiResponse::success(u.into()))
}

/// PUT /api/users/{id} - partial update; a new password is re-hashed
pub async fn update(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    Json(payload): Json<UserUpdate>,
) -> AppResult<ApiResponse<UserResponse>> {
    if let Some(name) = &payload.full_name {
        validate_required_text(name, "full_name", MAX_NAME_LEN)?;
    }
    if let Some(email) = &payload.email {
        validate_email(email)?;
    }
    let password_hash = match &payload.password {
        Some(p) => {
            validate_password(p)?;
            Some(hash(p)?)
        }
        None => None,
    };

    let u = user::update(
        state.pool(),
        id,
        payload.full_name.as_deref().map(str::trim),
        payload.email.as_deref().map(str::trim),
        password_hash.as_deref(),
    )
    .await
    .map_err(user_write_error)?;

    Ok(ApiResponse::success(u.into()))
}

/// DELETE /api/users/{id}
///
/// Deleting your own account is rejected.
pub async fn delete(
    State(state): State<ServerState>,
    current_user: CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<ApiResponse<()>> {
    if current_user.id == id {
        return Err(AppError::invalid_request("Cannot delete the current user"));
    }
    if !user::delete(state.pool(), id).await? {
        return Err(user_not_found(id));
    }
    tracing::info!(user_id = id, deleted_by = current_user.id, "User deleted");
    Ok(ApiResponse::ok_with_message("User deleted"))
}
