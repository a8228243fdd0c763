//! Authentication Handlers

use axum::{Json, extract::State};

use crate::auth::password::{hash_password, verify_password};
use crate::core::ServerState;
use crate::db::repository::{RepoError, user};
use crate::security_log;
use crate::utils::validation::{MAX_NAME_LEN, validate_email, validate_password, validate_required_text};
use crate::utils::{ApiResponse, AppError, AppResult, ErrorCode};
use shared::models::{AuthResponse, LoginRequest, User, UserCreate};

/// Hash a password, hiding argon2 details from the client
pub(crate) fn hash(password: &str) -> Result<String, AppError> {
    hash_password(password).map_err(|e| {
        tracing::error!(error = %e, "Password hashing failed");
        AppError::internal("Failed to hash password")
    })
}

/// Map a repository error from a user write
pub(crate) fn user_write_error(err: RepoError) -> AppError {
    match err {
        RepoError::Duplicate(msg) => AppError::with_message(ErrorCode::EmailAlreadyRegistered, msg),
        RepoError::NotFound(msg) => AppError::with_message(ErrorCode::UserNotFound, msg),
        other => other.into(),
    }
}

fn issue(state: &ServerState, user: User) -> AppResult<AuthResponse> {
    let token = state
        .jwt_service()
        .generate_token(user.id, &user.email)
        .map_err(|e| {
            tracing::error!(error = %e, "Token generation failed");
            AppError::internal("Failed to generate token")
        })?;
    Ok(AuthResponse {
        token,
        user: user.into(),
    })
}

/// POST /api/auth/register - create an account and sign in
pub async fn register(
    State(state): State<ServerState>,
    Json(req): Json<UserCreate>,
) -> AppResult<ApiResponse<AuthResponse>> {
    validate_required_text(&req.full_name, "full_name", MAX_NAME_LEN)?;
    validate_email(&req.email)?;
    validate_password(&req.password)?;

    let email = req.email.trim();
    let password_hash = hash(&req.password)?;
    let created = user::create(state.pool(), req.full_name.trim(), email, &password_hash)
        .await
        .map_err(user_write_error)?;

    security_log!("INFO", "user_registered", user_id = created.id, email = email.to_string());
    Ok(ApiResponse::success_with_message(
        "Registration successful",
        issue(&state, created)?,
    ))
}

/// POST /api/auth/login
///
/// Unknown email and wrong password produce the same error.
pub async fn login(
    State(state): State<ServerState>,
    Json(req): Json<LoginRequest>,
) -> AppResult<ApiResponse<AuthResponse>> {
    let email = req.email.trim();
    if email.is_empty() || req.password.is_empty() {
        return Err(AppError::invalid_credentials());
    }

    let Some(found) = user::find_by_email(state.pool(), email).await? else {
        security_log!("WARN", "login_failed", email = email.to_string(), reason = "user_not_found");
        return Err(AppError::invalid_credentials());
    };

    let valid = verify_password(&req.password, &found.password_hash).map_err(|e| {
        tracing::error!(error = %e, user_id = found.id, "Stored password hash is unreadable");
        AppError::internal("Password verification failed")
    })?;
    if !valid {
        security_log!("WARN", "login_failed", email = email.to_string(), reason = "invalid_password");
        return Err(AppError::invalid_credentials());
    }

    security_log!("INFO", "login_success", user_id = found.id);
    Ok(ApiResponse::success_with_message(
        "Login successful",
        issue(&state, found)?,
    ))
}
