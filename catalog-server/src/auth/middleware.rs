//! Authentication middleware

use axum::{
    extract::{Request, State},
    http::HeaderValue,
    middleware::Next,
    response::Response,
};
use shared::error::AppError;

use crate::auth::{CurrentUser, JwtError, JwtService};
use crate::core::ServerState;
use crate::security_log;

/// Response header carrying a freshly issued token
pub const RENEWED_TOKEN_HEADER: &str = "x-renewed-token";

/// API paths reachable without a token
pub fn is_public_path(path: &str) -> bool {
    matches!(path, "/api/auth/login" | "/api/auth/register" | "/api/health")
        || path == "/api/public"
        || path.starts_with("/api/public/")
}

pub(crate) fn auth_error(e: JwtError) -> AppError {
    match e {
        JwtError::ExpiredToken => AppError::token_expired(),
        _ => AppError::invalid_token("Invalid token"),
    }
}

/// Authentication middleware - requires a valid bearer token
///
/// Validates `Authorization: Bearer <token>`, injects [`CurrentUser`] into the
/// request extensions and attaches a renewed token to the response under
/// [`RENEWED_TOKEN_HEADER`].
///
/// # Skipped
///
/// - `OPTIONS *` (CORS preflight)
/// - non-`/api/` paths
/// - paths accepted by [`is_public_path`]
///
/// | Error | Code |
/// |-------|------|
/// | No Authorization header | 401 NotAuthenticated |
/// | Expired token | 401 TokenExpired |
/// | Invalid token | 401 TokenInvalid |
pub async fn require_auth(
    State(state): State<ServerState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    if req.method() == http::Method::OPTIONS {
        return Ok(next.run(req).await);
    }

    let path = req.uri().path();
    if !path.starts_with("/api/") || is_public_path(path) {
        return Ok(next.run(req).await);
    }

    let jwt_service = state.jwt_service();
    let auth_header = req
        .headers()
        .get(http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    let token = match auth_header {
        Some(header) => JwtService::extract_from_header(header)
            .ok_or_else(|| AppError::invalid_token("Invalid authorization header"))?,
        None => {
            security_log!("WARN", "auth_missing", uri = req.uri().to_string());
            return Err(AppError::not_authenticated());
        }
    };

    let user = match jwt_service
        .validate_token(token)
        .and_then(CurrentUser::try_from)
    {
        Ok(user) => user,
        Err(e) => {
            security_log!(
                "WARN",
                "auth_failed",
                error = e.to_string(),
                uri = req.uri().to_string()
            );
            return Err(auth_error(e));
        }
    };

    req.extensions_mut().insert(user.clone());
    let mut response = next.run(req).await;

    match jwt_service.generate_token(user.id, &user.email) {
        Ok(renewed) => {
            if let Ok(value) = HeaderValue::from_str(&renewed) {
                response.headers_mut().insert(RENEWED_TOKEN_HEADER, value);
            }
        }
        Err(e) => tracing::warn!(user_id = user.id, error = %e, "Token renewal failed"),
    }

    Ok(response)
}
