//! Authentication
//!
//! - [`JwtService`] - token issue and validation
//! - [`CurrentUser`] - authenticated user context
//! - [`require_auth`] - authentication middleware with token renewal
//! - [`password`] - argon2 hashing

pub mod extractor;
pub mod jwt;
pub mod middleware;
pub mod password;

pub use jwt::{Claims, CurrentUser, JwtConfig, JwtError, JwtService};
pub use middleware::{RENEWED_TOKEN_HEADER, is_public_path, require_auth};
