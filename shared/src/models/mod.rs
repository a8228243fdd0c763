//! Data models
//!
//! Shared between catalog-server and clients (via API).
//! DB row types use `#[cfg_attr(feature = "db", derive(sqlx::FromRow))]`.
//! All IDs are `i64` (SQLite INTEGER PRIMARY KEY).

pub mod category;
pub mod duplicate;
pub mod product;
pub mod tag;
pub mod user;

// Re-exports
pub use category::*;
pub use duplicate::*;
pub use product::*;
pub use tag::*;
pub use user::*;
