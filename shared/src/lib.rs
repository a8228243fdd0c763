//! Shared types for the catalog service
//!
//! Common types used by the server and its clients: error codes and the
//! JSend envelope, pagination, catalog models and duplicate reports.

pub mod error;
pub mod models;
pub mod response;
pub mod util;

// Re-exports
pub use axum::{Json, body};
pub use http;
pub use serde::{Deserialize, Serialize};

pub use error::{ApiResponse, AppError, AppResult, ErrorCode};
pub use response::Page;
