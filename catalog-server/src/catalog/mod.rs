//! Catalog core
//!
//! - [`query`] - listing criteria builder
//! - [`guard`] - uniqueness guard and duplicate detection
//! - [`slug`] - slug and SKU derivation
//! - [`store`] - store traits the core depends on

pub mod guard;
pub mod query;
pub mod slug;
pub mod store;

#[cfg(test)]
pub(crate) mod testing;

use std::fmt;

use shared::error::{AppError, ErrorCode};
use shared::models::{DuplicateConflict, DuplicateRule};
use thiserror::Error;

use crate::db::repository::RepoError;

/// Name key under the default guard settings: trimmed and lowercased.
///
/// Writes persist [`GuardConfig::name_key`](guard::GuardConfig::name_key), so
/// the `(name_key, category_id)` index enforces the equality the guard checks.
pub fn name_key(name: &str) -> String {
    name.trim().to_lowercase()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Product,
    Category,
    Tag,
}

impl Resource {
    fn not_found_code(&self) -> ErrorCode {
        match self {
            Self::Product => ErrorCode::ProductNotFound,
            Self::Category => ErrorCode::CategoryNotFound,
            Self::Tag => ErrorCode::TagNotFound,
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Product => "Product",
            Self::Category => "Category",
            Self::Tag => "Tag",
        })
    }
}

/// Errors surfaced by the catalog use cases
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Missing or malformed input, detected before any store access
    #[error("{message}")]
    Validation {
        field: &'static str,
        message: String,
    },

    /// Uniqueness collision, from the guard or from a storage constraint
    #[error("{}", .0.message)]
    Conflict(Box<DuplicateConflict>),

    #[error("{resource} not found: {ids:?}")]
    NotFound { resource: Resource, ids: Vec<i64> },

    /// The store could not be reached while checking for duplicates
    #[error("duplicate validation unavailable")]
    Unavailable(#[source] RepoError),

    #[error("store error: {0}")]
    Store(#[from] RepoError),
}

impl CatalogError {
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            field,
            message: message.into(),
        }
    }

    pub fn not_found(resource: Resource, id: i64) -> Self {
        Self::NotFound {
            resource,
            ids: vec![id],
        }
    }
}

impl From<CatalogError> for AppError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::Validation { field, message } => {
                AppError::validation(message).with_detail("field", field)
            }
            CatalogError::Conflict(conflict) => {
                let code = match conflict.rule {
                    DuplicateRule::Sku => ErrorCode::ProductSkuExists,
                    _ => ErrorCode::ProductDuplicate,
                };
                let mut app = AppError::with_message(code, conflict.message.clone())
                    .with_detail("rule", conflict.rule.as_str())
                    .with_detail("field", conflict.field.clone())
                    .with_detail("value", conflict.value.clone())
                    .with_detail("existing_id", conflict.existing_id)
                    .with_detail("severity", serde_json::to_value(conflict.severity).unwrap_or_default());
                if let Ok(suggestion) = serde_json::to_value(&conflict.suggestion) {
                    app = app.with_detail("suggestion", suggestion);
                }
                app
            }
            CatalogError::NotFound { resource, ids } => {
                let list = ids
                    .iter()
                    .map(i64::to_string)
                    .collect::<Vec<_>>()
                    .join(", ");
                AppError::with_message(
                    resource.not_found_code(),
                    format!("{resource} not found: {list}"),
                )
                .with_detail("resource", resource.to_string())
                .with_detail("ids", ids)
            }
            CatalogError::Unavailable(e) => {
                tracing::error!(error = %e, "Duplicate validation unavailable");
                AppError::new(ErrorCode::DuplicateCheckUnavailable)
            }
            CatalogError::Store(RepoError::Duplicate(detail)) => {
                tracing::warn!(detail = %detail, "Unattributed product unique violation");
                AppError::new(ErrorCode::ProductDuplicate)
            }
            CatalogError::Store(e) => {
                tracing::error!(error = %e, "Catalog store failure");
                AppError::database("Data store failure")
            }
        }
    }
}
