//! Service layer
//!
//! - [`ProductService`] - product lifecycle with duplicate protection

pub mod product_service;

pub use product_service::{CatalogResult, ProductService};
