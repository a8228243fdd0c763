//! HTTP API
//!
//! One module per resource, each exposing `router()`:
//!
//! - [`health`] - liveness and database check
//! - [`auth`] - register / login
//! - [`users`] - user management
//! - [`products`] - product administration, duplicate report, find-or-create
//! - [`categories`] - category CRUD
//! - [`tags`] - tag CRUD
//! - [`public`] - unauthenticated catalog browsing

pub mod auth;
pub mod categories;
pub mod health;
pub mod products;
pub mod public;
pub mod tags;
pub mod users;

pub use crate::utils::{ApiResponse, AppResult};
