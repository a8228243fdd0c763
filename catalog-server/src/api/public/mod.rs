//! Public catalog API (no authentication)
//!
//! | Path | Method | Description |
//! |------|--------|-------------|
//! | /api/public/products | GET | listing, duplicates hidden by default |
//! | /api/public/products/{id}/related | GET | products sharing a category or tag |
//! | /api/public/products/{id}/{slug} | GET | product page with canonical URL |

mod handler;

use axum::{Router, routing::get};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/public", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/products", get(handler::list))
        .route("/products/{id}/related", get(handler::related))
        .route("/products/{id}/{slug}", get(handler::get_by_slug))
}
