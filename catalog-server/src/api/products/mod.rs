//! Product administration API
//!
//! | Path | Method | Description |
//! |------|--------|-------------|
//! | /api/products | GET | filtered, sorted, paginated listing |
//! | /api/products | POST | create (duplicate-checked) |
//! | /api/products/duplicates | GET | catalog-wide duplicate report |
//! | /api/products/find-or-create | POST | return the equivalent product or create it |
//! | /api/products/{id} | GET / PUT / DELETE | single product |

mod handler;

use axum::{
    Router,
    routing::{get, post},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/products", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/", get(handler::list).post(handler::create))
        .route("/duplicates", get(handler::duplicates))
        .route("/find-or-create", post(handler::find_or_create))
        .route(
            "/{id}",
            get(handler::get_by_id)
                .put(handler::update)
                .delete(handler::delete),
        )
}
