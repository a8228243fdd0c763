//! Router assembly
//!
//! [`build_router`] registers every API module; [`build_app`] adds the
//! middleware stack. Both the HTTP server and the integration tests use
//! [`build_app`].

use axum::Router;
use axum::middleware as axum_middleware;
use http::{HeaderName, HeaderValue};
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{
    MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer,
};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::api;
use crate::auth::require_auth;
use crate::core::ServerState;
use crate::middleware;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Request ID generator (UUID v4)
#[derive(Clone)]
struct XRequestId;

impl MakeRequestId for XRequestId {
    fn make_request_id<B>(&mut self, _request: &http::Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&Uuid::new_v4().to_string())
            .ok()
            .map(RequestId::new)
    }
}

/// All routes, without middleware or state
pub fn build_router() -> Router<ServerState> {
    Router::new()
        // Public
        .merge(api::health::router())
        .merge(api::auth::router())
        .merge(api::public::router())
        // Authenticated
        .merge(api::users::router())
        .merge(api::products::router())
        .merge(api::categories::router())
        .merge(api::tags::router())
}

/// Fully configured application (state still to be provided)
pub fn build_app(state: &ServerState) -> Router<ServerState> {
    build_router()
        .layer(CorsLayer::permissive())
        .layer(CompressionLayer::new())
        .layer(axum_middleware::from_fn(middleware::logging_middleware))
        .layer(TraceLayer::new_for_http())
        // Propagate sits inside Set so it sees the generated id
        .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
            REQUEST_ID_HEADER,
        )))
        .layer(SetRequestIdLayer::new(
            HeaderName::from_static(REQUEST_ID_HEADER),
            XRequestId,
        ))
        // Outermost: CurrentUser is in the extensions before anything above runs
        .layer(axum_middleware::from_fn_with_state(state.clone(), require_auth))
}
