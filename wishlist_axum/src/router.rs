//! Combined routers for the JSON API and the public page

use axum::{Router, middleware::from_fn};
use tower_http::LatencyUnit;
use tower_http::trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::Level;

use wishlist::WISHLIST_ROUTE_PREFIX;

use crate::middleware::security_headers;

/// The JSON API, meant to be nested under `WISHLIST_ROUTE_PREFIX`
///
/// - `/wishlist/...` public visitor endpoints
/// - `/admin/...` admin endpoints (session required)
/// - `/~/auth/...` passkey ceremonies
pub fn wishlist_api_router() -> Router {
    Router::new()
        .nest("/wishlist", super::visitor::router())
        .nest("/admin", super::admin::router())
        .nest("/~/auth", super::auth::router())
}

/// The API under `WISHLIST_ROUTE_PREFIX`, the `/wishlist` page, security
/// headers and HTTP tracing
pub fn wishlist_router() -> Router {
    wishlist_router_no_trace().layer(
        TraceLayer::new_for_http()
            .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
            .on_request(DefaultOnRequest::new().level(Level::INFO))
            .on_response(
                DefaultOnResponse::new()
                    .level(Level::INFO)
                    .latency_unit(LatencyUnit::Millis),
            ),
    )
}

/// Same as [`wishlist_router`] without the tracing layer
pub fn wishlist_router_no_trace() -> Router {
    Router::new()
        .nest(WISHLIST_ROUTE_PREFIX.as_str(), wishlist_api_router())
        .merge(super::page::router())
        .layer(from_fn(security_headers))
}
