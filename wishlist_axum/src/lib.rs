//! wishlist-axum - axum routes, extractors and middleware for the `wishlist` crate

mod admin;
mod auth;
mod config;
mod error;
mod extract;
mod middleware;
mod page;
mod router;
mod visitor;

pub use error::ErrorResponse;
pub use extract::{AdminUser, ClientIp, ValidJson};
pub use middleware::security_headers;
pub use router::{wishlist_api_router, wishlist_router, wishlist_router_no_trace};

pub use wishlist::{WISHLIST_ROUTE_PREFIX, init};
