//! Central configuration for the wishlist crate

use std::sync::LazyLock;

/// Route prefix under which the JSON API is mounted
///
/// Default: "/api"
pub static WISHLIST_ROUTE_PREFIX: LazyLock<String> = LazyLock::new(|| {
    std::env::var("WISHLIST_ROUTE_PREFIX").unwrap_or_else(|_| "/api".to_string())
});

/// Whether the process runs in production mode (`APP_ENV=production`)
///
/// Production disables the localhost session bypass, adds `Secure` to cookies
/// and hides error detail from responses.
pub static IS_PRODUCTION: LazyLock<bool> = LazyLock::new(|| {
    std::env::var("APP_ENV")
        .map(|v| v.eq_ignore_ascii_case("production"))
        .unwrap_or(false)
});

/// Global switch for visitor reservations
pub static RESERVATIONS_ENABLED: LazyLock<bool> = LazyLock::new(|| {
    parse_bool_flag(std::env::var("RESERVATIONS_ENABLED").ok().as_deref(), true)
});

pub(crate) fn parse_bool_flag(value: Option<&str>, default: bool) -> bool {
    match value.map(|v| v.trim().to_lowercase()) {
        Some(v) if v == "true" || v == "1" || v == "yes" => true,
        Some(v) if v == "false" || v == "0" || v == "no" => false,
        Some(v) => {
            tracing::warn!("Invalid boolean flag: {}. Using default '{}'", v, default);
            default
        }
        None => default,
    }
}
