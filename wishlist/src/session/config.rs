use std::env;
use std::sync::LazyLock;

use crate::config::IS_PRODUCTION;

/// Signed admin session cookie
pub const ADMIN_SESSION_COOKIE: &str = "admin_session";
/// One-time setup secret presented before the first passkey enrollment
pub const ADMIN_SETUP_TOKEN_COOKIE: &str = "admin_setup_token";
pub const ADMIN_REG_CHALLENGE_COOKIE: &str = "admin_reg_challenge";
pub const ADMIN_AUTH_CHALLENGE_COOKIE: &str = "admin_auth_challenge";

/// Fixed session lifetime in seconds (7 days); sessions are never extended
pub(crate) static SESSION_MAX_AGE: LazyLock<i64> = LazyLock::new(|| {
    env::var("SESSION_MAX_AGE")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(7 * 24 * 60 * 60)
});

/// Minimum interval between sweeps of expired session rows
pub(super) static SESSION_CLEANUP_INTERVAL: LazyLock<i64> = LazyLock::new(|| {
    env::var("SESSION_CLEANUP_INTERVAL")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(60 * 60)
});

pub(crate) static SESSION_SECRET: LazyLock<Vec<u8>> =
    LazyLock::new(|| match env::var("SESSION_SECRET") {
        Ok(secret) if !secret.is_empty() => secret.into_bytes(),
        _ => {
            if *IS_PRODUCTION {
                panic!("SESSION_SECRET must be set in production");
            }
            tracing::warn!("SESSION_SECRET is not set; using an insecure development secret");
            "development_session_secret_change_me".as_bytes().to_vec()
        }
    });
