//! Configuration for the axum integration

use std::sync::LazyLock;

use wishlist::MAX_UPLOAD_BYTES;

/// Whether `X-Forwarded-For` / `X-Real-IP` name the client
///
/// Enable only behind a reverse proxy that overwrites these headers.
/// Default: false
pub(crate) static TRUST_PROXY_HEADERS: LazyLock<bool> = LazyLock::new(|| {
    std::env::var("TRUST_PROXY_HEADERS")
        .map(|v| v.eq_ignore_ascii_case("true") || v == "1")
        .unwrap_or(false)
});

/// Request bodies above this size are refused on the upload route before
/// the multipart parser sees them
pub(crate) const UPLOAD_BODY_LIMIT: usize = MAX_UPLOAD_BYTES + 64 * 1024;

pub(crate) const CONTENT_SECURITY_POLICY: &str =
    "default-src 'self'; frame-ancestors 'none'; base-uri 'self'; form-action 'self'";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upload_body_limit_leaves_room_for_multipart_framing() {
        assert!(UPLOAD_BODY_LIMIT > MAX_UPLOAD_BYTES);
    }
}
