use axum::{extract::Request, middleware::Next, response::Response};
use http::{
    HeaderValue,
    header::{
        CACHE_CONTROL, CONTENT_SECURITY_POLICY, REFERRER_POLICY, X_CONTENT_TYPE_OPTIONS,
        X_FRAME_OPTIONS,
    },
};

use crate::config::CONTENT_SECURITY_POLICY as CSP;

/// Admin and auth ceremony paths, wherever the API is mounted
pub(crate) fn is_sensitive_path(path: &str) -> bool {
    path.split('/').any(|segment| segment == "admin" || segment == "~")
}

/// Adds the security headers every response carries. Admin and auth responses
/// also get a restrictive CSP and are never cached.
pub async fn security_headers(req: Request, next: Next) -> Response {
    let sensitive = is_sensitive_path(req.uri().path());
    let mut response = next.run(req).await;

    let headers = response.headers_mut();
    headers.insert(X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"));
    headers.insert(X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));
    headers.insert(
        REFERRER_POLICY,
        HeaderValue::from_static("strict-origin-when-cross-origin"),
    );
    if sensitive {
        headers.insert(CONTENT_SECURITY_POLICY, HeaderValue::from_static(CSP));
        headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-store"));
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_sensitive_path() {
        assert!(is_sensitive_path("/api/admin/items"));
        assert!(is_sensitive_path("/api/~/auth/logout"));
        assert!(!is_sensitive_path("/api/wishlist/items"));
        assert!(!is_sensitive_path("/wishlist"));
        // Only whole segments count
        assert!(!is_sensitive_path("/api/wishlist/administrator"));
    }
}
