use axum::{
    Json,
    response::{IntoResponse, Response},
};
use http::{HeaderMap, HeaderName, HeaderValue, StatusCode, header::RETRY_AFTER};
use serde_json::{Value, json};

use wishlist::{CoordinationError, IS_PRODUCTION, RateLimitDecision};

/// JSON error body produced from a [`CoordinationError`]
#[derive(Debug)]
pub struct ErrorResponse(pub CoordinationError);

/// Helper trait for converting core results into handler results
pub(crate) trait IntoResponseError<T> {
    fn into_response_error(self) -> Result<T, ErrorResponse>;
}

impl<T> IntoResponseError<T> for Result<T, CoordinationError> {
    fn into_response_error(self) -> Result<T, ErrorResponse> {
        self.map_err(ErrorResponse)
    }
}

impl From<CoordinationError> for ErrorResponse {
    fn from(err: CoordinationError) -> Self {
        Self(err)
    }
}

pub(crate) fn status_code(err: &CoordinationError) -> StatusCode {
    match err {
        CoordinationError::NotFound(_) => StatusCode::NOT_FOUND,
        CoordinationError::BadRequest(_) | CoordinationError::Validation(_) => {
            StatusCode::BAD_REQUEST
        }
        CoordinationError::Conflict(_) => StatusCode::CONFLICT,
        CoordinationError::Forbidden(_) => StatusCode::FORBIDDEN,
        CoordinationError::Unauthorized => StatusCode::UNAUTHORIZED,
        CoordinationError::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
        CoordinationError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn error_body(err: &CoordinationError, production: bool) -> Value {
    let message = match err {
        CoordinationError::Internal(_) if production => "Internal server error".to_string(),
        other => other.to_string(),
    };

    let mut body = json!({ "error": message });
    if let CoordinationError::Validation(issues) = err {
        body["issues"] = json!(issues);
    }
    if !production {
        body["stack"] = json!(format!("{err:?}"));
    }
    body
}

/// `X-RateLimit-*` headers, plus `Retry-After` when the request was denied
pub(crate) fn rate_limit_headers(decision: &RateLimitDecision) -> HeaderMap {
    let mut headers = HeaderMap::new();
    let pairs = [
        ("x-ratelimit-limit", decision.limit),
        ("x-ratelimit-remaining", decision.remaining),
        ("x-ratelimit-reset", decision.reset_at_secs()),
    ];
    for (name, value) in pairs {
        headers.insert(HeaderName::from_static(name), HeaderValue::from(value));
    }
    if !decision.allowed {
        headers.insert(RETRY_AFTER, HeaderValue::from(decision.retry_after.max(1)));
    }
    headers
}

impl IntoResponse for ErrorResponse {
    fn into_response(self) -> Response {
        let status = status_code(&self.0);
        let body = error_body(&self.0, *IS_PRODUCTION);

        match &self.0 {
            CoordinationError::RateLimited(decision) => {
                (status, rate_limit_headers(decision), Json(body)).into_response()
            }
            _ => (status, Json(body)).into_response(),
        }
    }
}
