//! Request extractors shared by the routers

use std::net::{IpAddr, SocketAddr};

use axum::{
    Json, RequestPartsExt,
    extract::{ConnectInfo, FromRequest, FromRequestParts, Request},
};
use axum_extra::{TypedHeader, headers};
use http::{HeaderMap, request::Parts};
use serde::de::DeserializeOwned;

use wishlist::{
    ADMIN_SESSION_COOKIE, AdminSession, CoordinationError, RateLimitDecision, RateLimitPolicy,
    enforce_rate_limit,
    validation::{Validate, ValidationIssue},
    verify_session,
};

use crate::config::TRUST_PROXY_HEADERS;
use crate::error::ErrorResponse;

/// The signed-in administrator, rejected with `401` when there is no valid session
#[derive(Clone, Debug)]
pub struct AdminUser(pub AdminSession);

impl AdminUser {
    /// Counts one request against `policy` for this session
    pub(crate) async fn enforce(
        &self,
        policy: &RateLimitPolicy,
    ) -> Result<Option<RateLimitDecision>, ErrorResponse> {
        Ok(enforce_rate_limit(policy, &self.0.id).await?)
    }
}

impl<S> FromRequestParts<S> for AdminUser
where
    S: Send + Sync,
{
    type Rejection = ErrorResponse;

    async fn from_request_parts(parts: &mut Parts, _: &S) -> Result<Self, Self::Rejection> {
        let cookies = parts
            .extract::<Option<TypedHeader<headers::Cookie>>>()
            .await
            .ok()
            .flatten();
        let host = parts
            .extract::<Option<TypedHeader<headers::Host>>>()
            .await
            .ok()
            .flatten();

        let session_cookie = cookies
            .as_ref()
            .and_then(|TypedHeader(cookies)| cookies.get(ADMIN_SESSION_COOKIE));
        let host = host.map(|TypedHeader(host)| host.to_string());

        let session = verify_session(session_cookie, host.as_deref())
            .await
            .map_err(|e| {
                tracing::debug!("Admin session rejected: {}", e);
                ErrorResponse(CoordinationError::Unauthorized)
            })?;
        Ok(AdminUser(session))
    }
}

/// Best-effort client address used for bans and rate limiting
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientIp(pub Option<String>);

impl ClientIp {
    pub(crate) fn rate_limit_key(&self, action: &str) -> String {
        format!("{}:{}", action, self.0.as_deref().unwrap_or("unknown"))
    }
}

pub(crate) fn client_ip(
    headers: &HeaderMap,
    direct: Option<IpAddr>,
    trust_proxy: bool,
) -> Option<String> {
    if trust_proxy {
        let forwarded = headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .or_else(|| headers.get("x-real-ip").and_then(|v| v.to_str().ok()));
        if let Some(ip) = forwarded.and_then(|v| v.trim().parse::<IpAddr>().ok()) {
            return Some(ip.to_string());
        }
    }
    direct.map(|ip| ip.to_string())
}

impl<S> FromRequestParts<S> for ClientIp
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _: &S) -> Result<Self, Self::Rejection> {
        let direct = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip());
        Ok(ClientIp(client_ip(&parts.headers, direct, *TRUST_PROXY_HEADERS)))
    }
}

/// JSON body that has passed [`Validate`]; holds the validated output
///
/// Malformed JSON, unknown fields and failed checks all become a `400` with
/// the list of issues.
pub struct ValidJson<T: Validate>(pub T::Output);

impl<S, T> FromRequest<S> for ValidJson<T>
where
    S: Send + Sync,
    T: Validate + DeserializeOwned + Send,
    T::Output: Send,
{
    type Rejection = ErrorResponse;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(body) = Json::<T>::from_request(req, state).await.map_err(|rejection| {
            ErrorResponse(CoordinationError::Validation(vec![ValidationIssue::new(
                "body",
                rejection.body_text(),
            )]))
        })?;

        body.validate()
            .map(ValidJson)
            .map_err(|issues| ErrorResponse(CoordinationError::Validation(issues)))
    }
}
