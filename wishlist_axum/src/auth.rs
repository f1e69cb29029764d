//! WebAuthn ceremony endpoints for the admin

use axum::{
    Json,
    routing::{Router, get, post},
};
use http::HeaderMap;
use serde::Serialize;
use serde_json::{Value, json};

use wishlist::{
    AdminCredential, AuthenticationOptions, AuthenticatorResponse, RateLimitPolicy,
    RegisterCredential, RegistrationOptions, enforce_rate_limit, handle_authentication_options,
    handle_authentication_verify, handle_logout, handle_registration_options,
    handle_registration_verify, is_authenticated, validation::RegistrationOptionsRequest,
};

use crate::error::{ErrorResponse, IntoResponseError};
use crate::extract::{ClientIp, ValidJson};

pub(crate) fn router() -> Router {
    Router::new()
        .route("/registration-options", post(registration_options))
        .route("/registration-verify", post(registration_verify))
        .route("/authentication-options", post(authentication_options))
        .route("/authentication-verify", post(authentication_verify))
        .route("/logout", post(logout))
        .route("/session", get(session))
}

#[derive(Serialize)]
struct SessionStatus {
    authenticated: bool,
}

async fn limit(ip: &ClientIp) -> Result<(), ErrorResponse> {
    enforce_rate_limit(&RateLimitPolicy::AUTH, &ip.rate_limit_key("auth"))
        .await
        .into_response_error()?;
    Ok(())
}

async fn registration_options(
    ip: ClientIp,
    headers: HeaderMap,
    ValidJson(setup_token): ValidJson<RegistrationOptionsRequest>,
) -> Result<(HeaderMap, Json<RegistrationOptions>), ErrorResponse> {
    limit(&ip).await?;
    let (options, response_headers) = handle_registration_options(&headers, setup_token.as_deref())
        .await
        .into_response_error()?;
    Ok((response_headers, Json(options)))
}

async fn registration_verify(
    ip: ClientIp,
    headers: HeaderMap,
    ValidJson(credential): ValidJson<RegisterCredential>,
) -> Result<(HeaderMap, Json<AdminCredential>), ErrorResponse> {
    limit(&ip).await?;
    let (credential, response_headers) = handle_registration_verify(&headers, credential)
        .await
        .into_response_error()?;
    Ok((response_headers, Json(credential)))
}

async fn authentication_options(
    ip: ClientIp,
) -> Result<(HeaderMap, Json<AuthenticationOptions>), ErrorResponse> {
    limit(&ip).await?;
    let (options, response_headers) = handle_authentication_options()
        .await
        .into_response_error()?;
    Ok((response_headers, Json(options)))
}

async fn authentication_verify(
    ip: ClientIp,
    headers: HeaderMap,
    ValidJson(response): ValidJson<AuthenticatorResponse>,
) -> Result<(HeaderMap, Json<Value>), ErrorResponse> {
    limit(&ip).await?;
    let response_headers = handle_authentication_verify(&headers, response)
        .await
        .into_response_error()?;
    Ok((response_headers, Json(json!({ "success": true }))))
}

async fn logout(headers: HeaderMap) -> Result<(HeaderMap, Json<Value>), ErrorResponse> {
    let response_headers = handle_logout(&headers).await.into_response_error()?;
    Ok((response_headers, Json(json!({ "success": true }))))
}

async fn session(headers: HeaderMap) -> Json<SessionStatus> {
    Json(SessionStatus {
        authenticated: is_authenticated(&headers).await,
    })
}
