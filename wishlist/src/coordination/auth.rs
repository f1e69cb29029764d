//! WebAuthn ceremonies wired to challenge cookies and admin sessions

use http::HeaderMap;
use http::header::USER_AGENT;

use crate::passkey::{
    AdminCredential, AuthenticationOptions, AuthenticatorResponse, CredentialStore,
    PASSKEY_CHALLENGE_TIMEOUT, RegisterCredential, RegistrationOptions, finish_authentication,
    finish_registration, start_authentication, start_registration, verify_setup_token,
};
use crate::session::{
    ADMIN_AUTH_CHALLENGE_COOKIE, ADMIN_REG_CHALLENGE_COOKIE, ADMIN_SETUP_TOKEN_COOKIE,
    create_session, prepare_logout_response, verify_session_from_headers,
};
use crate::utils::{get_cookie, header_clear_cookie, header_set_cookie};

use super::errors::{CoordinationError, VERIFICATION_FAILED};

/// Registration is open to an active admin session, or to the holder of the
/// setup secret while no passkey exists yet.
async fn authorize_registration(
    headers: &HeaderMap,
    body_token: Option<&str>,
) -> Result<(), CoordinationError> {
    if verify_session_from_headers(headers).await.is_ok() {
        return Ok(());
    }

    let cookie_token = get_cookie(headers, ADMIN_SETUP_TOKEN_COOKIE);
    let Some(token) = body_token.or(cookie_token.as_deref()) else {
        return Err(CoordinationError::Forbidden("Setup token required".to_string()).log());
    };

    if CredentialStore::count_credentials().await? > 0 {
        return Err(
            CoordinationError::Forbidden("Setup token has already been used".to_string()).log(),
        );
    }
    if !verify_setup_token(token) {
        return Err(CoordinationError::Forbidden("Invalid setup token".to_string()).log());
    }
    Ok(())
}

/// Issues registration options and sets the challenge cookie. A setup token
/// from the body is carried to the verify step in its own cookie.
#[tracing::instrument(skip_all)]
pub async fn handle_registration_options(
    headers: &HeaderMap,
    setup_token: Option<&str>,
) -> Result<(RegistrationOptions, HeaderMap), CoordinationError> {
    authorize_registration(headers, setup_token).await?;

    let (options, challenge_id) = start_registration().await?;

    let mut response_headers = HeaderMap::new();
    header_set_cookie(
        &mut response_headers,
        ADMIN_REG_CHALLENGE_COOKIE,
        &challenge_id,
        *PASSKEY_CHALLENGE_TIMEOUT as i64,
    )?;
    if let Some(token) = setup_token {
        header_set_cookie(
            &mut response_headers,
            ADMIN_SETUP_TOKEN_COOKIE,
            token,
            *PASSKEY_CHALLENGE_TIMEOUT as i64,
        )?;
    }

    Ok((options, response_headers))
}

/// Stores the new passkey and opens a session for it. The setup token and
/// challenge cookies are cleared.
#[tracing::instrument(skip_all)]
pub async fn handle_registration_verify(
    headers: &HeaderMap,
    credential: RegisterCredential,
) -> Result<(AdminCredential, HeaderMap), CoordinationError> {
    authorize_registration(headers, None).await?;

    let Some(challenge_id) = get_cookie(headers, ADMIN_REG_CHALLENGE_COOKIE) else {
        tracing::warn!("Registration verify without a challenge cookie");
        return Err(CoordinationError::BadRequest(VERIFICATION_FAILED.to_string()));
    };

    let credential = finish_registration(&challenge_id, credential).await?;
    tracing::info!(credential_id = %credential.id, "Passkey registered");

    let user_agent = headers.get(USER_AGENT).and_then(|v| v.to_str().ok());
    let (_, mut response_headers) = create_session(&credential.id, user_agent).await?;
    header_clear_cookie(&mut response_headers, ADMIN_REG_CHALLENGE_COOKIE)?;
    header_clear_cookie(&mut response_headers, ADMIN_SETUP_TOKEN_COOKIE)?;

    Ok((credential, response_headers))
}

#[tracing::instrument(skip_all)]
pub async fn handle_authentication_options()
-> Result<(AuthenticationOptions, HeaderMap), CoordinationError> {
    let (options, challenge_id) = start_authentication().await?;

    let mut response_headers = HeaderMap::new();
    header_set_cookie(
        &mut response_headers,
        ADMIN_AUTH_CHALLENGE_COOKIE,
        &challenge_id,
        *PASSKEY_CHALLENGE_TIMEOUT as i64,
    )?;
    Ok((options, response_headers))
}

#[tracing::instrument(skip_all)]
pub async fn handle_authentication_verify(
    headers: &HeaderMap,
    response: AuthenticatorResponse,
) -> Result<HeaderMap, CoordinationError> {
    let Some(challenge_id) = get_cookie(headers, ADMIN_AUTH_CHALLENGE_COOKIE) else {
        tracing::warn!("Authentication verify without a challenge cookie");
        return Err(CoordinationError::BadRequest(VERIFICATION_FAILED.to_string()));
    };

    let credential = finish_authentication(&challenge_id, response).await?;

    let user_agent = headers.get(USER_AGENT).and_then(|v| v.to_str().ok());
    let (_, mut response_headers) = create_session(&credential.id, user_agent).await?;
    header_clear_cookie(&mut response_headers, ADMIN_AUTH_CHALLENGE_COOKIE)?;

    tracing::info!(credential_id = %credential.id, "Admin signed in");
    Ok(response_headers)
}

pub async fn handle_logout(headers: &HeaderMap) -> Result<HeaderMap, CoordinationError> {
    Ok(prepare_logout_response(headers).await?)
}

/// Whether the request carries a valid admin session
pub async fn is_authenticated(headers: &HeaderMap) -> bool {
    verify_session_from_headers(headers).await.is_ok()
}
