use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{Duration, Utc};
use http::header::{HOST, HeaderMap};

use crate::config::IS_PRODUCTION;
use crate::session::config::{ADMIN_SESSION_COOKIE, SESSION_CLEANUP_INTERVAL, SESSION_MAX_AGE};
use crate::session::errors::SessionError;
use crate::session::storage::SessionStore;
use crate::session::types::AdminSession;
use crate::utils::{gen_random_string, get_cookie, header_clear_cookie, header_set_cookie};

use super::cookie::{is_local_host, sign_session_id, unsign_session_cookie};

/// Credential id reported by the synthetic development session
const DEV_BYPASS_CREDENTIAL_ID: &str = "dev-bypass";

/// Unix timestamp of the last expired-session sweep
static LAST_CLEANUP: AtomicI64 = AtomicI64::new(0);

/// Creates a session for `credential_id` and returns it together with the
/// `Set-Cookie` header carrying the signed id.
pub async fn create_session(
    credential_id: &str,
    user_agent: Option<&str>,
) -> Result<(AdminSession, HeaderMap), SessionError> {
    let now = Utc::now();
    let session = AdminSession {
        id: gen_random_string(32)?,
        credential_id: credential_id.to_string(),
        expires_at: now + Duration::seconds(*SESSION_MAX_AGE),
        created_at: now,
        user_agent: user_agent.map(|ua| ua.chars().take(512).collect()),
    };

    SessionStore::insert_session(&session).await?;

    let mut headers = HeaderMap::new();
    header_set_cookie(
        &mut headers,
        ADMIN_SESSION_COOKIE,
        &sign_session_id(&session.id)?,
        *SESSION_MAX_AGE,
    )?;

    tracing::info!(credential_id = %credential_id, "Admin session created");
    Ok((session, headers))
}

/// Verifies a signed session cookie value.
///
/// Outside production a request addressed to a loopback host is granted a
/// synthetic session. An unknown host never gets the bypass.
pub async fn verify_session(
    cookie_value: Option<&str>,
    host: Option<&str>,
) -> Result<AdminSession, SessionError> {
    if !*IS_PRODUCTION && host.is_some_and(is_local_host) {
        tracing::debug!("Development session bypass for loopback host");
        return Ok(dev_bypass_session());
    }

    cleanup_expired_sessions_throttled().await;

    let Some(cookie_value) = cookie_value else {
        return Err(SessionError::Unauthorized);
    };

    let Some(session_id) = unsign_session_cookie(cookie_value) else {
        tracing::warn!("Rejected session cookie with an invalid signature");
        return Err(SessionError::Unauthorized);
    };

    let Some(session) = SessionStore::get_session(session_id).await? else {
        tracing::debug!("Session not found");
        return Err(SessionError::Unauthorized);
    };

    if session.is_expired_at(Utc::now()) {
        tracing::debug!("Session expired at {}", session.expires_at);
        SessionStore::delete_session(&session.id).await?;
        return Err(SessionError::Expired);
    }

    Ok(session)
}

/// Verifies the session from request headers using the `admin_session` cookie and `Host`
pub async fn verify_session_from_headers(
    headers: &HeaderMap,
) -> Result<AdminSession, SessionError> {
    let cookie = get_cookie(headers, ADMIN_SESSION_COOKIE);
    let host = headers.get(HOST).and_then(|h| h.to_str().ok());
    verify_session(cookie.as_deref(), host).await
}

/// Revokes the session named by the request cookie and returns headers clearing it
pub async fn prepare_logout_response(headers: &HeaderMap) -> Result<HeaderMap, SessionError> {
    if let Some(cookie) = get_cookie(headers, ADMIN_SESSION_COOKIE) {
        if let Some(session_id) = unsign_session_cookie(&cookie) {
            SessionStore::delete_session(session_id).await?;
            tracing::info!("Admin session revoked");
        }
    }

    let mut response_headers = HeaderMap::new();
    header_clear_cookie(&mut response_headers, ADMIN_SESSION_COOKIE)?;
    Ok(response_headers)
}

fn dev_bypass_session() -> AdminSession {
    let now = Utc::now();
    AdminSession {
        id: DEV_BYPASS_CREDENTIAL_ID.to_string(),
        credential_id: DEV_BYPASS_CREDENTIAL_ID.to_string(),
        expires_at: now + Duration::seconds(*SESSION_MAX_AGE),
        created_at: now,
        user_agent: None,
    }
}

/// Deletes expired rows at most once per cleanup interval across the process
async fn cleanup_expired_sessions_throttled() {
    let now = Utc::now();
    let last = LAST_CLEANUP.load(Ordering::Relaxed);
    if now.timestamp() - last < *SESSION_CLEANUP_INTERVAL {
        return;
    }
    if LAST_CLEANUP
        .compare_exchange(last, now.timestamp(), Ordering::AcqRel, Ordering::Relaxed)
        .is_err()
    {
        return;
    }

    match SessionStore::delete_expired_sessions(now).await {
        Ok(0) => {}
        Ok(n) => tracing::info!("Removed {} expired admin sessions", n),
        Err(e) => tracing::warn!("Expired session cleanup failed: {}", e),
    }
}
