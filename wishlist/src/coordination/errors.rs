//! Error type shared by every coordination entry point

use thiserror::Error;

use crate::catalog::CatalogError;
use crate::passkey::PasskeyError;
use crate::ratelimit::RateLimitDecision;
use crate::session::SessionError;
use crate::upload::UploadError;
use crate::utils::UtilError;
use crate::validation::ValidationIssue;

/// Message returned for every failed WebAuthn check
pub(super) const VERIFICATION_FAILED: &str = "Verification failed";

#[derive(Error, Debug)]
pub enum CoordinationError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    BadRequest(String),

    /// Request body failed schema validation
    #[error("Validation failed")]
    Validation(Vec<ValidationIssue>),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Too many requests")]
    RateLimited(RateLimitDecision),

    /// Detail is for logs only and is hidden from clients in production
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoordinationError {
    /// Log the error and return self
    pub fn log(self) -> Self {
        match &self {
            Self::NotFound(msg) => tracing::debug!("Not found: {}", msg),
            Self::BadRequest(msg) => tracing::debug!("Bad request: {}", msg),
            Self::Validation(issues) => tracing::debug!("Validation failed: {:?}", issues),
            Self::Conflict(msg) => tracing::debug!("Conflict: {}", msg),
            Self::Forbidden(msg) => tracing::warn!("Forbidden: {}", msg),
            Self::Unauthorized => tracing::warn!("Unauthorized access"),
            Self::RateLimited(decision) => tracing::warn!(
                "Rate limited, retry after {}s (limit {})",
                decision.retry_after,
                decision.limit
            ),
            Self::Internal(msg) => tracing::error!("Internal error: {}", msg),
        }
        self
    }
}

// Conversions below log the source error before it is reduced to a client-facing kind

impl From<CatalogError> for CoordinationError {
    fn from(err: CatalogError) -> Self {
        tracing::error!("Catalog error: {}", err);
        Self::Internal(err.to_string())
    }
}

impl From<PasskeyError> for CoordinationError {
    fn from(err: PasskeyError) -> Self {
        match err {
            PasskeyError::NotFound(msg) => {
                tracing::debug!("Passkey not found: {}", msg);
                Self::NotFound(msg)
            }
            PasskeyError::Unauthorized(msg) => {
                tracing::warn!("Passkey setup refused: {}", msg);
                Self::Forbidden(msg)
            }
            PasskeyError::Storage(msg) => {
                tracing::error!("Passkey storage error: {}", msg);
                Self::Internal(msg)
            }
            PasskeyError::Utils(err) => err.into(),
            other => {
                tracing::warn!("Passkey verification failed: {}", other);
                Self::BadRequest(VERIFICATION_FAILED.to_string())
            }
        }
    }
}

impl From<SessionError> for CoordinationError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::Unauthorized | SessionError::Expired => {
                tracing::debug!("Session rejected: {}", err);
                Self::Unauthorized
            }
            other => {
                tracing::error!("Session error: {}", other);
                Self::Internal(other.to_string())
            }
        }
    }
}

impl From<UploadError> for CoordinationError {
    fn from(err: UploadError) -> Self {
        match err {
            UploadError::Storage(msg) => {
                tracing::error!("Upload storage error: {}", msg);
                Self::Internal(msg)
            }
            other => {
                tracing::debug!("Upload rejected: {}", other);
                Self::BadRequest(other.to_string())
            }
        }
    }
}

impl From<UtilError> for CoordinationError {
    fn from(err: UtilError) -> Self {
        tracing::error!("Utils error: {}", err);
        Self::Internal(err.to_string())
    }
}

impl From<Vec<ValidationIssue>> for CoordinationError {
    fn from(issues: Vec<ValidationIssue>) -> Self {
        Self::Validation(issues)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_is_sync_and_send() {
        fn assert_sync_send<T: Sync + Send>() {}
        assert_sync_send::<CoordinationError>();
    }

    #[test]
    fn test_passkey_failures_collapse_to_generic_message() {
        for err in [
            PasskeyError::Challenge("expired".to_string()),
            PasskeyError::ClientData("origin mismatch".to_string()),
            PasskeyError::Verification("bad signature".to_string()),
            PasskeyError::Format("bad cbor".to_string()),
        ] {
            match CoordinationError::from(err) {
                CoordinationError::BadRequest(msg) => assert_eq!(msg, VERIFICATION_FAILED),
                other => panic!("unexpected {other:?}"),
            }
        }
    }

    #[test]
    fn test_passkey_not_found_and_setup_refusal() {
        let err: CoordinationError =
            PasskeyError::NotFound("No passkeys registered".to_string()).into();
        assert!(matches!(err, CoordinationError::NotFound(ref m) if m == "No passkeys registered"));

        let err: CoordinationError = PasskeyError::Unauthorized("bad token".to_string()).into();
        assert!(matches!(err, CoordinationError::Forbidden(_)));
    }

    #[test]
    fn test_session_errors() {
        assert!(matches!(
            CoordinationError::from(SessionError::Expired),
            CoordinationError::Unauthorized
        ));
        assert!(matches!(
            CoordinationError::from(SessionError::Storage("db down".to_string())),
            CoordinationError::Internal(_)
        ));
    }

    #[test]
    fn test_upload_errors() {
        assert!(matches!(
            CoordinationError::from(UploadError::UnsupportedType),
            CoordinationError::BadRequest(_)
        ));
        assert!(matches!(
            CoordinationError::from(UploadError::Storage("disk full".to_string())),
            CoordinationError::Internal(_)
        ));
    }
}
