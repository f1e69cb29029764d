use thiserror::Error;

use crate::utils::UtilError;

/// Errors raised by the WebAuthn ceremonies and the credential store
#[derive(Debug, Error)]
pub enum PasskeyError {
    #[error("Invalid challenge: {0}")]
    Challenge(String),

    #[error("Invalid client data: {0}")]
    ClientData(String),

    #[error("Invalid authenticator data: {0}")]
    AuthenticatorData(String),

    /// Signature or counter check failed
    #[error("Verification error: {0}")]
    Verification(String),

    #[error("Invalid format: {0}")]
    Format(String),

    #[error("Not found error: {0}")]
    NotFound(String),

    /// Setup secret missing or wrong
    #[error("Unauthorized error: {0}")]
    Unauthorized(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Utils error: {0}")]
    Utils(#[from] UtilError),

    #[error("Serde error: {0}")]
    SerdeJson(#[from] serde_json::Error),
}
