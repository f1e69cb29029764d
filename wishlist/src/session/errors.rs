use thiserror::Error;

use crate::utils::UtilError;

#[derive(Debug, Error, Clone)]
pub enum SessionError {
    /// Missing, malformed, tampered or unknown session
    #[error("Unauthorized")]
    Unauthorized,

    #[error("Session expired")]
    Expired,

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Header error: {0}")]
    Header(String),

    /// Error from utils operations
    #[error("Utils error: {0}")]
    Utils(#[from] UtilError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unauthorized_message_is_generic() {
        assert_eq!(SessionError::Unauthorized.to_string(), "Unauthorized");
    }

    #[test]
    fn test_from_util_error() {
        let err: SessionError = UtilError::Cookie("bad".to_string()).into();
        assert!(matches!(err, SessionError::Utils(UtilError::Cookie(_))));
    }
}
