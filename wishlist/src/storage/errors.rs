use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub(crate) enum StorageError {
    /// The backing service could not be reached or refused the command
    #[error("Cache backend error: {0}")]
    Backend(String),
}

impl From<redis::RedisError> for StorageError {
    fn from(err: redis::RedisError) -> Self {
        Self::Backend(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redis_errors_become_backend_errors() {
        let redis_error =
            redis::RedisError::from((redis::ErrorKind::IoError, "Connection refused"));

        let StorageError::Backend(msg) = StorageError::from(redis_error);
        assert!(msg.contains("Connection refused"));
    }
}
