use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum RateLimitError {
    #[error("Rate limit store error: {0}")]
    Storage(String),
}

impl From<::redis::RedisError> for RateLimitError {
    fn from(err: ::redis::RedisError) -> Self {
        Self::Storage(err.to_string())
    }
}
