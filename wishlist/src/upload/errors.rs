use thiserror::Error;

use super::config::MAX_UPLOAD_BYTES;

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("No file provided")]
    Empty,

    #[error("File exceeds {} bytes", MAX_UPLOAD_BYTES)]
    TooLarge,

    #[error("Unsupported file type")]
    UnsupportedType,

    #[error("Object store error: {0}")]
    Storage(String),
}

impl From<std::io::Error> for UploadError {
    fn from(err: std::io::Error) -> Self {
        Self::Storage(err.to_string())
    }
}
