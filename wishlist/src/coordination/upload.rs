use crate::upload::{StoredImage, store_image};

use super::errors::CoordinationError;

/// Stores an uploaded image after re-deriving its type from the bytes
#[tracing::instrument(skip(bytes), fields(size = bytes.len()))]
pub async fn upload_image(
    bytes: &[u8],
    declared_type: Option<&str>,
) -> Result<StoredImage, CoordinationError> {
    let stored = store_image(bytes).await?;
    if declared_type.is_some_and(|declared| declared != stored.content_type) {
        tracing::debug!(
            "Declared type {:?} replaced by detected {}",
            declared_type,
            stored.content_type
        );
    }
    tracing::info!(url = %stored.url, "Image uploaded");
    Ok(stored)
}
