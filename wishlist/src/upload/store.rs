use std::path::PathBuf;
use std::sync::LazyLock;

use async_trait::async_trait;
use serde::Serialize;

use super::config::{MAX_UPLOAD_BYTES, UPLOAD_DIR, UPLOAD_PUBLIC_BASE};
use super::errors::UploadError;
use super::sniff::sniff_image;

/// Destination for uploaded images
#[async_trait]
pub trait ObjectStore: Send + Sync + 'static {
    /// Writes `bytes` under `key` and returns the public URL of the object
    async fn put(&self, key: &str, bytes: &[u8], content_type: &str) -> Result<String, UploadError>;
}

/// Writes objects below a directory served as static files
pub struct LocalObjectStore {
    root: PathBuf,
    public_base: String,
}

impl LocalObjectStore {
    pub fn new(root: impl Into<PathBuf>, public_base: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            public_base: public_base.into(),
        }
    }
}

#[async_trait]
impl ObjectStore for LocalObjectStore {
    async fn put(
        &self,
        key: &str,
        bytes: &[u8],
        content_type: &str,
    ) -> Result<String, UploadError> {
        if key.split('/').any(|part| part.is_empty() || part == "..") {
            return Err(UploadError::Storage(format!("Invalid object key: {key}")));
        }

        let path = self.root.join(key);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, bytes).await?;

        tracing::debug!(
            "Stored {} bytes ({}) at {}",
            bytes.len(),
            content_type,
            path.display()
        );
        Ok(format!("{}/{}", self.public_base, key))
    }
}

static OBJECT_STORE: LazyLock<Box<dyn ObjectStore>> = LazyLock::new(|| {
    Box::new(LocalObjectStore::new(
        UPLOAD_DIR.clone(),
        UPLOAD_PUBLIC_BASE.clone(),
    ))
});

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredImage {
    pub url: String,
    pub content_type: String,
    pub size: usize,
}

/// Checks size and signature, then stores the image under a random name
pub(crate) async fn store_image(bytes: &[u8]) -> Result<StoredImage, UploadError> {
    store_image_in(OBJECT_STORE.as_ref(), bytes).await
}

pub(crate) async fn store_image_in(
    store: &dyn ObjectStore,
    bytes: &[u8],
) -> Result<StoredImage, UploadError> {
    if bytes.is_empty() {
        return Err(UploadError::Empty);
    }
    if bytes.len() > MAX_UPLOAD_BYTES {
        return Err(UploadError::TooLarge);
    }
    let kind = sniff_image(bytes).ok_or(UploadError::UnsupportedType)?;

    let key = format!("wishlist/{}.{}", uuid::Uuid::new_v4(), kind.extension());
    let url = store.put(&key, bytes, kind.mime_type()).await?;

    Ok(StoredImage {
        url,
        content_type: kind.mime_type().to_string(),
        size: bytes.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store() -> (LocalObjectStore, PathBuf) {
        let root = std::env::temp_dir().join(format!("wishlist-upload-{}", uuid::Uuid::new_v4()));
        (LocalObjectStore::new(&root, "/uploads"), root)
    }

    #[tokio::test]
    async fn test_store_image_writes_file_and_returns_url() {
        let (store, root) = temp_store();
        let bytes = [0xFF, 0xD8, 0xFF, 0xE0, 0x01, 0x02];

        let stored = store_image_in(&store, &bytes).await.unwrap();
        assert_eq!(stored.content_type, "image/jpeg");
        assert_eq!(stored.size, bytes.len());
        assert!(stored.url.starts_with("/uploads/wishlist/"));
        assert!(stored.url.ends_with(".jpg"));

        let key = stored.url.trim_start_matches("/uploads/");
        let written = tokio::fs::read(root.join(key)).await.unwrap();
        assert_eq!(written, bytes);

        tokio::fs::remove_dir_all(root).await.ok();
    }

    #[tokio::test]
    async fn test_store_image_rejects_bad_input() {
        let (store, _root) = temp_store();

        assert!(matches!(
            store_image_in(&store, b"").await,
            Err(UploadError::Empty)
        ));
        assert!(matches!(
            store_image_in(&store, b"%PDF-1.7").await,
            Err(UploadError::UnsupportedType)
        ));

        let mut oversized = vec![0u8; MAX_UPLOAD_BYTES + 1];
        oversized[..3].copy_from_slice(&[0xFF, 0xD8, 0xFF]);
        assert!(matches!(
            store_image_in(&store, &oversized).await,
            Err(UploadError::TooLarge)
        ));
    }

    #[tokio::test]
    async fn test_local_store_refuses_path_traversal() {
        let (store, _root) = temp_store();
        let result = store.put("../escape.png", b"x", "image/png").await;
        assert!(matches!(result, Err(UploadError::Storage(_))));
    }
}
