mod config;
mod errors;
mod sniff;
mod store;

pub use config::{MAX_UPLOAD_BYTES, UPLOAD_DIR, UPLOAD_PUBLIC_BASE};
pub use errors::UploadError;
pub use sniff::{ImageKind, sniff_image};
pub use store::{LocalObjectStore, ObjectStore, StoredImage};

pub(crate) use store::store_image;
