use std::path::PathBuf;
use std::sync::LazyLock;

/// Largest accepted image
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Directory the local object store writes into
pub static UPLOAD_DIR: LazyLock<PathBuf> = LazyLock::new(|| {
    std::env::var("UPLOAD_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("./uploads"))
});

/// URL prefix under which `UPLOAD_DIR` is served
pub static UPLOAD_PUBLIC_BASE: LazyLock<String> = LazyLock::new(|| {
    std::env::var("UPLOAD_PUBLIC_BASE")
        .map(|base| base.trim_end_matches('/').to_string())
        .unwrap_or_else(|_| "/uploads".to_string())
});
