//! Shared test initialization
//!
//! Every test that touches a store calls [`init_test_environment`] first. The
//! environment is configured once per test binary and all tests share one
//! SQLite file, so tests must create their own rows rather than assume an empty
//! database.

use std::sync::Once;

use tokio::sync::OnceCell;

pub(crate) const TEST_ORIGIN: &str = "http://localhost:3001";
pub(crate) const TEST_SETUP_TOKEN: &str = "test-setup-token";

/// Configures the process environment and creates every table
pub async fn init_test_environment() {
    static ENV_INIT: Once = Once::new();
    ENV_INIT.call_once(|| {
        if dotenvy::from_filename(".env_test").is_err() {
            set_default_test_env();
        }

        if let Some(db_path) = std::env::var("GENERIC_DATA_STORE_URL")
            .ok()
            .and_then(|url| extract_sqlite_file_path_from_url(&url))
        {
            // Leftovers from an earlier run
            let _ = std::fs::remove_file(&db_path);
        }
    });

    static STORES: OnceCell<()> = OnceCell::const_new();
    STORES.get_or_init(init_stores).await;
}

fn set_default_test_env() {
    let db_path = std::env::temp_dir().join(format!("wishlist_test_{}.db", std::process::id()));
    let upload_dir = std::env::temp_dir().join(format!("wishlist_uploads_{}", std::process::id()));

    let defaults = [
        ("GENERIC_DATA_STORE_TYPE", "sqlite".to_string()),
        (
            "GENERIC_DATA_STORE_URL",
            format!("sqlite:{}", db_path.display()),
        ),
        ("GENERIC_CACHE_STORE_TYPE", "memory".to_string()),
        ("GENERIC_CACHE_STORE_URL", "memory".to_string()),
        ("ORIGIN", TEST_ORIGIN.to_string()),
        ("ADMIN_SETUP_TOKEN", TEST_SETUP_TOKEN.to_string()),
        ("SESSION_SECRET", "test-session-secret".to_string()),
        ("UPLOAD_DIR", upload_dir.display().to_string()),
    ];

    for (key, value) in defaults {
        if std::env::var(key).is_err() {
            // Runs inside `Once` before any store reads the environment
            unsafe {
                std::env::set_var(key, value);
            }
        }
    }
}

async fn init_stores() {
    if let Err(e) = crate::storage::init().await {
        eprintln!("Warning: Failed to initialize storage: {e}");
    }
    if let Err(e) = crate::session::init().await {
        eprintln!("Warning: Failed to initialize SessionStore: {e}");
    }
    if let Err(e) = crate::passkey::init().await {
        eprintln!("Warning: Failed to initialize CredentialStore: {e}");
    }
    if let Err(e) = crate::catalog::init().await {
        eprintln!("Warning: Failed to initialize CatalogStore: {e}");
    }
    crate::ratelimit::init();
}

/// Extracts the file path from a SQLite database URL
///
/// Returns None for non-SQLite URLs and in-memory databases.
fn extract_sqlite_file_path_from_url(url: &str) -> Option<String> {
    let path = url.strip_prefix("sqlite:")?;
    let path = match path.strip_prefix("file:") {
        Some(file_path) => file_path.split('?').next()?,
        None => path.strip_prefix("//").unwrap_or(path),
    };
    if path.is_empty() || path.contains(":memory:") {
        return None;
    }
    Some(path.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_sqlite_file_path_from_url() {
        assert_eq!(
            extract_sqlite_file_path_from_url("sqlite:/tmp/test.db"),
            Some("/tmp/test.db".to_string())
        );
        assert_eq!(
            extract_sqlite_file_path_from_url("sqlite:./test.db"),
            Some("./test.db".to_string())
        );
        assert_eq!(
            extract_sqlite_file_path_from_url("sqlite:file:/tmp/test.db?mode=rwc"),
            Some("/tmp/test.db".to_string())
        );
        assert_eq!(
            extract_sqlite_file_path_from_url("sqlite:///tmp/test.db"),
            Some("/tmp/test.db".to_string())
        );
        assert_eq!(extract_sqlite_file_path_from_url("sqlite::memory:"), None);
        assert_eq!(
            extract_sqlite_file_path_from_url("sqlite:file::memory:?cache=shared"),
            None
        );
        assert_eq!(
            extract_sqlite_file_path_from_url("postgresql://localhost/test"),
            None
        );
        assert_eq!(extract_sqlite_file_path_from_url(""), None);
    }
}
