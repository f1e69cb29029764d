//! Row store selection

use std::{env, str::FromStr, sync::LazyLock};

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool};
use tokio::sync::Mutex;

use super::types::DataStore;

/// Row store selected by `GENERIC_DATA_STORE_TYPE` and `GENERIC_DATA_STORE_URL`.
/// Pools connect lazily on first query.
pub(crate) static GENERIC_DATA_STORE: LazyLock<Mutex<DataStore>> = LazyLock::new(|| {
    let store_type = env::var("GENERIC_DATA_STORE_TYPE")
        .expect("GENERIC_DATA_STORE_TYPE must be set")
        .to_lowercase();
    let store_url =
        env::var("GENERIC_DATA_STORE_URL").expect("GENERIC_DATA_STORE_URL must be set");

    let store = match store_type.as_str() {
        "sqlite" => DataStore::Sqlite(SqlitePool::connect_lazy_with(
            sqlite_options(&store_url).expect("Invalid SQLite GENERIC_DATA_STORE_URL"),
        )),
        "postgres" => DataStore::Postgres(
            sqlx::PgPool::connect_lazy(&store_url)
                .expect("Invalid Postgres GENERIC_DATA_STORE_URL"),
        ),
        other => panic!("Unsupported data store type '{other}', expected 'sqlite' or 'postgres'"),
    };

    tracing::info!(store_type = %store_type, "Data store selected");
    Mutex::new(store)
});

/// SQLite options with the database file created on demand and foreign keys on
fn sqlite_options(url: &str) -> Result<SqliteConnectOptions, sqlx::Error> {
    Ok(SqliteConnectOptions::from_str(url)?
        .create_if_missing(true)
        .foreign_keys(true))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sqlite_urls_parse() {
        let path = env::temp_dir().join("wishlist_parse_check.db");
        assert!(sqlite_options(&format!("sqlite:{}", path.display())).is_ok());
        assert!(sqlite_options("sqlite::memory:").is_ok());
    }
}
