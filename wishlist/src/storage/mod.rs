//! Shared row store and short-lived cache used by every domain store

mod cache_store;
mod config;
mod data_store;
mod errors;
mod schema_validation;
mod types;

pub(crate) use cache_store::GENERIC_CACHE_STORE;
pub(crate) use config::table_name;
pub(crate) use data_store::GENERIC_DATA_STORE;
pub(crate) use errors::StorageError;
pub(crate) use schema_validation::{validate_postgres_table_schema, validate_sqlite_table_schema};
pub(crate) use types::CacheKey;

/// Resolves both stores and checks that the cache backend answers
pub(crate) async fn init() -> Result<(), StorageError> {
    tracing::debug!(
        data_store = GENERIC_DATA_STORE.lock().await.kind(),
        "Data store selected"
    );
    GENERIC_CACHE_STORE.lock().await.ping().await
}
