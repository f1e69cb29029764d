use chrono::{DateTime, Utc};
use sqlx::{Pool, Sqlite};

use crate::passkey::errors::PasskeyError;
use crate::passkey::types::{AdminCredential, CredentialRow};
use crate::storage::validate_sqlite_table_schema;

use super::config::DB_TABLE_ADMIN_CREDENTIALS;

pub(super) async fn create_tables_sqlite(pool: &Pool<Sqlite>) -> Result<(), PasskeyError> {
    sqlx::query(&format!(
        r#"
        CREATE TABLE IF NOT EXISTS {} (
            id TEXT PRIMARY KEY NOT NULL,
            public_key TEXT NOT NULL,
            counter INTEGER NOT NULL DEFAULT 0,
            transports TEXT NOT NULL DEFAULT '',
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            last_used_at TIMESTAMP,
            device_name TEXT
        )
        "#,
        DB_TABLE_ADMIN_CREDENTIALS.as_str()
    ))
    .execute(pool)
    .await
    .map_err(|e| PasskeyError::Storage(e.to_string()))?;

    Ok(())
}

pub(super) async fn validate_credential_tables_sqlite(
    pool: &Pool<Sqlite>,
) -> Result<(), PasskeyError> {
    let expected_columns = [
        ("id", "TEXT"),
        ("public_key", "TEXT"),
        ("counter", "INTEGER"),
        ("transports", "TEXT"),
        ("created_at", "TIMESTAMP"),
        ("last_used_at", "TIMESTAMP"),
        ("device_name", "TEXT"),
    ];

    validate_sqlite_table_schema(
        pool,
        DB_TABLE_ADMIN_CREDENTIALS.as_str(),
        &expected_columns,
        PasskeyError::Storage,
    )
    .await
}

pub(super) async fn insert_credential_sqlite(
    pool: &Pool<Sqlite>,
    credential: &AdminCredential,
) -> Result<(), PasskeyError> {
    sqlx::query(&format!(
        r#"
        INSERT INTO {}
        (id, public_key, counter, transports, created_at, last_used_at, device_name)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
        DB_TABLE_ADMIN_CREDENTIALS.as_str()
    ))
    .bind(&credential.id)
    .bind(&credential.public_key)
    .bind(credential.counter as i64)
    .bind(credential.transports.join(","))
    .bind(credential.created_at)
    .bind(credential.last_used_at)
    .bind(&credential.device_name)
    .execute(pool)
    .await
    .map_err(|e| PasskeyError::Storage(e.to_string()))?;

    Ok(())
}

pub(super) async fn get_credential_sqlite(
    pool: &Pool<Sqlite>,
    id: &str,
) -> Result<Option<AdminCredential>, PasskeyError> {
    let row = sqlx::query_as::<_, CredentialRow>(&format!(
        "SELECT * FROM {} WHERE id = ?",
        DB_TABLE_ADMIN_CREDENTIALS.as_str()
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
    .map_err(|e| PasskeyError::Storage(e.to_string()))?;

    Ok(row.map(AdminCredential::from))
}

pub(super) async fn list_credentials_sqlite(
    pool: &Pool<Sqlite>,
) -> Result<Vec<AdminCredential>, PasskeyError> {
    let rows = sqlx::query_as::<_, CredentialRow>(&format!(
        "SELECT * FROM {} ORDER BY created_at ASC",
        DB_TABLE_ADMIN_CREDENTIALS.as_str()
    ))
    .fetch_all(pool)
    .await
    .map_err(|e| PasskeyError::Storage(e.to_string()))?;

    Ok(rows.into_iter().map(AdminCredential::from).collect())
}

pub(super) async fn count_credentials_sqlite(pool: &Pool<Sqlite>) -> Result<i64, PasskeyError> {
    sqlx::query_scalar(&format!(
        "SELECT COUNT(*) FROM {}",
        DB_TABLE_ADMIN_CREDENTIALS.as_str()
    ))
    .fetch_one(pool)
    .await
    .map_err(|e| PasskeyError::Storage(e.to_string()))
}

pub(super) async fn update_counter_sqlite(
    pool: &Pool<Sqlite>,
    id: &str,
    counter: u32,
    used_at: DateTime<Utc>,
) -> Result<(), PasskeyError> {
    sqlx::query(&format!(
        "UPDATE {} SET counter = ?, last_used_at = ? WHERE id = ?",
        DB_TABLE_ADMIN_CREDENTIALS.as_str()
    ))
    .bind(counter as i64)
    .bind(used_at)
    .bind(id)
    .execute(pool)
    .await
    .map_err(|e| PasskeyError::Storage(e.to_string()))?;

    Ok(())
}

pub(super) async fn delete_credential_sqlite(
    pool: &Pool<Sqlite>,
    id: &str,
) -> Result<bool, PasskeyError> {
    let result = sqlx::query(&format!(
        "DELETE FROM {} WHERE id = ?",
        DB_TABLE_ADMIN_CREDENTIALS.as_str()
    ))
    .bind(id)
    .execute(pool)
    .await
    .map_err(|e| PasskeyError::Storage(e.to_string()))?;

    Ok(result.rows_affected() > 0)
}
