use chrono::{DateTime, Utc};
use sqlx::{Pool, Postgres};

use crate::session::errors::SessionError;
use crate::session::types::AdminSession;
use crate::storage::validate_postgres_table_schema;

use super::config::DB_TABLE_ADMIN_SESSIONS;

pub(super) async fn create_tables_postgres(pool: &Pool<Postgres>) -> Result<(), SessionError> {
    let table = DB_TABLE_ADMIN_SESSIONS.as_str();

    sqlx::query(&format!(
        r#"
        CREATE TABLE IF NOT EXISTS {} (
            id TEXT PRIMARY KEY NOT NULL,
            credential_id TEXT NOT NULL,
            expires_at TIMESTAMPTZ NOT NULL,
            created_at TIMESTAMPTZ NOT NULL DEFAULT CURRENT_TIMESTAMP,
            user_agent TEXT
        )
        "#,
        table
    ))
    .execute(pool)
    .await
    .map_err(|e| SessionError::Storage(e.to_string()))?;

    sqlx::query(&format!(
        "CREATE INDEX IF NOT EXISTS idx_{}_expires_at ON {}(expires_at)",
        table.replace(".", "_"),
        table
    ))
    .execute(pool)
    .await
    .map_err(|e| SessionError::Storage(e.to_string()))?;

    Ok(())
}

pub(super) async fn validate_session_tables_postgres(
    pool: &Pool<Postgres>,
) -> Result<(), SessionError> {
    let expected_columns = [
        ("id", "text"),
        ("credential_id", "text"),
        ("expires_at", "timestamp with time zone"),
        ("created_at", "timestamp with time zone"),
        ("user_agent", "text"),
    ];

    validate_postgres_table_schema(
        pool,
        DB_TABLE_ADMIN_SESSIONS.as_str(),
        &expected_columns,
        SessionError::Storage,
    )
    .await
}

pub(super) async fn insert_session_postgres(
    pool: &Pool<Postgres>,
    session: &AdminSession,
) -> Result<(), SessionError> {
    sqlx::query(&format!(
        r#"
        INSERT INTO {} (id, credential_id, expires_at, created_at, user_agent)
        VALUES ($1, $2, $3, $4, $5)
        "#,
        DB_TABLE_ADMIN_SESSIONS.as_str()
    ))
    .bind(&session.id)
    .bind(&session.credential_id)
    .bind(session.expires_at)
    .bind(session.created_at)
    .bind(&session.user_agent)
    .execute(pool)
    .await
    .map_err(|e| SessionError::Storage(e.to_string()))?;

    Ok(())
}

pub(super) async fn get_session_postgres(
    pool: &Pool<Postgres>,
    id: &str,
) -> Result<Option<AdminSession>, SessionError> {
    sqlx::query_as::<_, AdminSession>(&format!(
        "SELECT id, credential_id, expires_at, created_at, user_agent FROM {} WHERE id = $1",
        DB_TABLE_ADMIN_SESSIONS.as_str()
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
    .map_err(|e| SessionError::Storage(e.to_string()))
}

pub(super) async fn delete_session_postgres(
    pool: &Pool<Postgres>,
    id: &str,
) -> Result<(), SessionError> {
    sqlx::query(&format!(
        "DELETE FROM {} WHERE id = $1",
        DB_TABLE_ADMIN_SESSIONS.as_str()
    ))
    .bind(id)
    .execute(pool)
    .await
    .map_err(|e| SessionError::Storage(e.to_string()))?;

    Ok(())
}

pub(super) async fn delete_sessions_by_credential_postgres(
    pool: &Pool<Postgres>,
    credential_id: &str,
) -> Result<u64, SessionError> {
    let result = sqlx::query(&format!(
        "DELETE FROM {} WHERE credential_id = $1",
        DB_TABLE_ADMIN_SESSIONS.as_str()
    ))
    .bind(credential_id)
    .execute(pool)
    .await
    .map_err(|e| SessionError::Storage(e.to_string()))?;

    Ok(result.rows_affected())
}

pub(super) async fn delete_expired_sessions_postgres(
    pool: &Pool<Postgres>,
    now: DateTime<Utc>,
) -> Result<u64, SessionError> {
    let result = sqlx::query(&format!(
        "DELETE FROM {} WHERE expires_at <= $1",
        DB_TABLE_ADMIN_SESSIONS.as_str()
    ))
    .bind(now)
    .execute(pool)
    .await
    .map_err(|e| SessionError::Storage(e.to_string()))?;

    Ok(result.rows_affected())
}
