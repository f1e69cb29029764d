use chrono::{DateTime, Utc};

use crate::storage::GENERIC_DATA_STORE;

use crate::session::errors::SessionError;
use crate::session::types::AdminSession;

use super::postgres::*;
use super::sqlite::*;

pub(crate) struct SessionStore;

impl SessionStore {
    pub(crate) async fn init() -> Result<(), SessionError> {
        let store = GENERIC_DATA_STORE.lock().await;

        match (store.as_sqlite(), store.as_postgres()) {
            (Some(pool), _) => {
                create_tables_sqlite(pool).await?;
                validate_session_tables_sqlite(pool).await?;
                Ok(())
            }
            (_, Some(pool)) => {
                create_tables_postgres(pool).await?;
                validate_session_tables_postgres(pool).await?;
                Ok(())
            }
            _ => Err(SessionError::Storage(
                "Unsupported database type".to_string(),
            )),
        }
    }

    pub(crate) async fn insert_session(session: &AdminSession) -> Result<(), SessionError> {
        let store = GENERIC_DATA_STORE.lock().await;

        if let Some(pool) = store.as_sqlite() {
            insert_session_sqlite(pool, session).await
        } else if let Some(pool) = store.as_postgres() {
            insert_session_postgres(pool, session).await
        } else {
            Err(SessionError::Storage("Unsupported database type".into()))
        }
    }

    pub(crate) async fn get_session(id: &str) -> Result<Option<AdminSession>, SessionError> {
        let store = GENERIC_DATA_STORE.lock().await;

        if let Some(pool) = store.as_sqlite() {
            get_session_sqlite(pool, id).await
        } else if let Some(pool) = store.as_postgres() {
            get_session_postgres(pool, id).await
        } else {
            Err(SessionError::Storage("Unsupported database type".into()))
        }
    }

    pub(crate) async fn delete_session(id: &str) -> Result<(), SessionError> {
        let store = GENERIC_DATA_STORE.lock().await;

        if let Some(pool) = store.as_sqlite() {
            delete_session_sqlite(pool, id).await
        } else if let Some(pool) = store.as_postgres() {
            delete_session_postgres(pool, id).await
        } else {
            Err(SessionError::Storage("Unsupported database type".into()))
        }
    }

    /// Removes every session opened with the given credential
    pub(crate) async fn delete_sessions_by_credential(
        credential_id: &str,
    ) -> Result<u64, SessionError> {
        let store = GENERIC_DATA_STORE.lock().await;

        if let Some(pool) = store.as_sqlite() {
            delete_sessions_by_credential_sqlite(pool, credential_id).await
        } else if let Some(pool) = store.as_postgres() {
            delete_sessions_by_credential_postgres(pool, credential_id).await
        } else {
            Err(SessionError::Storage("Unsupported database type".into()))
        }
    }

    pub(crate) async fn delete_expired_sessions(now: DateTime<Utc>) -> Result<u64, SessionError> {
        let store = GENERIC_DATA_STORE.lock().await;

        if let Some(pool) = store.as_sqlite() {
            delete_expired_sessions_sqlite(pool, now).await
        } else if let Some(pool) = store.as_postgres() {
            delete_expired_sessions_postgres(pool, now).await
        } else {
            Err(SessionError::Storage("Unsupported database type".into()))
        }
    }
}
