use chrono::{DateTime, Utc};

use crate::storage::GENERIC_DATA_STORE;

use crate::passkey::errors::PasskeyError;
use crate::passkey::types::AdminCredential;

use super::postgres::*;
use super::sqlite::*;

pub(crate) struct CredentialStore;

impl CredentialStore {
    pub(crate) async fn init() -> Result<(), PasskeyError> {
        let store = GENERIC_DATA_STORE.lock().await;

        match (store.as_sqlite(), store.as_postgres()) {
            (Some(pool), _) => {
                create_tables_sqlite(pool).await?;
                validate_credential_tables_sqlite(pool).await?;
                Ok(())
            }
            (_, Some(pool)) => {
                create_tables_postgres(pool).await?;
                validate_credential_tables_postgres(pool).await?;
                Ok(())
            }
            _ => Err(PasskeyError::Storage(
                "Unsupported database type".to_string(),
            )),
        }
    }

    pub(crate) async fn insert_credential(
        credential: &AdminCredential,
    ) -> Result<(), PasskeyError> {
        let store = GENERIC_DATA_STORE.lock().await;

        if let Some(pool) = store.as_sqlite() {
            insert_credential_sqlite(pool, credential).await
        } else if let Some(pool) = store.as_postgres() {
            insert_credential_postgres(pool, credential).await
        } else {
            Err(PasskeyError::Storage("Unsupported database type".into()))
        }
    }

    pub(crate) async fn get_credential(id: &str) -> Result<Option<AdminCredential>, PasskeyError> {
        let store = GENERIC_DATA_STORE.lock().await;

        if let Some(pool) = store.as_sqlite() {
            get_credential_sqlite(pool, id).await
        } else if let Some(pool) = store.as_postgres() {
            get_credential_postgres(pool, id).await
        } else {
            Err(PasskeyError::Storage("Unsupported database type".into()))
        }
    }

    pub(crate) async fn list_credentials() -> Result<Vec<AdminCredential>, PasskeyError> {
        let store = GENERIC_DATA_STORE.lock().await;

        if let Some(pool) = store.as_sqlite() {
            list_credentials_sqlite(pool).await
        } else if let Some(pool) = store.as_postgres() {
            list_credentials_postgres(pool).await
        } else {
            Err(PasskeyError::Storage("Unsupported database type".into()))
        }
    }

    pub(crate) async fn count_credentials() -> Result<i64, PasskeyError> {
        let store = GENERIC_DATA_STORE.lock().await;

        if let Some(pool) = store.as_sqlite() {
            count_credentials_sqlite(pool).await
        } else if let Some(pool) = store.as_postgres() {
            count_credentials_postgres(pool).await
        } else {
            Err(PasskeyError::Storage("Unsupported database type".into()))
        }
    }

    /// Stores the new signature counter and marks the credential as used
    pub(crate) async fn update_counter(
        id: &str,
        counter: u32,
        used_at: DateTime<Utc>,
    ) -> Result<(), PasskeyError> {
        let store = GENERIC_DATA_STORE.lock().await;

        if let Some(pool) = store.as_sqlite() {
            update_counter_sqlite(pool, id, counter, used_at).await
        } else if let Some(pool) = store.as_postgres() {
            update_counter_postgres(pool, id, counter, used_at).await
        } else {
            Err(PasskeyError::Storage("Unsupported database type".into()))
        }
    }

    /// Returns whether a row was deleted
    pub(crate) async fn delete_credential(id: &str) -> Result<bool, PasskeyError> {
        let store = GENERIC_DATA_STORE.lock().await;

        if let Some(pool) = store.as_sqlite() {
            delete_credential_sqlite(pool, id).await
        } else if let Some(pool) = store.as_postgres() {
            delete_credential_postgres(pool, id).await
        } else {
            Err(PasskeyError::Storage("Unsupported database type".into()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::init_test_environment;
    use crate::utils::gen_random_string;

    fn credential(id: &str) -> AdminCredential {
        AdminCredential {
            id: id.to_string(),
            public_key: "BPublicKey".to_string(),
            counter: 3,
            transports: vec!["internal".to_string(), "hybrid".to_string()],
            created_at: Utc::now(),
            last_used_at: None,
            device_name: Some("Test laptop".to_string()),
        }
    }

    #[tokio::test]
    async fn test_insert_and_get_credential() {
        init_test_environment().await;
        let id = gen_random_string(16).unwrap();

        CredentialStore::insert_credential(&credential(&id))
            .await
            .unwrap();

        let stored = CredentialStore::get_credential(&id).await.unwrap().unwrap();
        assert_eq!(stored.counter, 3);
        assert_eq!(stored.transports, vec!["internal", "hybrid"]);
        assert_eq!(stored.device_name.as_deref(), Some("Test laptop"));
        assert!(stored.last_used_at.is_none());

        let all = CredentialStore::list_credentials().await.unwrap();
        assert!(all.iter().any(|c| c.id == id));
        assert!(CredentialStore::count_credentials().await.unwrap() >= 1);
    }

    #[tokio::test]
    async fn test_update_counter_sets_last_used() {
        init_test_environment().await;
        let id = gen_random_string(16).unwrap();
        CredentialStore::insert_credential(&credential(&id))
            .await
            .unwrap();

        let used_at = Utc::now();
        CredentialStore::update_counter(&id, 9, used_at).await.unwrap();

        let stored = CredentialStore::get_credential(&id).await.unwrap().unwrap();
        assert_eq!(stored.counter, 9);
        assert!(stored.last_used_at.is_some());
    }

    #[tokio::test]
    async fn test_delete_credential() {
        init_test_environment().await;
        let id = gen_random_string(16).unwrap();
        CredentialStore::insert_credential(&credential(&id))
            .await
            .unwrap();

        assert!(CredentialStore::delete_credential(&id).await.unwrap());
        assert!(!CredentialStore::delete_credential(&id).await.unwrap());
        assert!(CredentialStore::get_credential(&id).await.unwrap().is_none());
    }
}
