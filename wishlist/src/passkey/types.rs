use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::errors::PasskeyError;
use crate::storage::CacheKey;

/// A registered admin passkey
#[derive(Clone, Serialize, Debug, PartialEq)]
pub struct AdminCredential {
    /// WebAuthn credential id, base64url
    pub id: String,
    /// Uncompressed P-256 point, base64url
    #[serde(skip_serializing)]
    pub public_key: String,
    pub counter: u32,
    pub transports: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub last_used_at: Option<DateTime<Utc>>,
    pub device_name: Option<String>,
}

/// Row layout of the credentials table
#[derive(sqlx::FromRow)]
pub(super) struct CredentialRow {
    pub(super) id: String,
    pub(super) public_key: String,
    pub(super) counter: i64,
    pub(super) transports: String,
    pub(super) created_at: DateTime<Utc>,
    pub(super) last_used_at: Option<DateTime<Utc>>,
    pub(super) device_name: Option<String>,
}

impl From<CredentialRow> for AdminCredential {
    fn from(row: CredentialRow) -> Self {
        Self {
            id: row.id,
            public_key: row.public_key,
            counter: u32::try_from(row.counter).unwrap_or(u32::MAX),
            transports: row
                .transports
                .split(',')
                .filter(|t| !t.is_empty())
                .map(str::to_string)
                .collect(),
            created_at: row.created_at,
            last_used_at: row.last_used_at,
            device_name: row.device_name,
        }
    }
}

#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq)]
#[serde(rename_all = "lowercase")]
pub(super) enum CeremonyKind {
    Registration,
    Authentication,
}

impl CeremonyKind {
    /// Challenges of each ceremony live in their own cache namespace
    pub(super) fn cache_key(self, challenge_id: &str) -> CacheKey<'_> {
        let namespace = match self {
            CeremonyKind::Registration => "reg_challenge",
            CeremonyKind::Authentication => "auth_challenge",
        };
        CacheKey::new(namespace, challenge_id)
    }
}

/// Challenge kept server-side between the options and verify calls
#[derive(Clone, Serialize, Deserialize, Debug)]
pub(super) struct StoredChallenge {
    pub(super) challenge: String,
    pub(super) kind: CeremonyKind,
    /// Seconds since the Unix epoch
    pub(super) issued_at: i64,
}

impl StoredChallenge {
    pub(super) fn to_payload(&self) -> Result<String, PasskeyError> {
        serde_json::to_string(self).map_err(|e| PasskeyError::Storage(e.to_string()))
    }

    pub(super) fn from_payload(payload: &str) -> Result<Self, PasskeyError> {
        serde_json::from_str(payload).map_err(|e| PasskeyError::Storage(e.to_string()))
    }
}
