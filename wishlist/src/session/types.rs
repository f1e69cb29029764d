use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Server-side admin session row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct AdminSession {
    pub id: String,
    pub credential_id: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub user_agent: Option<String>,
}

impl AdminSession {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_is_expired_at_boundary() {
        let now = Utc::now();
        let session = AdminSession {
            id: "s".to_string(),
            credential_id: "c".to_string(),
            expires_at: now,
            created_at: now - Duration::days(7),
            user_agent: None,
        };
        assert!(session.is_expired_at(now));
        assert!(!session.is_expired_at(now - Duration::seconds(1)));
    }
}
