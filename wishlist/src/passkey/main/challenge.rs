use std::time::Duration;

use chrono::Utc;

use crate::passkey::config::PASSKEY_CHALLENGE_TIMEOUT;
use crate::passkey::errors::PasskeyError;
use crate::passkey::types::{CeremonyKind, StoredChallenge};
use crate::storage::GENERIC_CACHE_STORE;
use crate::utils::gen_random_string;

/// Issues a challenge for `kind` and returns `(challenge_id, challenge)`.
///
/// The id travels in a cookie; the challenge goes to the browser.
pub(super) async fn issue_challenge(kind: CeremonyKind) -> Result<(String, String), PasskeyError> {
    let challenge = gen_random_string(32)?;
    let challenge_id = gen_random_string(16)?;

    let stored = StoredChallenge {
        challenge: challenge.clone(),
        kind,
        issued_at: Utc::now().timestamp(),
    };

    GENERIC_CACHE_STORE
        .lock()
        .await
        .put(
            kind.cache_key(&challenge_id),
            stored.to_payload()?,
            Duration::from_secs(u64::from(*PASSKEY_CHALLENGE_TIMEOUT)),
        )
        .await
        .map_err(|e| PasskeyError::Storage(e.to_string()))?;

    Ok((challenge_id, challenge))
}

/// Fetches and removes a challenge so that it can be used only once
pub(super) async fn take_challenge(
    kind: CeremonyKind,
    challenge_id: &str,
) -> Result<StoredChallenge, PasskeyError> {
    let payload = GENERIC_CACHE_STORE
        .lock()
        .await
        .take(kind.cache_key(challenge_id))
        .await
        .map_err(|e| PasskeyError::Storage(e.to_string()))?
        .ok_or_else(|| PasskeyError::Challenge("Challenge not found".into()))?;

    let stored = StoredChallenge::from_payload(&payload)?;
    if stored.kind != kind {
        return Err(PasskeyError::Challenge("Challenge kind mismatch".into()));
    }

    let age = Utc::now().timestamp() - stored.issued_at;
    if age > *PASSKEY_CHALLENGE_TIMEOUT as i64 {
        tracing::warn!("Challenge expired after {} seconds", age);
        return Err(PasskeyError::Challenge("Challenge has expired".into()));
    }

    Ok(stored)
}
