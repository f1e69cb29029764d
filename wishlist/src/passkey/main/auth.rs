use chrono::Utc;
use ring::{digest, signature::UnparsedPublicKey};

use super::challenge::{issue_challenge, take_challenge};
use super::types::{
    AuthenticationOptions, AuthenticatorData, AuthenticatorResponse, CredentialDescriptor,
    ParsedClientData,
};

use crate::passkey::config::{PASSKEY_RP_ID, PASSKEY_TIMEOUT, PASSKEY_USER_VERIFICATION};
use crate::passkey::errors::PasskeyError;
use crate::passkey::storage::CredentialStore;
use crate::passkey::types::{AdminCredential, CeremonyKind};
use crate::utils::base64url_decode;

/// Issues authentication options listing every registered credential
pub async fn start_authentication() -> Result<(AuthenticationOptions, String), PasskeyError> {
    let credentials = CredentialStore::list_credentials().await?;
    if credentials.is_empty() {
        return Err(PasskeyError::NotFound("No passkeys registered".into()));
    }

    let (challenge_id, challenge) = issue_challenge(CeremonyKind::Authentication).await?;

    let options = AuthenticationOptions {
        challenge,
        timeout: (*PASSKEY_TIMEOUT) * 1000,
        rp_id: PASSKEY_RP_ID.to_string(),
        allow_credentials: credentials
            .into_iter()
            .map(|c| CredentialDescriptor {
                type_: "public-key".to_string(),
                id: c.id,
                transports: c.transports,
            })
            .collect(),
        user_verification: PASSKEY_USER_VERIFICATION.as_str().to_string(),
    };

    tracing::debug!("Auth options: {:?}", options);
    Ok((options, challenge_id))
}

/// Verifies an assertion and advances the credential's signature counter
pub async fn finish_authentication(
    challenge_id: &str,
    auth_response: AuthenticatorResponse,
) -> Result<AdminCredential, PasskeyError> {
    let stored = take_challenge(CeremonyKind::Authentication, challenge_id).await?;

    let client_data = ParsedClientData::from_base64(&auth_response.response.client_data_json)?;
    client_data.verify("webauthn.get", &stored.challenge)?;

    let auth_data = AuthenticatorData::from_base64(&auth_response.response.authenticator_data)?;
    auth_data.verify()?;

    let credential = CredentialStore::get_credential(&auth_response.id)
        .await?
        .ok_or_else(|| PasskeyError::Verification("Credential not found".into()))?;

    verify_signature(&auth_response, &client_data, &auth_data, &credential)?;
    check_counter(credential.counter, auth_data.counter)?;

    let used_at = Utc::now();
    CredentialStore::update_counter(&credential.id, auth_data.counter, used_at).await?;

    tracing::info!(credential_id = %credential.id, "Admin passkey authenticated");
    Ok(AdminCredential {
        counter: auth_data.counter,
        last_used_at: Some(used_at),
        ..credential
    })
}

/// The received counter must not go below the stored one.
///
/// Authenticators without a counter always report 0, which passes only
/// while the stored counter is 0 as well.
fn check_counter(stored: u32, received: u32) -> Result<(), PasskeyError> {
    if received < stored {
        tracing::warn!(
            "Counter verification failed - stored: {}, received: {}",
            stored,
            received
        );
        return Err(PasskeyError::Verification(
            "Signature counter went backwards".into(),
        ));
    }
    Ok(())
}

/// Verifies the ECDSA P-256 signature over `authenticatorData || SHA-256(clientDataJSON)`
fn verify_signature(
    auth_response: &AuthenticatorResponse,
    client_data: &ParsedClientData,
    auth_data: &AuthenticatorData,
    credential: &AdminCredential,
) -> Result<(), PasskeyError> {
    let public_key = base64url_decode(&credential.public_key)
        .map_err(|e| PasskeyError::Format(format!("Invalid public key: {e}")))?;
    let signature = base64url_decode(&auth_response.response.signature)
        .map_err(|e| PasskeyError::Format(format!("Invalid signature: {e}")))?;

    let client_data_hash = digest::digest(&digest::SHA256, &client_data.raw_data);
    let mut signed_data = Vec::with_capacity(auth_data.raw_data.len() + 32);
    signed_data.extend_from_slice(&auth_data.raw_data);
    signed_data.extend_from_slice(client_data_hash.as_ref());

    UnparsedPublicKey::new(&ring::signature::ECDSA_P256_SHA256_ASN1, &public_key)
        .verify(&signed_data, &signature)
        .map_err(|_| {
            tracing::warn!("Signature verification failed");
            PasskeyError::Verification("Signature verification failed".into())
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::passkey::main::test_utils::{FakeAuthenticator, register_fake_authenticator};
    use crate::test_utils::init_test_environment;

    #[test]
    fn test_check_counter() {
        assert!(check_counter(0, 0).is_ok());
        assert!(check_counter(0, 1).is_ok());
        assert!(check_counter(5, 5).is_ok());
        assert!(check_counter(5, 6).is_ok());
        assert!(check_counter(5, 4).is_err());
        // A counter-less authenticator cannot reset a counter that has advanced
        assert!(check_counter(5, 0).is_err());
    }

    #[tokio::test]
    async fn test_authentication_ceremony_updates_counter() {
        init_test_environment().await;
        let authenticator = register_fake_authenticator().await;

        let (options, challenge_id) = start_authentication().await.unwrap();
        assert!(
            options
                .allow_credentials
                .iter()
                .any(|c| c.id == authenticator.credential_id())
        );

        let response = authenticator.assertion_response(&options.challenge, 5);
        let response: AuthenticatorResponse = serde_json::from_value(response).unwrap();
        let credential = finish_authentication(&challenge_id, response).await.unwrap();
        assert_eq!(credential.counter, 5);
        assert!(credential.last_used_at.is_some());

        let stored = CredentialStore::get_credential(&authenticator.credential_id())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.counter, 5);
    }

    #[tokio::test]
    async fn test_replayed_counter_is_rejected() {
        init_test_environment().await;
        let authenticator = register_fake_authenticator().await;

        let (options, challenge_id) = start_authentication().await.unwrap();
        let response = authenticator.assertion_response(&options.challenge, 10);
        let response: AuthenticatorResponse = serde_json::from_value(response).unwrap();
        finish_authentication(&challenge_id, response).await.unwrap();

        let (options, challenge_id) = start_authentication().await.unwrap();
        let response = authenticator.assertion_response(&options.challenge, 9);
        let response: AuthenticatorResponse = serde_json::from_value(response).unwrap();
        let result = finish_authentication(&challenge_id, response).await;
        assert!(matches!(result, Err(PasskeyError::Verification(_))));

        let stored = CredentialStore::get_credential(&authenticator.credential_id())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.counter, 10);
    }

    #[tokio::test]
    async fn test_signature_from_other_key_is_rejected() {
        init_test_environment().await;
        let registered = register_fake_authenticator().await;
        let impostor = FakeAuthenticator::with_credential_id(registered.credential_id_bytes());

        let (options, challenge_id) = start_authentication().await.unwrap();
        let response = impostor.assertion_response(&options.challenge, 1);
        let response: AuthenticatorResponse = serde_json::from_value(response).unwrap();

        let result = finish_authentication(&challenge_id, response).await;
        assert!(matches!(result, Err(PasskeyError::Verification(_))));
    }

    #[tokio::test]
    async fn test_unknown_credential_is_rejected() {
        init_test_environment().await;
        let _registered = register_fake_authenticator().await;
        let stranger = FakeAuthenticator::new();

        let (options, challenge_id) = start_authentication().await.unwrap();
        let response = stranger.assertion_response(&options.challenge, 1);
        let response: AuthenticatorResponse = serde_json::from_value(response).unwrap();

        let result = finish_authentication(&challenge_id, response).await;
        assert!(matches!(result, Err(PasskeyError::Verification(_))));
    }
}
