use chrono::Utc;
use ciborium::value::Value as CborValue;

use super::challenge::{issue_challenge, take_challenge};
use super::types::{
    AuthenticatorData, AuthenticatorSelection, CredentialDescriptor, DEVICE_NAME_MAX,
    ParsedClientData, PubKeyCredParam, RegisterCredential, RegistrationOptions, RelyingParty,
    UserEntity,
};

use crate::passkey::config::{
    ADMIN_SETUP_TOKEN, PASSKEY_RP_ID, PASSKEY_RP_NAME, PASSKEY_TIMEOUT, PASSKEY_USER_VERIFICATION,
};
use crate::passkey::errors::PasskeyError;
use crate::passkey::storage::CredentialStore;
use crate::passkey::types::{AdminCredential, CeremonyKind};
use crate::utils::{base64url_decode, base64url_encode, constant_time_eq};

/// COSE algorithm id of ES256
const COSE_ALG_ES256: i32 = -7;

/// Whether `provided` matches the configured setup secret
pub fn verify_setup_token(provided: &str) -> bool {
    match ADMIN_SETUP_TOKEN.as_deref() {
        Some(expected) => constant_time_eq(provided.as_bytes(), expected.as_bytes()),
        None => false,
    }
}

/// Issues registration options and returns them with the challenge id
pub async fn start_registration() -> Result<(RegistrationOptions, String), PasskeyError> {
    let (challenge_id, challenge) = issue_challenge(CeremonyKind::Registration).await?;

    let exclude_credentials = CredentialStore::list_credentials()
        .await?
        .into_iter()
        .map(|c| CredentialDescriptor {
            type_: "public-key".to_string(),
            id: c.id,
            transports: c.transports,
        })
        .collect();

    let options = RegistrationOptions {
        challenge,
        rp: RelyingParty {
            name: PASSKEY_RP_NAME.to_string(),
            id: PASSKEY_RP_ID.to_string(),
        },
        user: UserEntity {
            id: base64url_encode(b"wishlist-admin"),
            name: "admin".to_string(),
            display_name: "Wishlist admin".to_string(),
        },
        pub_key_cred_params: vec![PubKeyCredParam {
            type_: "public-key".to_string(),
            alg: COSE_ALG_ES256,
        }],
        timeout: (*PASSKEY_TIMEOUT) * 1000,
        attestation: "none".to_string(),
        authenticator_selection: AuthenticatorSelection {
            resident_key: "preferred".to_string(),
            user_verification: PASSKEY_USER_VERIFICATION.as_str().to_string(),
        },
        exclude_credentials,
    };

    tracing::debug!("Registration options: {:?}", options);
    Ok((options, challenge_id))
}

/// Verifies an attestation against the challenge named by `challenge_id` and
/// stores the new credential.
pub async fn finish_registration(
    challenge_id: &str,
    credential: RegisterCredential,
) -> Result<AdminCredential, PasskeyError> {
    let stored = take_challenge(CeremonyKind::Registration, challenge_id).await?;

    let client_data = ParsedClientData::from_base64(&credential.response.client_data_json)?;
    client_data.verify("webauthn.create", &stored.challenge)?;

    let auth_data_bytes = parse_attestation_auth_data(&credential.response.attestation_object)?;
    let auth_data = AuthenticatorData::from_bytes(auth_data_bytes)?;
    auth_data.verify()?;

    if !auth_data.has_attested_credential_data() {
        return Err(PasskeyError::AuthenticatorData(
            "No attested credential data present".into(),
        ));
    }

    let (credential_id, cose_key) = parse_attested_credential(&auth_data.raw_data)?;
    let credential_id = base64url_encode(credential_id);
    if credential_id != credential.id {
        return Err(PasskeyError::Format(
            "Credential id does not match authenticator data".into(),
        ));
    }

    if CredentialStore::get_credential(&credential_id).await?.is_some() {
        return Err(PasskeyError::Verification(
            "Credential already registered".into(),
        ));
    }

    let public_key = extract_ec2_public_key(cose_key)?;

    let admin_credential = AdminCredential {
        id: credential_id,
        public_key: base64url_encode(&public_key),
        counter: auth_data.counter,
        transports: credential
            .response
            .transports
            .into_iter()
            .filter(|t| !t.is_empty() && !t.contains(','))
            .collect(),
        created_at: Utc::now(),
        last_used_at: None,
        device_name: credential
            .device_name
            .map(|name| name.trim().chars().take(DEVICE_NAME_MAX).collect::<String>())
            .filter(|name| !name.is_empty()),
    };

    CredentialStore::insert_credential(&admin_credential).await?;

    tracing::info!(credential_id = %admin_credential.id, "Admin passkey registered");
    Ok(admin_credential)
}

/// Returns the `authData` bytes of a CBOR attestation object
fn parse_attestation_auth_data(attestation_base64: &str) -> Result<Vec<u8>, PasskeyError> {
    let attestation_bytes = base64url_decode(attestation_base64)
        .map_err(|e| PasskeyError::Format(format!("Failed to decode attestation object: {e}")))?;

    let attestation_cbor: CborValue = ciborium::de::from_reader(&attestation_bytes[..])
        .map_err(|e| PasskeyError::Format(format!("Invalid CBOR data: {e}")))?;

    let CborValue::Map(map) = attestation_cbor else {
        return Err(PasskeyError::Format("Invalid attestation format".into()));
    };

    let mut fmt = None;
    let mut auth_data = None;
    for (key, value) in map {
        match (key, value) {
            (CborValue::Text(k), CborValue::Text(f)) if k == "fmt" => fmt = Some(f),
            (CborValue::Text(k), CborValue::Bytes(d)) if k == "authData" => auth_data = Some(d),
            _ => {}
        }
    }

    // Attestation statements are not verified; only the credential data is used
    tracing::debug!("Attestation format: {:?}", fmt);

    auth_data.ok_or_else(|| PasskeyError::Format("Missing authData".into()))
}

/// Splits attested credential data into the credential id and the COSE key bytes
fn parse_attested_credential(auth_data: &[u8]) -> Result<(&[u8], &[u8]), PasskeyError> {
    // rpIdHash (32) + flags (1) + counter (4) + AAGUID (16)
    let mut pos = 37 + 16;

    if auth_data.len() < pos + 2 {
        return Err(PasskeyError::Format("Authenticator data too short".into()));
    }

    let cred_id_len = u16::from_be_bytes([auth_data[pos], auth_data[pos + 1]]) as usize;
    pos += 2;

    if cred_id_len == 0 || cred_id_len > 1023 {
        return Err(PasskeyError::Format("Invalid credential ID length".into()));
    }
    if auth_data.len() < pos + cred_id_len {
        return Err(PasskeyError::Format(
            "Authenticator data too short for credential ID".into(),
        ));
    }

    let credential_id = &auth_data[pos..pos + cred_id_len];
    Ok((credential_id, &auth_data[pos + cred_id_len..]))
}

/// Reads an EC2 P-256 COSE key and returns the uncompressed SEC1 point
fn extract_ec2_public_key(cose_key: &[u8]) -> Result<Vec<u8>, PasskeyError> {
    let value: CborValue = ciborium::de::from_reader(cose_key)
        .map_err(|e| PasskeyError::Format(format!("Invalid public key CBOR: {e}")))?;

    let CborValue::Map(map) = value else {
        return Err(PasskeyError::Format("Invalid public key format".into()));
    };

    let mut kty = None;
    let mut alg = None;
    let mut crv = None;
    let mut x = None;
    let mut y = None;

    for (key, value) in map {
        let CborValue::Integer(label) = key else {
            continue;
        };
        match (i128::from(label), value) {
            (1, CborValue::Integer(v)) => kty = Some(i128::from(v)),
            (3, CborValue::Integer(v)) => alg = Some(i128::from(v)),
            (-1, CborValue::Integer(v)) => crv = Some(i128::from(v)),
            (-2, CborValue::Bytes(v)) => x = Some(v),
            (-3, CborValue::Bytes(v)) => y = Some(v),
            _ => {}
        }
    }

    // kty EC2 = 2, crv P-256 = 1
    if kty != Some(2) || crv != Some(1) {
        return Err(PasskeyError::Format("Unsupported key type".into()));
    }
    if alg.is_some_and(|a| a != i128::from(COSE_ALG_ES256)) {
        return Err(PasskeyError::Format("Unsupported key algorithm".into()));
    }

    match (x, y) {
        (Some(x), Some(y)) if x.len() == 32 && y.len() == 32 => {
            let mut point = Vec::with_capacity(65);
            point.push(0x04);
            point.extend_from_slice(&x);
            point.extend_from_slice(&y);
            Ok(point)
        }
        _ => Err(PasskeyError::Format(
            "Missing or invalid key coordinates".into(),
        )),
    }
}
