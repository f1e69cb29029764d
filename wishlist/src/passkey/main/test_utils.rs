//! Software authenticator producing WebAuthn responses for tests

use ciborium::value::{Integer, Value as CborValue};
use ring::digest;
use ring::rand::{SecureRandom, SystemRandom};
use ring::signature::{ECDSA_P256_SHA256_ASN1_SIGNING, EcdsaKeyPair, KeyPair};
use serde_json::{Value, json};

use super::register::{finish_registration, start_registration};
use super::types::auth_data_flags;
use crate::passkey::config::{ORIGIN, PASSKEY_RP_ID};
use crate::utils::base64url_encode;

pub(crate) struct FakeAuthenticator {
    key_pair: EcdsaKeyPair,
    rng: SystemRandom,
    credential_id: Vec<u8>,
}

impl FakeAuthenticator {
    pub(crate) fn new() -> Self {
        let rng = SystemRandom::new();
        let mut credential_id = vec![0u8; 16];
        rng.fill(&mut credential_id).unwrap();
        Self::with_credential_id(credential_id)
    }

    /// A fresh key pair answering for an existing credential id
    pub(crate) fn with_credential_id(credential_id: Vec<u8>) -> Self {
        let rng = SystemRandom::new();
        let pkcs8 = EcdsaKeyPair::generate_pkcs8(&ECDSA_P256_SHA256_ASN1_SIGNING, &rng).unwrap();
        let key_pair =
            EcdsaKeyPair::from_pkcs8(&ECDSA_P256_SHA256_ASN1_SIGNING, pkcs8.as_ref(), &rng)
                .unwrap();
        Self {
            key_pair,
            rng,
            credential_id,
        }
    }

    pub(crate) fn credential_id(&self) -> String {
        base64url_encode(&self.credential_id)
    }

    pub(crate) fn credential_id_bytes(&self) -> Vec<u8> {
        self.credential_id.clone()
    }

    /// Uncompressed SEC1 point
    pub(crate) fn public_key(&self) -> Vec<u8> {
        self.key_pair.public_key().as_ref().to_vec()
    }

    pub(crate) fn client_data(&self, type_: &str, challenge: &str) -> String {
        let json = json!({
            "type": type_,
            "challenge": challenge,
            "origin": ORIGIN.as_str(),
            "crossOrigin": false
        });
        base64url_encode(json.to_string().as_bytes())
    }

    fn auth_data_prefix(flags: u8, counter: u32) -> Vec<u8> {
        let mut data = digest::digest(&digest::SHA256, PASSKEY_RP_ID.as_bytes())
            .as_ref()
            .to_vec();
        data.push(flags);
        data.extend_from_slice(&counter.to_be_bytes());
        data
    }

    fn cose_key(&self) -> Vec<u8> {
        let point = self.public_key();
        let key = CborValue::Map(vec![
            (int(1), int(2)),
            (int(3), int(-7)),
            (int(-1), int(1)),
            (int(-2), CborValue::Bytes(point[1..33].to_vec())),
            (int(-3), CborValue::Bytes(point[33..65].to_vec())),
        ]);
        let mut bytes = Vec::new();
        ciborium::ser::into_writer(&key, &mut bytes).unwrap();
        bytes
    }

    /// Browser JSON for `navigator.credentials.create()` with "none" attestation
    pub(crate) fn registration_response(&self, challenge: &str) -> Value {
        let mut auth_data =
            Self::auth_data_prefix(auth_data_flags::UP | auth_data_flags::AT, 0);
        auth_data.extend_from_slice(&[0u8; 16]);
        auth_data.extend_from_slice(&(self.credential_id.len() as u16).to_be_bytes());
        auth_data.extend_from_slice(&self.credential_id);
        auth_data.extend_from_slice(&self.cose_key());

        let attestation = CborValue::Map(vec![
            (
                CborValue::Text("fmt".to_string()),
                CborValue::Text("none".to_string()),
            ),
            (CborValue::Text("attStmt".to_string()), CborValue::Map(vec![])),
            (
                CborValue::Text("authData".to_string()),
                CborValue::Bytes(auth_data),
            ),
        ]);
        let mut attestation_bytes = Vec::new();
        ciborium::ser::into_writer(&attestation, &mut attestation_bytes).unwrap();

        json!({
            "id": self.credential_id(),
            "rawId": self.credential_id(),
            "type": "public-key",
            "response": {
                "clientDataJSON": self.client_data("webauthn.create", challenge),
                "attestationObject": base64url_encode(&attestation_bytes),
                "transports": ["internal"]
            },
            "deviceName": "Test authenticator"
        })
    }

    /// Browser JSON for `navigator.credentials.get()`
    pub(crate) fn assertion_response(&self, challenge: &str, counter: u32) -> Value {
        let auth_data = Self::auth_data_prefix(auth_data_flags::UP, counter);
        let client_data = self.client_data("webauthn.get", challenge);
        let client_data_raw = crate::utils::base64url_decode(&client_data).unwrap();

        let mut signed = auth_data.clone();
        signed.extend_from_slice(digest::digest(&digest::SHA256, &client_data_raw).as_ref());
        let signature = self.key_pair.sign(&self.rng, &signed).unwrap();

        json!({
            "id": self.credential_id(),
            "rawId": self.credential_id(),
            "type": "public-key",
            "response": {
                "clientDataJSON": client_data,
                "authenticatorData": base64url_encode(&auth_data),
                "signature": base64url_encode(signature.as_ref()),
                "userHandle": null
            }
        })
    }
}

fn int(v: i64) -> CborValue {
    CborValue::Integer(Integer::from(v))
}

/// Registers a new software authenticator through the full ceremony
pub(crate) async fn register_fake_authenticator() -> FakeAuthenticator {
    let authenticator = FakeAuthenticator::new();
    let (options, challenge_id) = start_registration().await.unwrap();
    let response = authenticator.registration_response(&options.challenge);
    finish_registration(&challenge_id, serde_json::from_value(response).unwrap())
        .await
        .unwrap();
    authenticator
}
