use ring::digest;
use serde::{Deserialize, Serialize};

use crate::passkey::config::{ORIGIN, PASSKEY_RP_ID, PASSKEY_USER_VERIFICATION, UserVerification};
use crate::passkey::errors::PasskeyError;
use crate::utils::base64url_decode;
use crate::validation::{Validate, ValidationIssue};

/// Options for `navigator.credentials.create()`
#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationOptions {
    pub(super) challenge: String,
    pub(super) rp: RelyingParty,
    pub(super) user: UserEntity,
    pub(super) pub_key_cred_params: Vec<PubKeyCredParam>,
    pub(super) timeout: u32,
    pub(super) attestation: String,
    pub(super) authenticator_selection: AuthenticatorSelection,
    pub(super) exclude_credentials: Vec<CredentialDescriptor>,
}

#[derive(Serialize, Debug)]
pub(super) struct RelyingParty {
    pub(super) name: String,
    pub(super) id: String,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub(super) struct UserEntity {
    pub(super) id: String,
    pub(super) name: String,
    pub(super) display_name: String,
}

#[derive(Serialize, Debug)]
pub(super) struct PubKeyCredParam {
    #[serde(rename = "type")]
    pub(super) type_: String,
    pub(super) alg: i32,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub(super) struct AuthenticatorSelection {
    pub(super) resident_key: String,
    pub(super) user_verification: String,
}

#[derive(Serialize, Debug)]
pub(super) struct CredentialDescriptor {
    #[serde(rename = "type")]
    pub(super) type_: String,
    pub(super) id: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub(super) transports: Vec<String>,
}

/// Options for `navigator.credentials.get()`
#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticationOptions {
    pub(super) challenge: String,
    pub(super) timeout: u32,
    pub(super) rp_id: String,
    pub(super) allow_credentials: Vec<CredentialDescriptor>,
    pub(super) user_verification: String,
}

#[cfg(test)]
impl RegistrationOptions {
    pub(crate) fn challenge(&self) -> &str {
        &self.challenge
    }
}

#[cfg(test)]
impl AuthenticationOptions {
    pub(crate) fn challenge(&self) -> &str {
        &self.challenge
    }
}

/// Browser output of a registration ceremony
#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct RegisterCredential {
    pub(super) id: String,
    pub(super) response: AttestationResponse,
    /// Label chosen by the admin for this authenticator
    #[serde(default)]
    pub(super) device_name: Option<String>,
}

/// Longest accepted authenticator label
pub(super) const DEVICE_NAME_MAX: usize = 64;

impl Validate for RegisterCredential {
    type Output = Self;

    fn validate(self) -> Result<Self, Vec<ValidationIssue>> {
        let mut issues = Vec::new();
        if self.id.is_empty() {
            issues.push(ValidationIssue::new("id", "Required"));
        }
        if self
            .device_name
            .as_ref()
            .is_some_and(|name| name.chars().count() > DEVICE_NAME_MAX)
        {
            issues.push(ValidationIssue::new(
                "deviceName",
                format!("At most {DEVICE_NAME_MAX} characters"),
            ));
        }
        if issues.is_empty() { Ok(self) } else { Err(issues) }
    }
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub(super) struct AttestationResponse {
    #[serde(rename = "clientDataJSON")]
    pub(super) client_data_json: String,
    pub(super) attestation_object: String,
    #[serde(default)]
    pub(super) transports: Vec<String>,
}

/// Browser output of an authentication ceremony
#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticatorResponse {
    pub(super) id: String,
    pub(super) response: AssertionResponse,
}

impl Validate for AuthenticatorResponse {
    type Output = Self;

    fn validate(self) -> Result<Self, Vec<ValidationIssue>> {
        if self.id.is_empty() {
            return Err(vec![ValidationIssue::new("id", "Required")]);
        }
        Ok(self)
    }
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub(super) struct AssertionResponse {
    #[serde(rename = "clientDataJSON")]
    pub(super) client_data_json: String,
    pub(super) authenticator_data: String,
    pub(super) signature: String,
    #[serde(default)]
    pub(super) user_handle: Option<String>,
}

#[derive(Deserialize)]
struct ClientDataJson {
    #[serde(rename = "type")]
    type_: String,
    challenge: String,
    origin: String,
}

#[derive(Debug)]
pub(super) struct ParsedClientData {
    pub(super) challenge: String,
    pub(super) origin: String,
    pub(super) type_: String,
    pub(super) raw_data: Vec<u8>,
}

impl ParsedClientData {
    pub(super) fn from_base64(client_data_json: &str) -> Result<Self, PasskeyError> {
        let raw_data = base64url_decode(client_data_json)
            .map_err(|e| PasskeyError::Format(format!("Failed to decode: {e}")))?;

        let data: ClientDataJson = serde_json::from_slice(&raw_data)
            .map_err(|e| PasskeyError::ClientData(format!("Invalid client data JSON: {e}")))?;

        Ok(Self {
            challenge: data.challenge,
            origin: data.origin,
            type_: data.type_,
            raw_data,
        })
    }

    /// Checks ceremony type, challenge and origin
    pub(super) fn verify(
        &self,
        expected_type: &str,
        stored_challenge: &str,
    ) -> Result<(), PasskeyError> {
        if self.type_ != expected_type {
            return Err(PasskeyError::ClientData(format!(
                "Invalid type. Expected '{}', Got: {}",
                expected_type, self.type_
            )));
        }

        if !crate::utils::constant_time_eq(self.challenge.as_bytes(), stored_challenge.as_bytes())
        {
            return Err(PasskeyError::Challenge("Challenge mismatch".into()));
        }

        if self.origin != *ORIGIN {
            return Err(PasskeyError::ClientData(format!(
                "Invalid origin. Expected: {}, Got: {}",
                *ORIGIN, self.origin
            )));
        }

        Ok(())
    }
}

/// Flags of the authenticator data
pub(super) mod auth_data_flags {
    /// User Present
    pub(in crate::passkey) const UP: u8 = 1 << 0;
    /// User Verified
    pub(in crate::passkey) const UV: u8 = 1 << 2;
    /// Attested credential data included
    pub(in crate::passkey) const AT: u8 = 1 << 6;
}

#[derive(Debug)]
pub(super) struct AuthenticatorData {
    pub(super) rp_id_hash: Vec<u8>,
    pub(super) flags: u8,
    pub(super) counter: u32,
    pub(super) raw_data: Vec<u8>,
}

impl AuthenticatorData {
    /// Layout: rpIdHash (32) | flags (1) | signCount (4, big endian) | optional data
    pub(super) fn from_bytes(data: Vec<u8>) -> Result<Self, PasskeyError> {
        if data.len() < 37 {
            return Err(PasskeyError::AuthenticatorData(
                "Authenticator data too short".into(),
            ));
        }

        Ok(Self {
            rp_id_hash: data[..32].to_vec(),
            flags: data[32],
            counter: u32::from_be_bytes([data[33], data[34], data[35], data[36]]),
            raw_data: data,
        })
    }

    pub(super) fn from_base64(auth_data: &str) -> Result<Self, PasskeyError> {
        let data = base64url_decode(auth_data)
            .map_err(|e| PasskeyError::Format(format!("Failed to decode: {e}")))?;
        Self::from_bytes(data)
    }

    pub(super) fn is_user_present(&self) -> bool {
        (self.flags & auth_data_flags::UP) != 0
    }

    pub(super) fn is_user_verified(&self) -> bool {
        (self.flags & auth_data_flags::UV) != 0
    }

    pub(super) fn has_attested_credential_data(&self) -> bool {
        (self.flags & auth_data_flags::AT) != 0
    }

    /// Checks the RP id hash, user presence and, when required, user verification
    pub(super) fn verify(&self) -> Result<(), PasskeyError> {
        let expected_hash = digest::digest(&digest::SHA256, PASSKEY_RP_ID.as_bytes());
        if self.rp_id_hash != expected_hash.as_ref() {
            return Err(PasskeyError::AuthenticatorData("Invalid RP ID hash".into()));
        }

        if !self.is_user_present() {
            return Err(PasskeyError::AuthenticatorData("User not present".into()));
        }

        if *PASSKEY_USER_VERIFICATION == UserVerification::Required && !self.is_user_verified() {
            return Err(PasskeyError::AuthenticatorData(format!(
                "User verification required but flag not set. Flags: {:02x}",
                self.flags
            )));
        }

        tracing::debug!(
            "Authenticator data verified: up={}, uv={}, counter={}",
            self.is_user_present(),
            self.is_user_verified(),
            self.counter
        );
        Ok(())
    }
}
