mod config;
mod errors;
mod main;
mod storage;
mod types;

pub use errors::PasskeyError;
pub use main::{
    AuthenticationOptions, AuthenticatorResponse, RegisterCredential, RegistrationOptions,
    finish_authentication, finish_registration, start_authentication, start_registration,
    verify_setup_token,
};
pub use types::AdminCredential;

pub(crate) use config::{ORIGIN, PASSKEY_CHALLENGE_TIMEOUT};
pub(crate) use storage::CredentialStore;

#[cfg(test)]
pub(crate) use main::test_utils;

pub(crate) async fn init() -> Result<(), PasskeyError> {
    // Fail early on a missing ORIGIN
    let _ = *config::PASSKEY_RP_ID;

    CredentialStore::init().await
}
