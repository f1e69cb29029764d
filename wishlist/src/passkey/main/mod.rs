mod auth;
mod challenge;
mod register;
mod types;

#[cfg(test)]
pub(crate) mod test_utils;

pub use auth::{finish_authentication, start_authentication};
pub use register::{finish_registration, start_registration, verify_setup_token};
pub use types::{
    AuthenticationOptions, AuthenticatorResponse, RegisterCredential, RegistrationOptions,
};
