mod config;
mod errors;
mod main;
mod storage;
mod types;

pub use config::{
    ADMIN_AUTH_CHALLENGE_COOKIE, ADMIN_REG_CHALLENGE_COOKIE, ADMIN_SESSION_COOKIE,
    ADMIN_SETUP_TOKEN_COOKIE,
};
pub use errors::SessionError;
pub use main::{
    create_session, is_local_host, prepare_logout_response, verify_session,
    verify_session_from_headers,
};
pub use types::AdminSession;

pub(crate) use storage::SessionStore;

pub(crate) async fn init() -> Result<(), SessionError> {
    let _ = *config::SESSION_SECRET;
    SessionStore::init().await
}
