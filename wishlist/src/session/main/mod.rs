mod cookie;
mod session;

pub use cookie::is_local_host;
pub use session::{
    create_session, prepare_logout_response, verify_session, verify_session_from_headers,
};
