//! Entry points combining sessions, passkeys, rate limits and the catalog store

mod admin;
mod auth;
mod errors;
mod items;
mod ratelimit;
mod reservation;
mod upload;

pub use admin::{
    create_ban, delete_ban, delete_credential, exchange_table, list_bans, list_credentials,
    set_exchange_rate,
};
pub use auth::{
    handle_authentication_options, handle_authentication_verify, handle_logout,
    handle_registration_options, handle_registration_verify, is_authenticated,
};
pub use errors::CoordinationError;
pub use items::{
    AdminItem, batch_reweight, create_item, delete_item, list_items_admin, list_public_items,
    patch_item, update_item,
};
pub use ratelimit::enforce_rate_limit;
pub use reservation::{confirm_reservation, reservation_map, reserve_item, unreserve_item};
pub use upload::upload_image;
