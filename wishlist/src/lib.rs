//! wishlist - gift wishlist reservations with a passkey-secured admin
//!
//! The crate holds the domain core: the item catalog and its reservation
//! bookkeeping, admin mutations, WebAuthn passkey ceremonies, signed admin
//! sessions, rate limiting, image uploads and the optimistic client
//! controller. HTTP wiring lives in `wishlist_axum`.

mod catalog;
pub mod client;
mod config;
mod coordination;
mod passkey;
mod ratelimit;
mod revalidate;
mod session;
mod storage;
mod upload;
mod utils;
pub mod validation;

#[cfg(test)]
mod test_utils;

pub use config::{IS_PRODUCTION, RESERVATIONS_ENABLED, WISHLIST_ROUTE_PREFIX};

pub use catalog::{
    ADMIN_RESERVER, Ban, BanReason, CatalogError, Currency, ExchangeRate, ExchangeTable,
    ItemFields, NewBan, Price, Priority, Reservation, ReservationStatus, WishlistItem,
    format_cny_approx, parse_price,
};

pub use coordination::{
    AdminItem, CoordinationError, batch_reweight, confirm_reservation, create_ban, create_item,
    delete_ban, delete_credential, delete_item, enforce_rate_limit, exchange_table,
    handle_authentication_options, handle_authentication_verify, handle_logout,
    handle_registration_options, handle_registration_verify, is_authenticated, list_bans,
    list_credentials, list_items_admin, list_public_items, patch_item, reservation_map,
    reserve_item, set_exchange_rate, unreserve_item, update_item, upload_image,
};

pub use passkey::{
    AdminCredential, AuthenticationOptions, AuthenticatorResponse, PasskeyError,
    RegisterCredential, RegistrationOptions,
};

pub use ratelimit::{
    InMemoryRateLimitStore, RateLimitDecision, RateLimitError, RateLimitPolicy, RateLimitStore,
    RateLimiter,
};

pub use session::{
    ADMIN_SESSION_COOKIE, AdminSession, SessionError, is_local_host, verify_session,
    verify_session_from_headers,
};

pub use upload::{
    ImageKind, LocalObjectStore, MAX_UPLOAD_BYTES, ObjectStore, StoredImage, UPLOAD_DIR,
    UPLOAD_PUBLIC_BASE, UploadError, sniff_image,
};

pub use utils::get_cookie;

/// Initializes every store; call once before serving requests
pub async fn init() -> Result<(), Box<dyn std::error::Error>> {
    storage::init().await?;
    session::init().await?;
    passkey::init().await?;
    catalog::init().await?;
    ratelimit::init();
    Ok(())
}
