mod config;
mod errors;
mod price;
mod storage;
mod types;

pub use errors::CatalogError;
pub use price::{
    Currency, ExchangeTable, Price, UnknownCurrency, format_cny_approx, parse_price,
};
pub use types::{
    ADMIN_RESERVER, Ban, BanReason, ExchangeRate, ItemFields, NewBan, Priority, Reservation,
    ReservationStatus, WishlistItem, sort_items,
};

pub(crate) use storage::CatalogStore;
pub(crate) use types::{NewReservation, ReserveOutcome};

pub(crate) async fn init() -> Result<(), CatalogError> {
    CatalogStore::init().await
}
