//! Optimistic reservation buttons for the public wishlist page
//!
//! The controller is independent of any UI toolkit: it owns one `ButtonView`
//! per card and talks to the server through [`ReservationApi`].

mod api;
mod command;
mod controller;
mod storage;
mod types;

pub use api::{ApiError, HttpReservationApi, ReservationApi};
pub use command::{CommandKind, ReservationCommand};
pub use controller::{ItemCard, ReservationController};
pub use storage::{MemoryTokenStorage, TokenStorage, visitor_id};
pub use types::{ButtonState, ButtonView, Language, LocalizedText, Notice, NoticeKind};
