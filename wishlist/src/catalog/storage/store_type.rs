use chrono::{DateTime, Utc};

use crate::storage::GENERIC_DATA_STORE;

use crate::catalog::errors::CatalogError;
use crate::catalog::types::{
    Ban, ExchangeRate, ItemFields, NewBan, NewReservation, Reservation, ReservationStatus,
    ReserveOutcome, WishlistItem,
};

use super::postgres::*;
use super::sqlite::*;

/// Items, reservations, bans and exchange-rate overrides
pub(crate) struct CatalogStore;

impl CatalogStore {
    pub(crate) async fn init() -> Result<(), CatalogError> {
        let store = GENERIC_DATA_STORE.lock().await;

        match (store.as_sqlite(), store.as_postgres()) {
            (Some(pool), _) => {
                create_tables_sqlite(pool).await?;
                validate_catalog_tables_sqlite(pool).await?;
                Ok(())
            }
            (_, Some(pool)) => {
                create_tables_postgres(pool).await?;
                validate_catalog_tables_postgres(pool).await?;
                Ok(())
            }
            _ => Err(CatalogError::Storage(
                "Unsupported database type".to_string(),
            )),
        }
    }

    pub(crate) async fn list_items() -> Result<Vec<WishlistItem>, CatalogError> {
        let store = GENERIC_DATA_STORE.lock().await;

        if let Some(pool) = store.as_sqlite() {
            list_items_sqlite(pool).await
        } else if let Some(pool) = store.as_postgres() {
            list_items_postgres(pool).await
        } else {
            Err(CatalogError::Storage("Unsupported database type".into()))
        }
    }

    pub(crate) async fn get_item(id: i64) -> Result<Option<WishlistItem>, CatalogError> {
        let store = GENERIC_DATA_STORE.lock().await;

        if let Some(pool) = store.as_sqlite() {
            get_item_sqlite(pool, id).await
        } else if let Some(pool) = store.as_postgres() {
            get_item_postgres(pool, id).await
        } else {
            Err(CatalogError::Storage("Unsupported database type".into()))
        }
    }

    pub(crate) async fn insert_item(
        fields: &ItemFields,
        created_at: DateTime<Utc>,
    ) -> Result<WishlistItem, CatalogError> {
        let store = GENERIC_DATA_STORE.lock().await;

        if let Some(pool) = store.as_sqlite() {
            insert_item_sqlite(pool, fields, created_at).await
        } else if let Some(pool) = store.as_postgres() {
            insert_item_postgres(pool, fields, created_at).await
        } else {
            Err(CatalogError::Storage("Unsupported database type".into()))
        }
    }

    /// Replaces the editable fields; an item marked received loses its reservation
    pub(crate) async fn update_item(
        id: i64,
        fields: &ItemFields,
    ) -> Result<Option<WishlistItem>, CatalogError> {
        let store = GENERIC_DATA_STORE.lock().await;

        if let Some(pool) = store.as_sqlite() {
            update_item_sqlite(pool, id, fields).await
        } else if let Some(pool) = store.as_postgres() {
            update_item_postgres(pool, id, fields).await
        } else {
            Err(CatalogError::Storage("Unsupported database type".into()))
        }
    }

    /// Marking an item received deletes its reservation in the same transaction
    pub(crate) async fn set_received(
        id: i64,
        received: bool,
    ) -> Result<Option<WishlistItem>, CatalogError> {
        let store = GENERIC_DATA_STORE.lock().await;

        if let Some(pool) = store.as_sqlite() {
            set_received_sqlite(pool, id, received).await
        } else if let Some(pool) = store.as_postgres() {
            set_received_postgres(pool, id, received).await
        } else {
            Err(CatalogError::Storage("Unsupported database type".into()))
        }
    }

    /// Deletes the item's reservation, then the item. Returns whether the item existed.
    pub(crate) async fn delete_item(id: i64) -> Result<bool, CatalogError> {
        let store = GENERIC_DATA_STORE.lock().await;

        if let Some(pool) = store.as_sqlite() {
            delete_item_sqlite(pool, id).await
        } else if let Some(pool) = store.as_postgres() {
            delete_item_postgres(pool, id).await
        } else {
            Err(CatalogError::Storage("Unsupported database type".into()))
        }
    }

    /// Applies every weight or none and returns the ids that do not exist
    pub(crate) async fn set_weights(updates: &[(i64, i64)]) -> Result<Vec<i64>, CatalogError> {
        let store = GENERIC_DATA_STORE.lock().await;

        if let Some(pool) = store.as_sqlite() {
            set_weights_sqlite(pool, updates).await
        } else if let Some(pool) = store.as_postgres() {
            set_weights_postgres(pool, updates).await
        } else {
            Err(CatalogError::Storage("Unsupported database type".into()))
        }
    }

    /// Writes the reservation only when the item exists, is not received and has
    /// no reservation yet. The check and the write are a single statement.
    pub(crate) async fn insert_reservation_if_available(
        reservation: &NewReservation<'_>,
    ) -> Result<ReserveOutcome, CatalogError> {
        let store = GENERIC_DATA_STORE.lock().await;

        if let Some(pool) = store.as_sqlite() {
            insert_reservation_if_available_sqlite(pool, reservation).await
        } else if let Some(pool) = store.as_postgres() {
            insert_reservation_if_available_postgres(pool, reservation).await
        } else {
            Err(CatalogError::Storage("Unsupported database type".into()))
        }
    }

    pub(crate) async fn get_reservation(item_id: i64) -> Result<Option<Reservation>, CatalogError> {
        let store = GENERIC_DATA_STORE.lock().await;

        if let Some(pool) = store.as_sqlite() {
            get_reservation_sqlite(pool, item_id).await
        } else if let Some(pool) = store.as_postgres() {
            get_reservation_postgres(pool, item_id).await
        } else {
            Err(CatalogError::Storage("Unsupported database type".into()))
        }
    }

    pub(crate) async fn list_reservations() -> Result<Vec<Reservation>, CatalogError> {
        let store = GENERIC_DATA_STORE.lock().await;

        if let Some(pool) = store.as_sqlite() {
            list_reservations_sqlite(pool).await
        } else if let Some(pool) = store.as_postgres() {
            list_reservations_postgres(pool).await
        } else {
            Err(CatalogError::Storage("Unsupported database type".into()))
        }
    }

    pub(crate) async fn delete_reservation(item_id: i64) -> Result<bool, CatalogError> {
        let store = GENERIC_DATA_STORE.lock().await;

        if let Some(pool) = store.as_sqlite() {
            delete_reservation_sqlite(pool, item_id).await
        } else if let Some(pool) = store.as_postgres() {
            delete_reservation_postgres(pool, item_id).await
        } else {
            Err(CatalogError::Storage("Unsupported database type".into()))
        }
    }

    /// Deletes the reservation only while it still carries `token`
    pub(crate) async fn delete_reservation_with_token(
        item_id: i64,
        token: &str,
    ) -> Result<bool, CatalogError> {
        let store = GENERIC_DATA_STORE.lock().await;

        if let Some(pool) = store.as_sqlite() {
            delete_reservation_with_token_sqlite(pool, item_id, token).await
        } else if let Some(pool) = store.as_postgres() {
            delete_reservation_with_token_postgres(pool, item_id, token).await
        } else {
            Err(CatalogError::Storage("Unsupported database type".into()))
        }
    }

    pub(crate) async fn set_reservation_status(
        item_id: i64,
        status: ReservationStatus,
    ) -> Result<bool, CatalogError> {
        let store = GENERIC_DATA_STORE.lock().await;

        if let Some(pool) = store.as_sqlite() {
            set_reservation_status_sqlite(pool, item_id, status).await
        } else if let Some(pool) = store.as_postgres() {
            set_reservation_status_postgres(pool, item_id, status).await
        } else {
            Err(CatalogError::Storage("Unsupported database type".into()))
        }
    }

    pub(crate) async fn insert_ban(
        ban: &NewBan,
        created_at: DateTime<Utc>,
    ) -> Result<Ban, CatalogError> {
        let store = GENERIC_DATA_STORE.lock().await;

        if let Some(pool) = store.as_sqlite() {
            insert_ban_sqlite(pool, ban, created_at).await
        } else if let Some(pool) = store.as_postgres() {
            insert_ban_postgres(pool, ban, created_at).await
        } else {
            Err(CatalogError::Storage("Unsupported database type".into()))
        }
    }

    pub(crate) async fn list_bans() -> Result<Vec<Ban>, CatalogError> {
        let store = GENERIC_DATA_STORE.lock().await;

        if let Some(pool) = store.as_sqlite() {
            list_bans_sqlite(pool).await
        } else if let Some(pool) = store.as_postgres() {
            list_bans_postgres(pool).await
        } else {
            Err(CatalogError::Storage("Unsupported database type".into()))
        }
    }

    pub(crate) async fn delete_ban(id: i64) -> Result<bool, CatalogError> {
        let store = GENERIC_DATA_STORE.lock().await;

        if let Some(pool) = store.as_sqlite() {
            delete_ban_sqlite(pool, id).await
        } else if let Some(pool) = store.as_postgres() {
            delete_ban_postgres(pool, id).await
        } else {
            Err(CatalogError::Storage("Unsupported database type".into()))
        }
    }

    /// Bans naming either identity, expired ones included
    pub(crate) async fn find_bans(
        visitor_id: Option<&str>,
        ip: Option<&str>,
    ) -> Result<Vec<Ban>, CatalogError> {
        let store = GENERIC_DATA_STORE.lock().await;

        if let Some(pool) = store.as_sqlite() {
            find_bans_sqlite(pool, visitor_id, ip).await
        } else if let Some(pool) = store.as_postgres() {
            find_bans_postgres(pool, visitor_id, ip).await
        } else {
            Err(CatalogError::Storage("Unsupported database type".into()))
        }
    }

    pub(crate) async fn upsert_exchange_rate(rate: &ExchangeRate) -> Result<(), CatalogError> {
        let store = GENERIC_DATA_STORE.lock().await;

        if let Some(pool) = store.as_sqlite() {
            upsert_exchange_rate_sqlite(pool, rate).await
        } else if let Some(pool) = store.as_postgres() {
            upsert_exchange_rate_postgres(pool, rate).await
        } else {
            Err(CatalogError::Storage("Unsupported database type".into()))
        }
    }

    pub(crate) async fn list_exchange_rates() -> Result<Vec<ExchangeRate>, CatalogError> {
        let store = GENERIC_DATA_STORE.lock().await;

        if let Some(pool) = store.as_sqlite() {
            list_exchange_rates_sqlite(pool).await
        } else if let Some(pool) = store.as_postgres() {
            list_exchange_rates_postgres(pool).await
        } else {
            Err(CatalogError::Storage("Unsupported database type".into()))
        }
    }
}
