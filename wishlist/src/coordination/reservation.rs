//! Visitor reservations and the admin override

use std::collections::BTreeMap;

use chrono::Utc;

use crate::catalog::{
    ADMIN_RESERVER, CatalogStore, NewReservation, ReservationStatus, ReserveOutcome,
};
use crate::config::RESERVATIONS_ENABLED;
use crate::utils::{constant_time_eq, gen_random_string};

use super::errors::CoordinationError;

/// Bytes of randomness in a reservation token
const RESERVATION_TOKEN_BYTES: usize = 32;

/// Reserves an item for a visitor and returns the token that can later cancel it
#[tracing::instrument(skip(visitor_id))]
pub async fn reserve_item(
    item_id: i64,
    visitor_id: &str,
    ip: Option<&str>,
) -> Result<String, CoordinationError> {
    if !*RESERVATIONS_ENABLED {
        return Err(CoordinationError::Forbidden("Reservations are disabled".to_string()).log());
    }
    ensure_not_banned(visitor_id, ip).await?;

    let token = gen_random_string(RESERVATION_TOKEN_BYTES)?;
    let outcome = CatalogStore::insert_reservation_if_available(&NewReservation {
        item_id,
        reserved_by: visitor_id,
        ip,
        reservation_token: &token,
        reserved_at: Utc::now(),
    })
    .await?;

    match outcome {
        ReserveOutcome::Inserted => {
            tracing::info!(item_id, "Item reserved");
            Ok(token)
        }
        ReserveOutcome::Rejected => Err(explain_rejection(item_id).await?.log()),
    }
}

/// Cancels a reservation. Only the holder of the reservation token may do so;
/// the visitor id is recorded for diagnostics and never authorizes.
#[tracing::instrument(skip(visitor_id, reservation_token))]
pub async fn unreserve_item(
    item_id: i64,
    visitor_id: &str,
    reservation_token: Option<&str>,
) -> Result<(), CoordinationError> {
    let Some(reservation) = CatalogStore::get_reservation(item_id).await? else {
        return Err(CoordinationError::NotFound("Reservation not found".to_string()).log());
    };

    let token = reservation_token.unwrap_or_default();
    if token.is_empty()
        || !constant_time_eq(token.as_bytes(), reservation.reservation_token.as_bytes())
    {
        tracing::warn!(
            item_id,
            visitor_id,
            reserved_by = %reservation.reserved_by,
            "Unreserve refused: reservation token mismatch"
        );
        return Err(CoordinationError::Forbidden(
            "You can only cancel your own reservation".to_string(),
        ));
    }

    if !CatalogStore::delete_reservation_with_token(item_id, token).await? {
        return Err(CoordinationError::NotFound("Reservation not found".to_string()).log());
    }

    tracing::info!(item_id, "Reservation cancelled");
    Ok(())
}

/// Status of every reserved item, keyed by item id
pub async fn reservation_map() -> Result<BTreeMap<i64, ReservationStatus>, CoordinationError> {
    let reservations = CatalogStore::list_reservations().await?;
    Ok(reservations
        .into_iter()
        .map(|r| (r.item_id, r.status))
        .collect())
}

/// Admin override: makes the item reserved or free regardless of who holds it.
/// Calling it with the current state is a no-op.
#[tracing::instrument]
pub(super) async fn toggle_reserved(item_id: i64, reserved: bool) -> Result<(), CoordinationError> {
    if CatalogStore::get_item(item_id).await?.is_none() {
        return Err(CoordinationError::NotFound("Item not found".to_string()).log());
    }

    if !reserved {
        if CatalogStore::delete_reservation(item_id).await? {
            tracing::info!(item_id, "Reservation removed by admin");
        }
        return Ok(());
    }

    // Nobody holds this token, so only the admin can clear the reservation
    let token = gen_random_string(RESERVATION_TOKEN_BYTES)?;
    let outcome = CatalogStore::insert_reservation_if_available(&NewReservation {
        item_id,
        reserved_by: ADMIN_RESERVER,
        ip: None,
        reservation_token: &token,
        reserved_at: Utc::now(),
    })
    .await?;

    match outcome {
        ReserveOutcome::Inserted => {
            tracing::info!(item_id, "Item reserved by admin");
            Ok(())
        }
        ReserveOutcome::Rejected => match explain_rejection(item_id).await? {
            CoordinationError::Conflict(_) => Ok(()),
            other => Err(other.log()),
        },
    }
}

/// Marks an existing reservation as confirmed
#[tracing::instrument]
pub async fn confirm_reservation(item_id: i64) -> Result<(), CoordinationError> {
    if !CatalogStore::set_reservation_status(item_id, ReservationStatus::Confirmed).await? {
        return Err(CoordinationError::NotFound("Reservation not found".to_string()).log());
    }
    tracing::info!(item_id, "Reservation confirmed");
    Ok(())
}

/// Works out why the conditional insert wrote nothing
async fn explain_rejection(item_id: i64) -> Result<CoordinationError, CoordinationError> {
    Ok(match CatalogStore::get_item(item_id).await? {
        None => CoordinationError::NotFound("Item not found".to_string()),
        Some(item) if item.received => {
            CoordinationError::BadRequest("Item has already been received".to_string())
        }
        Some(_) => CoordinationError::Conflict("Item is already reserved".to_string()),
    })
}

async fn ensure_not_banned(visitor_id: &str, ip: Option<&str>) -> Result<(), CoordinationError> {
    let now = Utc::now();
    let bans = CatalogStore::find_bans(Some(visitor_id), ip).await?;

    if let Some(ban) = bans
        .iter()
        .find(|ban| ban.is_active_at(now) && ban.matches(Some(visitor_id), ip))
    {
        tracing::warn!(
            ban_id = ban.id,
            reason = ban.reason.as_str(),
            "Banned caller tried to reserve"
        );
        return Err(CoordinationError::Forbidden(
            "You are not allowed to reserve items".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{BanReason, ItemFields, NewBan, WishlistItem};
    use crate::test_utils::init_test_environment;
    use chrono::Duration;

    async fn new_item(title: &str) -> WishlistItem {
        CatalogStore::insert_item(
            &ItemFields {
                title: title.to_string(),
                ..Default::default()
            },
            Utc::now(),
        )
        .await
        .unwrap()
    }

    fn visitor() -> String {
        format!("visitor-{}", uuid::Uuid::new_v4())
    }

    #[tokio::test]
    async fn test_parallel_reserve_exactly_one_wins() {
        init_test_environment().await;
        let item = new_item("Parallel").await;
        let (a, b) = (visitor(), visitor());

        let (first, second) = tokio::join!(
            reserve_item(item.id, &a, Some("198.51.100.1")),
            reserve_item(item.id, &b, Some("198.51.100.2"))
        );

        let results = [first, second];
        let wins = results.iter().filter(|r| r.is_ok()).count();
        let conflicts = results
            .iter()
            .filter(|r| matches!(r, Err(CoordinationError::Conflict(_))))
            .count();
        assert_eq!(wins, 1);
        assert_eq!(conflicts, 1);

        let reservations = CatalogStore::list_reservations().await.unwrap();
        assert_eq!(
            reservations.iter().filter(|r| r.item_id == item.id).count(),
            1
        );
    }

    #[tokio::test]
    async fn test_reserve_error_kinds() {
        init_test_environment().await;

        assert!(matches!(
            reserve_item(i64::MAX, &visitor(), None).await,
            Err(CoordinationError::NotFound(_))
        ));

        let item = new_item("Received").await;
        CatalogStore::set_received(item.id, true).await.unwrap();
        assert!(matches!(
            reserve_item(item.id, &visitor(), None).await,
            Err(CoordinationError::BadRequest(_))
        ));
    }

    #[tokio::test]
    async fn test_unreserve_requires_matching_token() {
        init_test_environment().await;
        let item = new_item("Token").await;
        let owner = visitor();
        let token = reserve_item(item.id, &owner, None).await.unwrap();

        // Same visitor id without the token is not enough
        assert!(matches!(
            unreserve_item(item.id, &owner, None).await,
            Err(CoordinationError::Forbidden(_))
        ));
        assert!(matches!(
            unreserve_item(item.id, &owner, Some("not-the-token")).await,
            Err(CoordinationError::Forbidden(_))
        ));
        assert!(CatalogStore::get_reservation(item.id).await.unwrap().is_some());

        // Any visitor id works with the right token
        unreserve_item(item.id, "other-device", Some(&token))
            .await
            .unwrap();
        assert!(CatalogStore::get_reservation(item.id).await.unwrap().is_none());

        assert!(matches!(
            unreserve_item(item.id, &owner, Some(&token)).await,
            Err(CoordinationError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_banned_visitor_is_forbidden() {
        init_test_environment().await;
        let item = new_item("Banned").await;
        let banned = visitor();

        CatalogStore::insert_ban(
            &NewBan {
                visitor_id: Some(banned.clone()),
                ip: None,
                reason: BanReason::Greed,
                expires_at: Some(Utc::now() + Duration::hours(1)),
            },
            Utc::now(),
        )
        .await
        .unwrap();

        assert!(matches!(
            reserve_item(item.id, &banned, None).await,
            Err(CoordinationError::Forbidden(_))
        ));
        assert!(reserve_item(item.id, &visitor(), None).await.is_ok());
    }

    #[tokio::test]
    async fn test_expired_ban_no_longer_applies() {
        init_test_environment().await;
        let item = new_item("Expired ban").await;
        let ip = format!("192.0.2.{}", rand_octet());

        CatalogStore::insert_ban(
            &NewBan {
                visitor_id: None,
                ip: Some(ip.clone()),
                reason: BanReason::Spam,
                expires_at: Some(Utc::now() - Duration::minutes(1)),
            },
            Utc::now() - Duration::days(1),
        )
        .await
        .unwrap();

        assert!(reserve_item(item.id, &visitor(), Some(&ip)).await.is_ok());
    }

    fn rand_octet() -> u8 {
        uuid::Uuid::new_v4().as_bytes()[0]
    }

    #[tokio::test]
    async fn test_toggle_reserved_is_idempotent() {
        init_test_environment().await;
        let item = new_item("Toggle").await;

        toggle_reserved(item.id, true).await.unwrap();
        toggle_reserved(item.id, true).await.unwrap();
        let reservation = CatalogStore::get_reservation(item.id).await.unwrap().unwrap();
        assert_eq!(reservation.reserved_by, ADMIN_RESERVER);

        toggle_reserved(item.id, false).await.unwrap();
        toggle_reserved(item.id, false).await.unwrap();
        assert!(CatalogStore::get_reservation(item.id).await.unwrap().is_none());

        assert!(matches!(
            toggle_reserved(i64::MAX, true).await,
            Err(CoordinationError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_admin_toggle_overrides_visitor_reservation() {
        init_test_environment().await;
        let item = new_item("Override").await;
        reserve_item(item.id, &visitor(), None).await.unwrap();

        toggle_reserved(item.id, false).await.unwrap();
        assert!(CatalogStore::get_reservation(item.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_confirm_and_map() {
        init_test_environment().await;
        let item = new_item("Confirm").await;

        assert!(matches!(
            confirm_reservation(item.id).await,
            Err(CoordinationError::NotFound(_))
        ));

        reserve_item(item.id, &visitor(), None).await.unwrap();
        assert_eq!(
            reservation_map().await.unwrap().get(&item.id),
            Some(&ReservationStatus::Reserved)
        );

        confirm_reservation(item.id).await.unwrap();
        assert_eq!(
            reservation_map().await.unwrap().get(&item.id),
            Some(&ReservationStatus::Confirmed)
        );
    }
}
