//! Item listing and the admin mutations on items

use std::collections::HashMap;

use chrono::Utc;
use serde::Serialize;

use crate::catalog::{CatalogStore, ItemFields, Reservation, WishlistItem, sort_items};
use crate::revalidate::{WISHLIST_PATHS, revalidate_paths};
use crate::validation::ItemPatch;

use super::errors::CoordinationError;
use super::reservation::toggle_reserved;

/// An item as the admin panel sees it, with its reservation if any
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminItem {
    #[serde(flatten)]
    pub item: WishlistItem,
    pub reservation: Option<Reservation>,
}

/// Items in public display order
pub async fn list_public_items() -> Result<Vec<WishlistItem>, CoordinationError> {
    let mut items = CatalogStore::list_items().await?;
    sort_items(&mut items);
    Ok(items)
}

pub async fn list_items_admin() -> Result<Vec<AdminItem>, CoordinationError> {
    let items = list_public_items().await?;
    let mut reservations: HashMap<i64, Reservation> = CatalogStore::list_reservations()
        .await?
        .into_iter()
        .map(|r| (r.item_id, r))
        .collect();

    Ok(items
        .into_iter()
        .map(|item| AdminItem {
            reservation: reservations.remove(&item.id),
            item,
        })
        .collect())
}

#[tracing::instrument(skip(fields), fields(title = %fields.title))]
pub async fn create_item(fields: ItemFields) -> Result<WishlistItem, CoordinationError> {
    let item = CatalogStore::insert_item(&fields, Utc::now()).await?;
    tracing::info!(item_id = item.id, "Item created");
    revalidate_paths(WISHLIST_PATHS);
    Ok(item)
}

/// Replaces every editable field of an item
#[tracing::instrument(skip(fields))]
pub async fn update_item(id: i64, fields: ItemFields) -> Result<WishlistItem, CoordinationError> {
    let Some(item) = CatalogStore::update_item(id, &fields).await? else {
        return Err(CoordinationError::NotFound("Item not found".to_string()).log());
    };
    tracing::info!(item_id = id, "Item updated");
    revalidate_paths(WISHLIST_PATHS);
    Ok(item)
}

/// Applies `received` first, then `reserved`. Marking an item received drops its reservation.
#[tracing::instrument]
pub async fn patch_item(id: i64, patch: ItemPatch) -> Result<AdminItem, CoordinationError> {
    if let Some(received) = patch.received {
        if CatalogStore::set_received(id, received).await?.is_none() {
            return Err(CoordinationError::NotFound("Item not found".to_string()).log());
        }
    }
    if let Some(reserved) = patch.reserved {
        toggle_reserved(id, reserved).await?;
    }

    let Some(item) = CatalogStore::get_item(id).await? else {
        return Err(CoordinationError::NotFound("Item not found".to_string()).log());
    };
    let reservation = CatalogStore::get_reservation(id).await?;

    tracing::info!(item_id = id, "Item patched");
    revalidate_paths(WISHLIST_PATHS);
    Ok(AdminItem { item, reservation })
}

/// Deletes the item and its reservation
#[tracing::instrument]
pub async fn delete_item(id: i64) -> Result<(), CoordinationError> {
    if !CatalogStore::delete_item(id).await? {
        return Err(CoordinationError::NotFound("Item not found".to_string()).log());
    }
    tracing::info!(item_id = id, "Item deleted");
    revalidate_paths(WISHLIST_PATHS);
    Ok(())
}

/// Sets the weight of every listed item, or of none when any id is unknown
#[tracing::instrument(skip(updates), fields(count = updates.len()))]
pub async fn batch_reweight(updates: Vec<(i64, i64)>) -> Result<usize, CoordinationError> {
    let missing = CatalogStore::set_weights(&updates).await?;
    if !missing.is_empty() {
        let ids: Vec<String> = missing.iter().map(i64::to_string).collect();
        return Err(
            CoordinationError::NotFound(format!("Items not found: {}", ids.join(", "))).log(),
        );
    }

    tracing::info!(count = updates.len(), "Item weights updated");
    revalidate_paths(WISHLIST_PATHS);
    Ok(updates.len())
}
