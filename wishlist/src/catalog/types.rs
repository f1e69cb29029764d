use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::errors::CatalogError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
        }
    }

    /// Position in the public listing; items without priority come last
    pub(crate) fn rank(priority: Option<Priority>) -> u8 {
        match priority {
            Some(Priority::High) => 0,
            Some(Priority::Medium) => 1,
            Some(Priority::Low) => 2,
            None => 3,
        }
    }
}

impl FromStr for Priority {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "high" => Ok(Priority::High),
            "medium" => Ok(Priority::Medium),
            "low" => Ok(Priority::Low),
            other => Err(CatalogError::Corrupt(format!("Unknown priority: {other}"))),
        }
    }
}

/// A gift on the list
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WishlistItem {
    pub id: i64,
    pub title: String,
    /// Title shown when the page is switched to Chinese
    pub title_localized: Option<String>,
    /// Free text such as "$64" or "AU$140"
    pub price: String,
    pub image: Option<String>,
    pub description: String,
    pub description_localized: Option<String>,
    pub category: Vec<String>,
    pub priority: Option<Priority>,
    pub received: bool,
    pub weight: i64,
    pub created_at: DateTime<Utc>,
}

/// Editable fields of an item, already validated
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ItemFields {
    pub title: String,
    pub title_localized: Option<String>,
    pub price: String,
    pub image: Option<String>,
    pub description: String,
    pub description_localized: Option<String>,
    pub category: Vec<String>,
    pub priority: Option<Priority>,
    pub received: bool,
    pub weight: i64,
}

#[derive(sqlx::FromRow)]
pub(super) struct ItemRow {
    pub(super) id: i64,
    pub(super) title: String,
    pub(super) title_localized: Option<String>,
    pub(super) price: String,
    pub(super) image: Option<String>,
    pub(super) description: String,
    pub(super) description_localized: Option<String>,
    pub(super) category: String,
    pub(super) priority: Option<String>,
    pub(super) received: bool,
    pub(super) weight: i64,
    pub(super) created_at: DateTime<Utc>,
}

impl TryFrom<ItemRow> for WishlistItem {
    type Error = CatalogError;

    fn try_from(row: ItemRow) -> Result<Self, Self::Error> {
        let priority = row
            .priority
            .as_deref()
            .filter(|p| !p.is_empty())
            .map(Priority::from_str)
            .transpose()?;

        Ok(Self {
            id: row.id,
            title: row.title,
            title_localized: row.title_localized,
            price: row.price,
            image: row.image,
            description: row.description,
            description_localized: row.description_localized,
            category: split_categories(&row.category),
            priority,
            received: row.received,
            weight: row.weight,
            created_at: row.created_at,
        })
    }
}

pub(super) fn join_categories(category: &[String]) -> String {
    category.join(",")
}

pub(super) fn split_categories(stored: &str) -> Vec<String> {
    stored
        .split(',')
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_string)
        .collect()
}

/// Orders items for the public listing: priority, then weight ascending,
/// then newest first.
pub fn sort_items(items: &mut [WishlistItem]) {
    items.sort_by(|a, b| {
        Priority::rank(a.priority)
            .cmp(&Priority::rank(b.priority))
            .then(a.weight.cmp(&b.weight))
            .then(b.created_at.cmp(&a.created_at))
            .then(b.id.cmp(&a.id))
    });
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReservationStatus {
    Reserved,
    Confirmed,
}

impl ReservationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReservationStatus::Reserved => "reserved",
            ReservationStatus::Confirmed => "confirmed",
        }
    }
}

impl FromStr for ReservationStatus {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "reserved" => Ok(ReservationStatus::Reserved),
            "confirmed" => Ok(ReservationStatus::Confirmed),
            other => Err(CatalogError::Corrupt(format!(
                "Unknown reservation status: {other}"
            ))),
        }
    }
}

impl fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `reserved_by` value of reservations made from the admin panel
pub const ADMIN_RESERVER: &str = "admin";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Reservation {
    pub id: i64,
    pub item_id: i64,
    pub reserved_by: String,
    pub ip: Option<String>,
    pub reserved_at: DateTime<Utc>,
    #[serde(skip_serializing)]
    pub reservation_token: String,
    pub status: ReservationStatus,
}

#[derive(sqlx::FromRow)]
pub(super) struct ReservationRow {
    pub(super) id: i64,
    pub(super) item_id: i64,
    pub(super) reserved_by: String,
    pub(super) ip: Option<String>,
    pub(super) reserved_at: DateTime<Utc>,
    pub(super) reservation_token: String,
    pub(super) status: String,
}

impl TryFrom<ReservationRow> for Reservation {
    type Error = CatalogError;

    fn try_from(row: ReservationRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            item_id: row.item_id,
            reserved_by: row.reserved_by,
            ip: row.ip,
            reserved_at: row.reserved_at,
            reservation_token: row.reservation_token,
            status: row.status.parse()?,
        })
    }
}

/// New reservation row
#[derive(Debug, Clone)]
pub(crate) struct NewReservation<'a> {
    pub(crate) item_id: i64,
    pub(crate) reserved_by: &'a str,
    pub(crate) ip: Option<&'a str>,
    pub(crate) reservation_token: &'a str,
    pub(crate) reserved_at: DateTime<Utc>,
}

/// Result of the conditional reservation insert
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ReserveOutcome {
    Inserted,
    /// Nothing written: the item is missing, received or already reserved
    Rejected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BanReason {
    Spam,
    Greed,
    MultiAccount,
}

impl BanReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            BanReason::Spam => "spam",
            BanReason::Greed => "greed",
            BanReason::MultiAccount => "multi_account",
        }
    }
}

impl FromStr for BanReason {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "spam" => Ok(BanReason::Spam),
            "greed" => Ok(BanReason::Greed),
            "multi_account" => Ok(BanReason::MultiAccount),
            other => Err(CatalogError::Corrupt(format!("Unknown ban reason: {other}"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Ban {
    pub id: i64,
    pub visitor_id: Option<String>,
    pub ip: Option<String>,
    pub reason: BanReason,
    /// `None` bans permanently
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Ban {
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_none_or(|expires_at| now < expires_at)
    }

    /// Whether the ban covers a caller with the given identity
    pub fn matches(&self, visitor_id: Option<&str>, ip: Option<&str>) -> bool {
        let visitor_match = matches!(
            (self.visitor_id.as_deref(), visitor_id),
            (Some(banned), Some(caller)) if banned == caller
        );
        let ip_match = matches!(
            (self.ip.as_deref(), ip),
            (Some(banned), Some(caller)) if banned == caller
        );
        visitor_match || ip_match
    }
}

#[derive(sqlx::FromRow)]
pub(super) struct BanRow {
    pub(super) id: i64,
    pub(super) visitor_id: Option<String>,
    pub(super) ip: Option<String>,
    pub(super) reason: String,
    pub(super) expires_at: Option<DateTime<Utc>>,
    pub(super) created_at: DateTime<Utc>,
}

impl TryFrom<BanRow> for Ban {
    type Error = CatalogError;

    fn try_from(row: BanRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            visitor_id: row.visitor_id,
            ip: row.ip,
            reason: row.reason.parse()?,
            expires_at: row.expires_at,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewBan {
    pub visitor_id: Option<String>,
    pub ip: Option<String>,
    pub reason: BanReason,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Stored override of a compiled-in conversion rate
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ExchangeRate {
    pub from_currency: String,
    pub to_currency: String,
    pub rate: f64,
    pub updated_at: DateTime<Utc>,
}
