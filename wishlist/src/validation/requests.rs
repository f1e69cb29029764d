use std::collections::HashSet;
use std::net::IpAddr;

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::catalog::{BanReason, Currency, ExchangeRate, ItemFields, NewBan, Priority};

use super::rules::{
    BATCH_MAX, DESCRIPTION_MAX, Issues, PRICE_MAX, TITLE_MAX, VISITOR_ID_MAX, non_empty,
};
use super::{Validate, ValidationIssue};

/// Body of item create and full update
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ItemRequest {
    pub title: String,
    #[serde(default)]
    pub title_localized: Option<String>,
    #[serde(default)]
    pub price: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub description_localized: Option<String>,
    #[serde(default)]
    pub category: Vec<String>,
    #[serde(default)]
    pub priority: Option<Priority>,
    #[serde(default)]
    pub received: bool,
    #[serde(default)]
    pub weight: i64,
}

impl Validate for ItemRequest {
    type Output = ItemFields;

    fn validate(self) -> Result<ItemFields, Vec<ValidationIssue>> {
        let mut issues = Issues::default();
        let title = self.title.trim().to_string();

        issues.text("title", &title, 1, TITLE_MAX);
        issues.optional_text("titleLocalized", self.title_localized.as_deref(), TITLE_MAX);
        issues.text("price", &self.price, 0, PRICE_MAX);
        issues.image("image", self.image.as_deref());
        issues.text("description", &self.description, 0, DESCRIPTION_MAX);
        issues.optional_text(
            "descriptionLocalized",
            self.description_localized.as_deref(),
            DESCRIPTION_MAX,
        );
        issues.categories("category", &self.category);
        issues.weight("weight", self.weight);

        issues.finish(ItemFields {
            title,
            title_localized: non_empty(self.title_localized),
            price: self.price.trim().to_string(),
            image: non_empty(self.image),
            description: self.description,
            description_localized: non_empty(self.description_localized),
            category: self.category,
            priority: self.priority,
            received: self.received,
            weight: self.weight,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ItemPatchRequest {
    #[serde(default)]
    pub received: Option<bool>,
    #[serde(default)]
    pub reserved: Option<bool>,
}

/// A partial update carrying at least one change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ItemPatch {
    pub received: Option<bool>,
    pub reserved: Option<bool>,
}

impl Validate for ItemPatchRequest {
    type Output = ItemPatch;

    fn validate(self) -> Result<ItemPatch, Vec<ValidationIssue>> {
        let mut issues = Issues::default();
        if self.received.is_none() && self.reserved.is_none() {
            issues.push("body", "Provide 'received' or 'reserved'");
        }
        if self.received == Some(true) && self.reserved == Some(true) {
            issues.push("reserved", "A received item cannot be reserved");
        }
        issues.finish(ItemPatch {
            received: self.received,
            reserved: self.reserved,
        })
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WeightUpdate {
    pub id: i64,
    pub weight: i64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BatchReweightRequest {
    pub updates: Vec<WeightUpdate>,
}

impl Validate for BatchReweightRequest {
    /// `(id, weight)` pairs with distinct ids
    type Output = Vec<(i64, i64)>;

    fn validate(self) -> Result<Self::Output, Vec<ValidationIssue>> {
        let mut issues = Issues::default();

        if self.updates.is_empty() || self.updates.len() > BATCH_MAX {
            issues.push("updates", format!("Must contain 1 to {BATCH_MAX} entries"));
        }

        let mut seen = HashSet::new();
        for (index, update) in self.updates.iter().enumerate() {
            if !seen.insert(update.id) {
                issues.push(
                    &format!("updates[{index}].id"),
                    format!("Duplicate id {}", update.id),
                );
            }
            issues.weight(&format!("updates[{index}].weight"), update.weight);
        }

        issues.finish(self.updates.iter().map(|u| (u.id, u.weight)).collect())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct BanRequest {
    #[serde(default)]
    pub visitor_id: Option<String>,
    #[serde(default)]
    pub ip: Option<String>,
    pub reason: BanReason,
    /// Omitted for a permanent ban
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

impl Validate for BanRequest {
    type Output = NewBan;

    fn validate(self) -> Result<NewBan, Vec<ValidationIssue>> {
        let mut issues = Issues::default();
        let visitor_id = non_empty(self.visitor_id);
        let ip = non_empty(self.ip);

        if visitor_id.is_none() && ip.is_none() {
            issues.push("body", "Provide 'visitorId' or 'ip'");
        }
        issues.optional_text("visitorId", visitor_id.as_deref(), VISITOR_ID_MAX);

        // Store the canonical textual form so lookups compare equal
        let ip = match ip.as_deref().map(str::parse::<IpAddr>) {
            Some(Ok(addr)) => Some(addr.to_string()),
            Some(Err(_)) => {
                issues.push("ip", "Not an IP address");
                None
            }
            None => None,
        };

        issues.finish(NewBan {
            visitor_id,
            ip,
            reason: self.reason,
            expires_at: self.expires_at,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ExchangeRateRequest {
    pub from_currency: String,
    pub to_currency: String,
    pub rate: f64,
}

impl Validate for ExchangeRateRequest {
    type Output = ExchangeRate;

    fn validate(self) -> Result<ExchangeRate, Vec<ValidationIssue>> {
        let mut issues = Issues::default();

        let from = self.from_currency.parse::<Currency>();
        let to = self.to_currency.parse::<Currency>();
        if from.is_err() {
            issues.push("fromCurrency", "Unsupported currency");
        }
        if to.is_err() {
            issues.push("toCurrency", "Unsupported currency");
        }
        if from.is_ok() && from == to {
            issues.push("toCurrency", "Must differ from 'fromCurrency'");
        }
        if !self.rate.is_finite() || self.rate <= 0.0 {
            issues.push("rate", "Must be a positive number");
        }

        issues.finish(ExchangeRate {
            from_currency: from.map(|c| c.code().to_string()).unwrap_or_default(),
            to_currency: to.map(|c| c.code().to_string()).unwrap_or_default(),
            rate: self.rate,
            updated_at: Utc::now(),
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ReserveRequest {
    pub item_id: i64,
    pub visitor_id: String,
}

impl Validate for ReserveRequest {
    type Output = Self;

    fn validate(self) -> Result<Self, Vec<ValidationIssue>> {
        let mut issues = Issues::default();
        issues.text("visitorId", self.visitor_id.trim(), 1, VISITOR_ID_MAX);
        issues.finish(self)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UnreserveRequest {
    pub item_id: i64,
    #[serde(default)]
    pub visitor_id: String,
    /// A missing token is refused by the reservation check, not here
    #[serde(default)]
    pub reservation_token: Option<String>,
}

impl Validate for UnreserveRequest {
    type Output = Self;

    fn validate(self) -> Result<Self, Vec<ValidationIssue>> {
        let mut issues = Issues::default();
        issues.text("visitorId", &self.visitor_id, 0, VISITOR_ID_MAX);
        issues.finish(self)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RegistrationOptionsRequest {
    #[serde(default)]
    pub setup_token: Option<String>,
}

impl Validate for RegistrationOptionsRequest {
    type Output = Option<String>;

    fn validate(self) -> Result<Option<String>, Vec<ValidationIssue>> {
        Ok(non_empty(self.setup_token))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn item_request(value: serde_json::Value) -> ItemRequest {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_item_request_minimal() {
        let fields = item_request(json!({"title": "  Kettle "})).validate().unwrap();
        assert_eq!(fields.title, "Kettle");
        assert_eq!(fields.weight, 0);
        assert!(fields.category.is_empty());
        assert_eq!(fields.image, None);
    }

    #[test]
    fn test_item_request_rejects_unknown_fields() {
        let result =
            serde_json::from_value::<ItemRequest>(json!({"title": "Kettle", "owner": "me"}));
        assert!(result.is_err());
    }

    #[test]
    fn test_item_request_rejects_unknown_priority() {
        let result =
            serde_json::from_value::<ItemRequest>(json!({"title": "Kettle", "priority": "urgent"}));
        assert!(result.is_err());
    }

    #[test]
    fn test_item_request_reports_every_issue() {
        let issues = item_request(json!({
            "title": "",
            "price": "x".repeat(51),
            "image": "javascript:alert(1)",
            "category": ["Home Office"],
            "weight": 1_000_001
        }))
        .validate()
        .unwrap_err();

        let fields: Vec<&str> = issues.iter().map(|i| i.field.as_str()).collect();
        assert!(fields.contains(&"title"));
        assert!(fields.contains(&"price"));
        assert!(fields.contains(&"image"));
        assert!(fields.contains(&"category"));
        assert!(fields.contains(&"weight"));
    }

    #[test]
    fn test_item_request_camel_case_fields() {
        let fields = item_request(json!({
            "title": "Tea set",
            "titleLocalized": "茶具",
            "descriptionLocalized": "",
            "image": "/uploads/tea.webp",
            "category": ["kitchen", "tea"],
            "priority": "high"
        }))
        .validate()
        .unwrap();
        assert_eq!(fields.title_localized.as_deref(), Some("茶具"));
        assert_eq!(fields.description_localized, None);
        assert_eq!(fields.priority, Some(Priority::High));
        assert_eq!(fields.image.as_deref(), Some("/uploads/tea.webp"));
    }

    #[test]
    fn test_patch_requires_a_change() {
        let empty: ItemPatchRequest = serde_json::from_value(json!({})).unwrap();
        assert!(empty.validate().is_err());

        let both: ItemPatchRequest =
            serde_json::from_value(json!({"received": true, "reserved": true})).unwrap();
        assert_eq!(both.validate().unwrap_err()[0].field, "reserved");

        let patch: ItemPatchRequest = serde_json::from_value(json!({"received": true})).unwrap();
        assert_eq!(
            patch.validate().unwrap(),
            ItemPatch {
                received: Some(true),
                reserved: None
            }
        );
    }

    #[test]
    fn test_batch_limits_and_duplicates() {
        let empty: BatchReweightRequest = serde_json::from_value(json!({"updates": []})).unwrap();
        assert!(empty.validate().is_err());

        let updates: Vec<_> = (0..101).map(|i| json!({"id": i, "weight": 0})).collect();
        let too_many: BatchReweightRequest =
            serde_json::from_value(json!({ "updates": updates })).unwrap();
        assert!(too_many.validate().is_err());

        let duplicate: BatchReweightRequest = serde_json::from_value(json!({
            "updates": [{"id": 1, "weight": 1}, {"id": 1, "weight": 2}]
        }))
        .unwrap();
        let issues = duplicate.validate().unwrap_err();
        assert_eq!(issues[0].field, "updates[1].id");

        let ok: BatchReweightRequest = serde_json::from_value(json!({
            "updates": [{"id": 1, "weight": -5}, {"id": 2, "weight": 5}]
        }))
        .unwrap();
        assert_eq!(ok.validate().unwrap(), vec![(1, -5), (2, 5)]);
    }

    #[test]
    fn test_ban_request_needs_identity_and_valid_ip() {
        let none: BanRequest = serde_json::from_value(json!({"reason": "spam"})).unwrap();
        assert!(none.validate().is_err());

        let bad_ip: BanRequest =
            serde_json::from_value(json!({"ip": "999.1.1.1", "reason": "spam"})).unwrap();
        assert_eq!(bad_ip.validate().unwrap_err()[0].field, "ip");

        let ok: BanRequest = serde_json::from_value(json!({
            "ip": "2001:DB8::1",
            "reason": "multi_account",
            "expiresAt": "2030-01-01T00:00:00Z"
        }))
        .unwrap();
        let ban = ok.validate().unwrap();
        assert_eq!(ban.ip.as_deref(), Some("2001:db8::1"));
        assert_eq!(ban.reason, BanReason::MultiAccount);
        assert!(ban.expires_at.is_some());
    }

    #[test]
    fn test_exchange_rate_request() {
        let ok: ExchangeRateRequest = serde_json::from_value(json!({
            "fromCurrency": "usd", "toCurrency": "CNY", "rate": 7.1
        }))
        .unwrap();
        let rate = ok.validate().unwrap();
        assert_eq!(rate.from_currency, "USD");

        let bad: ExchangeRateRequest = serde_json::from_value(json!({
            "fromCurrency": "JPY", "toCurrency": "CNY", "rate": -1.0
        }))
        .unwrap();
        assert_eq!(bad.validate().unwrap_err().len(), 2);
    }

    #[test]
    fn test_reserve_request_requires_visitor() {
        let req: ReserveRequest =
            serde_json::from_value(json!({"itemId": 3, "visitorId": "  "})).unwrap();
        assert!(req.validate().is_err());

        let extra =
            serde_json::from_value::<ReserveRequest>(json!({"itemId": 3, "visitorId": "v", "x": 1}));
        assert!(extra.is_err());
    }

    #[test]
    fn test_unreserve_token_is_optional_in_schema() {
        let req: UnreserveRequest =
            serde_json::from_value(json!({"itemId": 3, "visitorId": "v"})).unwrap();
        let req = req.validate().unwrap();
        assert_eq!(req.reservation_token, None);
    }
}
