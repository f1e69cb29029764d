//! Server-rendered public wishlist page

use askama::Template;
use axum::{
    response::Html,
    routing::{Router, get},
};

use wishlist::{
    CoordinationError, ExchangeTable, ReservationStatus, WISHLIST_ROUTE_PREFIX, WishlistItem,
    exchange_table, format_cny_approx, list_public_items, reservation_map,
};

use crate::error::{ErrorResponse, IntoResponseError};

pub(crate) fn router() -> Router {
    Router::new().route("/wishlist", get(wishlist_page))
}

/// One card with both languages rendered up front
struct CardView {
    id: i64,
    title_en: String,
    title_zh: String,
    description_en: String,
    description_zh: String,
    price_en: String,
    price_zh: String,
    image: Option<String>,
    categories: String,
    priority: &'static str,
    /// `available`, `reserved` or `received`
    state: &'static str,
}

impl CardView {
    fn new(
        item: WishlistItem,
        reservation: Option<ReservationStatus>,
        table: &ExchangeTable,
    ) -> Self {
        let state = match (item.received, reservation) {
            (true, _) => "received",
            (false, Some(_)) => "reserved",
            (false, None) => "available",
        };
        let price_zh = format_cny_approx(&item.price, table).unwrap_or_else(|| item.price.clone());
        Self {
            id: item.id,
            title_zh: item.title_localized.unwrap_or_else(|| item.title.clone()),
            title_en: item.title,
            description_zh: item
                .description_localized
                .unwrap_or_else(|| item.description.clone()),
            description_en: item.description,
            price_en: item.price,
            price_zh,
            image: item.image,
            categories: item.category.join(" "),
            priority: item.priority.map(|p| p.as_str()).unwrap_or(""),
            state,
        }
    }
}

#[derive(Template)]
#[template(path = "wishlist.html")]
struct WishlistTemplate<'a> {
    cards: Vec<CardView>,
    api_prefix: &'a str,
}

async fn wishlist_page() -> Result<Html<String>, ErrorResponse> {
    let items = list_public_items().await.into_response_error()?;
    let reservations = reservation_map().await.into_response_error()?;
    let table = exchange_table().await.into_response_error()?;

    let cards = items
        .into_iter()
        .map(|item| {
            let reservation = reservations.get(&item.id).copied();
            CardView::new(item, reservation, &table)
        })
        .collect();

    let template = WishlistTemplate {
        cards,
        api_prefix: WISHLIST_ROUTE_PREFIX.as_str(),
    };
    let html = template.render().map_err(|e| {
        tracing::error!("Failed to render wishlist page: {}", e);
        ErrorResponse(CoordinationError::Internal(e.to_string()))
    })?;
    Ok(Html(html))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn item(received: bool) -> WishlistItem {
        WishlistItem {
            id: 7,
            title: "Kettle".to_string(),
            title_localized: Some("水壶".to_string()),
            price: "$64".to_string(),
            image: None,
            description: "Gooseneck".to_string(),
            description_localized: None,
            category: vec!["kitchen".to_string(), "coffee".to_string()],
            priority: None,
            received,
            weight: 0,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_card_view_precomputes_both_languages() {
        let card = CardView::new(item(false), None, &ExchangeTable::default());
        assert_eq!(card.title_en, "Kettle");
        assert_eq!(card.title_zh, "水壶");
        assert_eq!(card.price_en, "$64");
        assert_eq!(card.price_zh, "≈ ¥461");
        // No translation falls back to the original text
        assert_eq!(card.description_zh, "Gooseneck");
        assert_eq!(card.categories, "kitchen coffee");
        assert_eq!(card.state, "available");
    }

    #[test]
    fn test_card_state() {
        let table = ExchangeTable::default();
        let reserved = CardView::new(item(false), Some(ReservationStatus::Confirmed), &table);
        assert_eq!(reserved.state, "reserved");
        let received = CardView::new(item(true), Some(ReservationStatus::Reserved), &table);
        assert_eq!(received.state, "received");
    }

    #[test]
    fn test_template_escapes_and_carries_language_attributes() {
        let mut unsafe_item = item(false);
        unsafe_item.title = "<script>alert(1)</script>".to_string();
        let template = WishlistTemplate {
            cards: vec![CardView::new(unsafe_item, None, &ExchangeTable::default())],
            api_prefix: "/api",
        };
        let html = template.render().unwrap();
        assert!(!html.contains("<script>alert(1)</script>"));
        assert!(html.contains("data-item-id=\"7\""));
        assert!(html.contains("data-price-zh=\"≈ ¥461\""));
    }
}
