use std::collections::HashMap;

use crate::catalog::{ExchangeTable, ReservationStatus, WishlistItem, format_cny_approx};

use super::api::{ApiError, ReservationApi};
use super::command::{CommandKind, ReservationCommand};
use super::storage::{TokenStorage, token_key, visitor_id};
use super::types::{ButtonState, ButtonView, Language, LocalizedText, Notice, NoticeKind};

/// One item card as the page renders it
#[derive(Debug, Clone, PartialEq)]
pub struct ItemCard {
    pub item_id: i64,
    pub title: LocalizedText,
    pub price: LocalizedText,
    pub received: bool,
    pub button: ButtonView,
}

impl ItemCard {
    fn from_item(item: &WishlistItem, table: &ExchangeTable, language: Language) -> Self {
        let title_zh = item
            .title_localized
            .clone()
            .unwrap_or_else(|| item.title.clone());
        let price_zh = format_cny_approx(&item.price, table).unwrap_or_else(|| item.price.clone());
        Self {
            item_id: item.id,
            title: LocalizedText::new(item.title.clone(), title_zh),
            price: LocalizedText::new(item.price.clone(), price_zh),
            received: item.received,
            button: ButtonView::new(ButtonState::Available, language),
        }
    }
}

/// Drives the reservation buttons of the public list
pub struct ReservationController<A, S> {
    api: A,
    storage: S,
    visitor_id: String,
    language: Language,
    cards: Vec<ItemCard>,
    notices: Vec<Notice>,
}

impl<A: ReservationApi, S: TokenStorage> ReservationController<A, S> {
    pub fn new(
        api: A,
        storage: S,
        items: &[WishlistItem],
        table: &ExchangeTable,
        reservations: &HashMap<i64, ReservationStatus>,
    ) -> Self {
        let visitor_id = visitor_id(&storage);
        let language = Language::default();
        let cards = items
            .iter()
            .map(|item| ItemCard::from_item(item, table, language))
            .collect();

        let mut controller = Self {
            api,
            storage,
            visitor_id,
            language,
            cards,
            notices: Vec::new(),
        };
        controller.sync_buttons(reservations);
        controller
    }

    pub fn cards(&self) -> &[ItemCard] {
        &self.cards
    }

    pub fn card(&self, item_id: i64) -> Option<&ItemCard> {
        self.cards.iter().find(|card| card.item_id == item_id)
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn visitor_id(&self) -> &str {
        &self.visitor_id
    }

    /// Drains the notices raised since the last call
    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    /// Switches every card's labels without touching the network
    pub fn set_language(&mut self, language: Language) {
        self.language = language;
        for card in &mut self.cards {
            card.button.relabel(language);
        }
    }

    /// Reserves or cancels depending on the button's current state
    ///
    /// Presses on disabled or in-flight buttons are ignored.
    pub async fn press(&mut self, item_id: i64) {
        let language = self.language;
        let Some(card) = self.cards.iter_mut().find(|card| card.item_id == item_id) else {
            return;
        };
        if card.button.disabled || card.button.pending {
            return;
        }

        let mut command = match card.button.state {
            ButtonState::Available => ReservationCommand::reserve(item_id),
            ButtonState::ReservedByMe => ReservationCommand::unreserve(item_id),
            ButtonState::ReservedByOther | ButtonState::Received => return,
        };
        command.apply(&mut card.button, language);

        let result = self.execute(&command).await;

        let Some(card) = self.cards.iter_mut().find(|card| card.item_id == item_id) else {
            return;
        };
        match result {
            Ok(()) => {
                command.commit(&mut card.button);
                self.notices.push(Notice {
                    kind: NoticeKind::Success,
                    item_id,
                    message: success_message(command.kind, language).to_string(),
                });
            }
            Err(err) => {
                command.rollback(&mut card.button);
                tracing::debug!("Reservation command for item {} failed: {}", item_id, err);
                self.notices.push(Notice {
                    kind: NoticeKind::Error,
                    item_id,
                    message: error_message(&err, language),
                });
                if command.kind == CommandKind::Reserve && err.is_forbidden() {
                    self.resync().await;
                }
            }
        }
    }

    async fn execute(&self, command: &ReservationCommand) -> Result<(), ApiError> {
        let key = token_key(command.item_id);
        match command.kind {
            CommandKind::Reserve => {
                let token = self.api.reserve(command.item_id, &self.visitor_id).await?;
                self.storage.set(&key, &token);
            }
            CommandKind::Unreserve => {
                let token = self.storage.get(&key);
                self.api
                    .unreserve(command.item_id, &self.visitor_id, token.as_deref())
                    .await?;
                self.storage.remove(&key);
            }
        }
        Ok(())
    }

    /// Re-fetches the reservation map and redraws every button from it
    pub async fn resync(&mut self) {
        match self.api.reservation_map().await {
            Ok(map) => self.sync_buttons(&map),
            Err(err) => tracing::warn!("Failed to refresh reservations: {}", err),
        }
    }

    fn sync_buttons(&mut self, reservations: &HashMap<i64, ReservationStatus>) {
        for card in &mut self.cards {
            let key = token_key(card.item_id);
            let state = if card.received {
                ButtonState::Received
            } else if reservations.contains_key(&card.item_id) {
                if self.storage.get(&key).is_some() {
                    ButtonState::ReservedByMe
                } else {
                    ButtonState::ReservedByOther
                }
            } else {
                // A token for an item nobody holds is stale
                self.storage.remove(&key);
                ButtonState::Available
            };
            card.button = ButtonView::new(state, self.language);
        }
    }
}

fn success_message(kind: CommandKind, language: Language) -> &'static str {
    match (kind, language) {
        (CommandKind::Reserve, Language::En) => "Reserved. Thank you!",
        (CommandKind::Reserve, Language::Zh) => "预订成功，谢谢！",
        (CommandKind::Unreserve, Language::En) => "Reservation cancelled",
        (CommandKind::Unreserve, Language::Zh) => "已取消预订",
    }
}

fn error_message(err: &ApiError, language: Language) -> String {
    match (err, language) {
        (ApiError::Status { message, .. }, _) if !message.is_empty() => message.clone(),
        (_, Language::En) => "Something went wrong, please try again".to_string(),
        (_, Language::Zh) => "出错了，请重试".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::storage::MemoryTokenStorage;
    use async_trait::async_trait;
    use chrono::Utc;
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeApi {
        reserve_result: Mutex<Option<Result<String, ApiError>>>,
        unreserve_result: Mutex<Option<Result<(), ApiError>>>,
        map: Mutex<HashMap<i64, ReservationStatus>>,
        map_calls: Mutex<usize>,
        unreserve_tokens: Mutex<Vec<Option<String>>>,
    }

    #[async_trait]
    impl ReservationApi for FakeApi {
        async fn reserve(&self, _item_id: i64, _visitor_id: &str) -> Result<String, ApiError> {
            self.reserve_result
                .lock()
                .unwrap()
                .clone()
                .unwrap_or_else(|| Ok("token-1".to_string()))
        }

        async fn unreserve(
            &self,
            _item_id: i64,
            _visitor_id: &str,
            reservation_token: Option<&str>,
        ) -> Result<(), ApiError> {
            self.unreserve_tokens
                .lock()
                .unwrap()
                .push(reservation_token.map(str::to_string));
            self.unreserve_result.lock().unwrap().clone().unwrap_or(Ok(()))
        }

        async fn reservation_map(&self) -> Result<HashMap<i64, ReservationStatus>, ApiError> {
            *self.map_calls.lock().unwrap() += 1;
            Ok(self.map.lock().unwrap().clone())
        }
    }

    fn item(id: i64, price: &str, received: bool) -> WishlistItem {
        WishlistItem {
            id,
            title: format!("Item {id}"),
            title_localized: None,
            price: price.to_string(),
            image: None,
            description: String::new(),
            description_localized: None,
            category: Vec::new(),
            priority: None,
            received,
            weight: 0,
            created_at: Utc::now(),
        }
    }

    fn controller(
        api: FakeApi,
        storage: MemoryTokenStorage,
        reservations: &HashMap<i64, ReservationStatus>,
    ) -> ReservationController<FakeApi, MemoryTokenStorage> {
        let items = vec![item(1, "$64", false), item(2, "some price", false), item(3, "$5", true)];
        ReservationController::new(
            api,
            storage,
            &items,
            &ExchangeTable::default(),
            reservations,
        )
    }

    #[test]
    fn test_initial_button_states() {
        let api = FakeApi::default();
        let storage = MemoryTokenStorage::new();
        storage.set(&token_key(2), "mine");
        let reservations = HashMap::from([(2, ReservationStatus::Reserved)]);

        let c = controller(api, storage, &reservations);
        assert_eq!(c.card(1).unwrap().button.state, ButtonState::Available);
        assert_eq!(c.card(2).unwrap().button.state, ButtonState::ReservedByMe);
        assert_eq!(c.card(3).unwrap().button.state, ButtonState::Received);
        assert!(c.card(3).unwrap().button.disabled);
    }

    #[test]
    fn test_reservation_by_someone_else_is_disabled() {
        let api = FakeApi::default();
        let reservations = HashMap::from([(1, ReservationStatus::Confirmed)]);
        let c = controller(api, MemoryTokenStorage::new(), &reservations);
        let button = &c.card(1).unwrap().button;
        assert_eq!(button.state, ButtonState::ReservedByOther);
        assert!(button.disabled);
    }

    #[tokio::test]
    async fn test_reserve_success_stores_token() {
        let api = FakeApi::default();
        let mut c = controller(api, MemoryTokenStorage::new(), &HashMap::new());

        c.press(1).await;

        let button = &c.card(1).unwrap().button;
        assert_eq!(button.state, ButtonState::ReservedByMe);
        assert!(!button.pending);
        assert!(!button.disabled);
        assert_eq!(c.storage.get(&token_key(1)).as_deref(), Some("token-1"));
        let notices = c.take_notices();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].kind, NoticeKind::Success);
        assert!(c.take_notices().is_empty());
    }

    #[tokio::test]
    async fn test_failed_reserve_rolls_back() {
        let api = FakeApi::default();
        *api.reserve_result.lock().unwrap() = Some(Err(ApiError::Status {
            status: 409,
            message: "Item is already reserved".to_string(),
        }));
        let mut c = controller(api, MemoryTokenStorage::new(), &HashMap::new());
        let before = c.card(1).unwrap().button.clone();

        c.press(1).await;

        assert_eq!(c.card(1).unwrap().button, before);
        assert_eq!(c.storage.get(&token_key(1)), None);
        let notices = c.take_notices();
        assert_eq!(notices[0].kind, NoticeKind::Error);
        assert_eq!(notices[0].message, "Item is already reserved");
        // Only a forbidden reserve triggers a refresh
        assert_eq!(*c.api.map_calls.lock().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_forbidden_reserve_resyncs_every_card() {
        let api = FakeApi::default();
        *api.reserve_result.lock().unwrap() = Some(Err(ApiError::Status {
            status: 403,
            message: "Reservations are not available".to_string(),
        }));
        *api.map.lock().unwrap() = HashMap::from([(2, ReservationStatus::Reserved)]);
        let mut c = controller(api, MemoryTokenStorage::new(), &HashMap::new());

        c.press(1).await;

        assert_eq!(*c.api.map_calls.lock().unwrap(), 1);
        assert_eq!(c.card(1).unwrap().button.state, ButtonState::Available);
        assert_eq!(c.card(2).unwrap().button.state, ButtonState::ReservedByOther);
    }

    #[tokio::test]
    async fn test_unreserve_sends_token_and_clears_it() {
        let api = FakeApi::default();
        let storage = MemoryTokenStorage::new();
        storage.set(&token_key(1), "saved-token");
        let reservations = HashMap::from([(1, ReservationStatus::Reserved)]);
        let mut c = controller(api, storage, &reservations);

        c.press(1).await;

        assert_eq!(
            c.api.unreserve_tokens.lock().unwrap().as_slice(),
            &[Some("saved-token".to_string())]
        );
        assert_eq!(c.card(1).unwrap().button.state, ButtonState::Available);
        assert_eq!(c.storage.get(&token_key(1)), None);
    }

    #[tokio::test]
    async fn test_failed_unreserve_keeps_token() {
        let api = FakeApi::default();
        *api.unreserve_result.lock().unwrap() = Some(Err(ApiError::Network("offline".into())));
        let storage = MemoryTokenStorage::new();
        storage.set(&token_key(1), "saved-token");
        let reservations = HashMap::from([(1, ReservationStatus::Reserved)]);
        let mut c = controller(api, storage, &reservations);

        c.press(1).await;

        assert_eq!(c.card(1).unwrap().button.state, ButtonState::ReservedByMe);
        assert_eq!(c.storage.get(&token_key(1)).as_deref(), Some("saved-token"));
        assert_eq!(
            c.take_notices()[0].message,
            "Something went wrong, please try again"
        );
    }

    #[tokio::test]
    async fn test_presses_on_received_items_are_ignored() {
        let api = FakeApi::default();
        let mut c = controller(api, MemoryTokenStorage::new(), &HashMap::new());
        c.press(3).await;
        c.press(99).await;
        assert!(c.take_notices().is_empty());
    }

    #[test]
    fn test_language_toggle_uses_precomputed_text() {
        let api = FakeApi::default();
        let mut c = controller(api, MemoryTokenStorage::new(), &HashMap::new());

        c.set_language(Language::Zh);
        let card = c.card(1).unwrap();
        assert_eq!(card.button.label, "预订");
        assert!(card.price.get(Language::Zh).starts_with("≈ ¥"));
        assert_eq!(card.price.get(Language::En), "$64");
        // Unparseable prices fall back to the original text
        assert_eq!(c.card(2).unwrap().price.get(Language::Zh), "some price");

        c.set_language(Language::En);
        assert_eq!(c.card(1).unwrap().button.label, "Reserve");
        assert_eq!(*c.api.map_calls.lock().unwrap(), 0);
    }
}
