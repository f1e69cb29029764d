use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Zh,
}

/// A string rendered ahead of time for every supported language
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LocalizedText {
    pub en: String,
    pub zh: String,
}

impl LocalizedText {
    pub fn new(en: impl Into<String>, zh: impl Into<String>) -> Self {
        Self {
            en: en.into(),
            zh: zh.into(),
        }
    }

    pub fn get(&self, language: Language) -> &str {
        match language {
            Language::En => &self.en,
            Language::Zh => &self.zh,
        }
    }
}

/// What the reservation button offers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonState {
    Available,
    /// Reserved from this browser; pressing cancels
    ReservedByMe,
    ReservedByOther,
    Received,
}

impl ButtonState {
    pub(super) fn label(&self, language: Language) -> &'static str {
        match (self, language) {
            (ButtonState::Available, Language::En) => "Reserve",
            (ButtonState::Available, Language::Zh) => "预订",
            (ButtonState::ReservedByMe, Language::En) => "Cancel reservation",
            (ButtonState::ReservedByMe, Language::Zh) => "取消预订",
            (ButtonState::ReservedByOther, Language::En) => "Reserved",
            (ButtonState::ReservedByOther, Language::Zh) => "已被预订",
            (ButtonState::Received, Language::En) => "Received",
            (ButtonState::Received, Language::Zh) => "已收到",
        }
    }
}

/// Every visible property of a reservation button
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ButtonView {
    pub state: ButtonState,
    pub label: String,
    pub disabled: bool,
    /// A request for this button is in flight
    pub pending: bool,
}

impl ButtonView {
    pub fn new(state: ButtonState, language: Language) -> Self {
        Self {
            state,
            label: state.label(language).to_string(),
            disabled: matches!(state, ButtonState::ReservedByOther | ButtonState::Received),
            pending: false,
        }
    }

    pub(super) fn relabel(&mut self, language: Language) {
        self.label = self.state.label(language).to_string();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Error,
}

/// Transient message shown after a button press
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub item_id: i64,
    pub message: String,
}
