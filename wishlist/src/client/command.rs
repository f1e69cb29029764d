//! Optimistic button mutations that remember how to undo themselves

use super::types::{ButtonState, ButtonView, Language};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    Reserve,
    Unreserve,
}

#[derive(Debug, Clone)]
pub struct ReservationCommand {
    pub kind: CommandKind,
    pub item_id: i64,
    snapshot: Option<ButtonView>,
}

impl ReservationCommand {
    pub fn reserve(item_id: i64) -> Self {
        Self {
            kind: CommandKind::Reserve,
            item_id,
            snapshot: None,
        }
    }

    pub fn unreserve(item_id: i64) -> Self {
        Self {
            kind: CommandKind::Unreserve,
            item_id,
            snapshot: None,
        }
    }

    /// Shows the expected outcome right away and keeps the previous view
    pub fn apply(&mut self, view: &mut ButtonView, language: Language) {
        self.snapshot = Some(view.clone());

        view.state = match self.kind {
            CommandKind::Reserve => ButtonState::ReservedByMe,
            CommandKind::Unreserve => ButtonState::Available,
        };
        view.relabel(language);
        view.pending = true;
        view.disabled = true;
    }

    /// Restores the view captured by `apply`; a no-op if `apply` never ran
    pub fn rollback(&mut self, view: &mut ButtonView) {
        if let Some(snapshot) = self.snapshot.take() {
            *view = snapshot;
        }
    }

    /// Keeps the optimistic state and re-enables the button
    pub fn commit(&mut self, view: &mut ButtonView) {
        self.snapshot = None;
        view.pending = false;
        view.disabled = false;
    }
}
