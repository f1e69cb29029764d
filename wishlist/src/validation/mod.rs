//! Strict request schemas and the checks applied to them before any mutation
//!
//! Every request type deserializes with unknown fields rejected and then runs
//! through [`Validate`], which turns it into the already-checked domain input
//! or the full list of problems found.

mod requests;
mod rules;

use serde::Serialize;

pub use requests::{
    BanRequest, BatchReweightRequest, ExchangeRateRequest, ItemPatch, ItemPatchRequest,
    ItemRequest, RegistrationOptionsRequest, ReserveRequest, UnreserveRequest, WeightUpdate,
};

/// One rejected field
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationIssue {
    pub field: String,
    pub message: String,
}

impl ValidationIssue {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

pub trait Validate {
    type Output;

    /// Checks every field and reports all issues at once
    fn validate(self) -> Result<Self::Output, Vec<ValidationIssue>>;
}
