//! Product-level step templates.
//!
//! A product owns an ordered list of template entries; ingestion copies them
//! positionally into a new order's custom steps, resolving each relative
//! duration to an absolute `scheduled_at`. Templates are read-only to this
//! engine: product CRUD lives elsewhere.

use serde::{Deserialize, Serialize};

use super::step::StepDuration;

/// One entry of a product's fulfillment blueprint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepTemplateEntry {
    pub name: String,
    pub description: Option<String>,
    /// How long after order start this step is scheduled.
    pub duration: StepDuration,
}

impl StepTemplateEntry {
    pub fn new(name: impl Into<String>, duration: StepDuration) -> Self {
        Self {
            name: name.into(),
            description: None,
            duration,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Product record as seen by the engine: ownership, activation flag, and
/// the step template. Everything else about a product is presentation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub store_id: String,
    pub display_name: String,
    pub active: bool,
    pub steps: Vec<StepTemplateEntry>,
}
