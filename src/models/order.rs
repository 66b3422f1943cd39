//! Order model.
//!
//! One order is created per webhook event and owns an ordered list of custom
//! steps. Step order is significant: it defines both display order and
//! advancement order. Order status is derived from the steps, never stored
//! redundantly.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::step::{CustomStep, StepStatus};

/// Derived order status: `completed` iff every step is completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    InProgress,
    Completed,
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InProgress => write!(f, "in_progress"),
            Self::Completed => write!(f, "completed"),
        }
    }
}

/// One fulfillment record created from a single webhook event.
///
/// `external_order_id` comes from the commerce payload and, together with
/// `store_id`, is the idempotency key for webhook replay. Commerce metadata
/// (line items, address, payment) is carried opaquely and never interpreted
/// by the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: Uuid,
    pub external_order_id: String,
    pub external_order_number: Option<String>,
    pub store_id: String,
    pub product_id: String,
    pub customer_email: String,
    pub customer_name: Option<String>,
    /// Pass-through commerce payload; opaque to the engine.
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
    /// Ordered timeline; non-empty once created, names/durations immutable.
    pub custom_steps: Vec<CustomStep>,
}

impl Order {
    pub fn status(&self) -> OrderStatus {
        if self.is_completed() {
            OrderStatus::Completed
        } else {
            OrderStatus::InProgress
        }
    }

    pub fn is_completed(&self) -> bool {
        self.custom_steps.iter().all(CustomStep::is_completed)
    }

    /// Index of the step currently marked `Current`, if any.
    pub fn current_step_index(&self) -> Option<usize> {
        self.custom_steps.iter().position(CustomStep::is_current)
    }

    /// Index of the earliest step that is not yet completed.
    pub fn first_incomplete_index(&self) -> Option<usize> {
        self.custom_steps.iter().position(|s| !s.is_completed())
    }

    /// Whether any incomplete step's scheduled time has elapsed. Drives the
    /// advancer's scan; promotion eligibility is decided per step.
    pub fn has_due_step(&self, now: DateTime<Utc>) -> bool {
        self.custom_steps.iter().any(|s| s.is_due(now))
    }

    pub fn completed_step_count(&self) -> usize {
        self.custom_steps
            .iter()
            .filter(|s| s.is_completed())
            .count()
    }

    /// Structural invariants maintained by ingestion and the advancer:
    /// at most one current step, and completed steps form a prefix.
    /// Exposed for assertions in tests and store adapters.
    pub fn check_invariants(&self) -> std::result::Result<(), String> {
        if self.custom_steps.is_empty() {
            return Err("order has no steps".to_string());
        }
        let current_count = self
            .custom_steps
            .iter()
            .filter(|s| s.is_current())
            .count();
        if current_count > 1 {
            return Err(format!("{current_count} steps are marked current"));
        }
        let mut seen_incomplete = false;
        for (i, step) in self.custom_steps.iter().enumerate() {
            match step.status {
                StepStatus::Completed { .. } if seen_incomplete => {
                    return Err(format!("step {i} completed after an incomplete step"));
                }
                StepStatus::Completed { .. } => {}
                _ => seen_incomplete = true,
            }
        }
        Ok(())
    }
}
