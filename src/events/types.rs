//! Typed lifecycle events emitted by the engine.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Events the notification dispatcher consumes. The engine emits them after
/// the state change commits; delivery mechanics are an external concern.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum FulfillmentEvent {
    /// A sweep promoted one step to completed.
    StepCompleted {
        order_id: Uuid,
        store_id: String,
        customer_email: String,
        step_index: usize,
        step_name: String,
        completed_at: DateTime<Utc>,
        /// Order progress after this sweep's promotions.
        progress_percent: u8,
        /// True when this promotion finished the order.
        order_completed: bool,
    },
}

impl FulfillmentEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::StepCompleted { .. } => "step_completed",
        }
    }
}
