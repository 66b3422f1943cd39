//! Structured error taxonomy for the fulfillment engine.
//!
//! Ingestion errors (`InvalidPayload`, `NotFound`, `InvalidTemplate`) are
//! synchronous and surfaced to the webhook caller. Store errors reach the
//! advancer asynchronously and are recovered there: conflicts retry once
//! against fresh state, timeouts skip the order until the next sweep.

use crate::store::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum FulfillmentError {
    /// Webhook body is missing a required field (external order id or email).
    #[error("invalid payload: {0}")]
    InvalidPayload(String),

    /// Unknown or inactive product/store, or an order id that resolves to nothing.
    #[error("not found: {0}")]
    NotFound(String),

    /// Product has no configured steps; an order must carry at least one.
    #[error("invalid template: {0}")]
    InvalidTemplate(String),

    /// Order store failure (conflict, timeout, unavailable).
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("configuration error: {0}")]
    Configuration(String),
}

impl FulfillmentError {
    /// Stable machine-readable code for the API surface and logs.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidPayload(_) => "invalid_payload",
            Self::NotFound(_) => "not_found",
            Self::InvalidTemplate(_) => "invalid_template",
            Self::Store(StoreError::Conflict { .. }) => "conflict",
            Self::Store(StoreError::Timeout(_)) => "timeout",
            Self::Store(_) => "store_unavailable",
            Self::Configuration(_) => "configuration_error",
        }
    }
}

pub type Result<T> = std::result::Result<T, FulfillmentError>;
