//! Order persistence contract.
//!
//! The engine assumes a generic document store with per-record optimistic
//! concurrency: every read returns a version token and every write is
//! conditional on it. The in-memory adapter in [`memory`] honors the full
//! contract and backs the test suite; production deployments supply their
//! own adapter over the same trait.

pub mod memory;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::future::Future;
use std::time::Duration;
use uuid::Uuid;

use crate::models::Order;

pub use memory::InMemoryOrderStore;

/// Store-level failures. `Conflict` is an internal scheduling detail the
/// advancer recovers from; the rest surface as unavailability.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Conditional write lost the race; carries both version tokens.
    #[error("version conflict on order {order_id}: expected {expected}, found {found}")]
    Conflict {
        order_id: Uuid,
        expected: u64,
        found: u64,
    },

    /// Unique `(store_id, external_order_id)` index rejected a second create.
    #[error("order already exists for store {store_id} with external id {external_order_id}")]
    Duplicate {
        store_id: String,
        external_order_id: String,
    },

    #[error("order store call exceeded {0:?}")]
    Timeout(Duration),

    #[error("order store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// An order together with its optimistic-concurrency version token.
///
/// The version increments on every committed update, so any consumer can
/// detect staleness (ETag-style) without the engine knowing how changes are
/// delivered.
#[derive(Debug, Clone, PartialEq)]
pub struct VersionedOrder {
    pub order: Order,
    pub version: u64,
}

/// Persistence abstraction for orders.
///
/// Writers: ingestion calls `create` exactly once per new external order;
/// the advancer is the sole caller of `update`. Each update must commit all
/// of an order's step-flag changes atomically so concurrent readers never
/// observe a torn promotion.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Persist a new order at version 1. Fails with [`StoreError::Duplicate`]
    /// if the `(store_id, external_order_id)` pair already exists.
    async fn create(&self, order: Order) -> StoreResult<VersionedOrder>;

    async fn get(&self, id: Uuid) -> StoreResult<Option<VersionedOrder>>;

    /// Idempotency lookup for webhook replay.
    async fn find_by_external_id(
        &self,
        store_id: &str,
        external_order_id: &str,
    ) -> StoreResult<Option<VersionedOrder>>;

    async fn list_by_store(&self, store_id: &str) -> StoreResult<Vec<VersionedOrder>>;

    /// Orders with at least one incomplete step whose `scheduled_at <= now`,
    /// oldest first, capped at `limit`.
    async fn find_with_due_steps(
        &self,
        now: DateTime<Utc>,
        limit: usize,
    ) -> StoreResult<Vec<VersionedOrder>>;

    /// Conditional write keyed on the version token; the stored record's
    /// version increments on success.
    async fn update(&self, expected_version: u64, order: Order) -> StoreResult<VersionedOrder>;
}

/// Wrap a store call in a deadline. No store operation in the engine is
/// allowed to block indefinitely; a timed-out order is skipped for the
/// current sweep.
pub async fn with_deadline<T, F>(limit: Duration, fut: F) -> StoreResult<T>
where
    F: Future<Output = StoreResult<T>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => Err(StoreError::Timeout(limit)),
    }
}
