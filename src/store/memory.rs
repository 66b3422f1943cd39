//! In-memory order store.
//!
//! DashMap-backed adapter honoring the full [`OrderStore`] contract,
//! including the unique external-id index and conditional writes. Each
//! order's record is replaced in a single map operation, so readers see
//! either the pre- or post-update state, never a torn intermediate.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use uuid::Uuid;

use super::{OrderStore, StoreError, StoreResult, VersionedOrder};
use crate::models::Order;

#[derive(Debug, Default)]
pub struct InMemoryOrderStore {
    orders: DashMap<Uuid, VersionedOrder>,
    /// `(store_id, external_order_id)` -> order id, for idempotent ingestion.
    external_index: DashMap<(String, String), Uuid>,
}

impl InMemoryOrderStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn create(&self, order: Order) -> StoreResult<VersionedOrder> {
        let key = (order.store_id.clone(), order.external_order_id.clone());
        // The entry API makes the index reservation atomic under replay
        // races. The record is inserted before the index entry is published,
        // so an index hit always resolves to a stored record.
        match self.external_index.entry(key) {
            Entry::Occupied(_) => Err(StoreError::Duplicate {
                store_id: order.store_id.clone(),
                external_order_id: order.external_order_id.clone(),
            }),
            Entry::Vacant(slot) => {
                let versioned = VersionedOrder { order, version: 1 };
                self.orders.insert(versioned.order.id, versioned.clone());
                slot.insert(versioned.order.id);
                Ok(versioned)
            }
        }
    }

    async fn get(&self, id: Uuid) -> StoreResult<Option<VersionedOrder>> {
        Ok(self.orders.get(&id).map(|entry| entry.value().clone()))
    }

    async fn find_by_external_id(
        &self,
        store_id: &str,
        external_order_id: &str,
    ) -> StoreResult<Option<VersionedOrder>> {
        let key = (store_id.to_string(), external_order_id.to_string());
        let Some(id) = self.external_index.get(&key).map(|entry| *entry.value()) else {
            return Ok(None);
        };
        Ok(self.orders.get(&id).map(|entry| entry.value().clone()))
    }

    async fn list_by_store(&self, store_id: &str) -> StoreResult<Vec<VersionedOrder>> {
        let mut orders: Vec<VersionedOrder> = self
            .orders
            .iter()
            .filter(|entry| entry.order.store_id == store_id)
            .map(|entry| entry.value().clone())
            .collect();
        orders.sort_by_key(|v| v.order.created_at);
        Ok(orders)
    }

    async fn find_with_due_steps(
        &self,
        now: DateTime<Utc>,
        limit: usize,
    ) -> StoreResult<Vec<VersionedOrder>> {
        let mut due: Vec<VersionedOrder> = self
            .orders
            .iter()
            .filter(|entry| entry.order.has_due_step(now))
            .map(|entry| entry.value().clone())
            .collect();
        due.sort_by_key(|v| v.order.created_at);
        due.truncate(limit);
        Ok(due)
    }

    async fn update(&self, expected_version: u64, order: Order) -> StoreResult<VersionedOrder> {
        // get_mut holds the shard write lock, making compare-and-swap atomic
        // with respect to concurrent readers and racing sweeps.
        let Some(mut entry) = self.orders.get_mut(&order.id) else {
            return Err(StoreError::Unavailable(format!(
                "order {} disappeared from store",
                order.id
            )));
        };
        if entry.version != expected_version {
            return Err(StoreError::Conflict {
                order_id: order.id,
                expected: expected_version,
                found: entry.version,
            });
        }
        entry.order = order;
        entry.version += 1;
        Ok(entry.clone())
    }
}
