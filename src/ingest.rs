//! Webhook ingestion.
//!
//! Validates an inbound commerce-order payload, resolves the target product
//! and its step template, and materializes a persisted order with absolute
//! step schedules anchored to ingestion time. Replaying the same
//! `(store_id, external_order_id)` returns the existing order unchanged,
//! making at-least-once webhook delivery safe.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{FulfillmentError, Result};
use crate::models::{CustomStep, Order, Product, StepStatus};
use crate::progress::{self, Progress};
use crate::store::{with_deadline, OrderStore, StoreError, VersionedOrder};

/// Product lookup seam. Product records (and their step templates) are
/// owned by an external catalog; the engine only reads them.
#[async_trait]
pub trait ProductCatalog: Send + Sync {
    async fn product(&self, product_id: &str) -> Result<Option<Product>>;
}

/// Map-backed catalog for tests and embedded deployments.
#[derive(Debug, Default)]
pub struct InMemoryProductCatalog {
    products: RwLock<HashMap<String, Product>>,
}

impl InMemoryProductCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, product: Product) {
        self.products.write().insert(product.id.clone(), product);
    }
}

#[async_trait]
impl ProductCatalog for InMemoryProductCatalog {
    async fn product(&self, product_id: &str) -> Result<Option<Product>> {
        Ok(self.products.read().get(product_id).cloned())
    }
}

/// Result of one webhook delivery.
#[derive(Debug, Clone)]
pub struct IngestOutcome {
    pub stored: VersionedOrder,
    pub progress: Progress,
    /// True when the payload matched an existing order (idempotent replay).
    pub replayed: bool,
}

/// Fields the engine actually requires from the commerce payload. The rest
/// is carried opaquely on the order's metadata.
#[derive(Debug)]
struct ExtractedPayload {
    external_order_id: String,
    external_order_number: Option<String>,
    customer_email: String,
    customer_name: Option<String>,
    metadata: Value,
}

/// Maps webhook deliveries to persisted orders.
pub struct WebhookIngestor {
    store: Arc<dyn OrderStore>,
    catalog: Arc<dyn ProductCatalog>,
    store_timeout: Duration,
}

impl WebhookIngestor {
    pub fn new(
        store: Arc<dyn OrderStore>,
        catalog: Arc<dyn ProductCatalog>,
        store_timeout: Duration,
    ) -> Self {
        Self {
            store,
            catalog,
            store_timeout,
        }
    }

    /// Ingest a webhook delivery anchored to the current time.
    pub async fn ingest(
        &self,
        product_id: &str,
        store_id: &str,
        payload: &Value,
    ) -> Result<IngestOutcome> {
        self.ingest_at(product_id, store_id, payload, Utc::now())
            .await
    }

    /// Ingest with an explicit anchor time. Step schedules are computed as
    /// `now + step duration` independently per step (each template entry
    /// declares "how long after order start", not "after the previous step").
    pub async fn ingest_at(
        &self,
        product_id: &str,
        store_id: &str,
        payload: &Value,
        now: DateTime<Utc>,
    ) -> Result<IngestOutcome> {
        let product = self.resolve_product(product_id, store_id).await?;
        if product.steps.is_empty() {
            return Err(FulfillmentError::InvalidTemplate(format!(
                "product {product_id} has no configured steps"
            )));
        }

        let extracted = extract_payload(payload)?;

        // Replay guard: at-least-once webhook delivery must never create a
        // duplicate order.
        if let Some(existing) = with_deadline(
            self.store_timeout,
            self.store
                .find_by_external_id(store_id, &extracted.external_order_id),
        )
        .await?
        {
            debug!(
                order_id = %existing.order.id,
                external_order_id = %extracted.external_order_id,
                "webhook replay matched existing order"
            );
            let progress = progress::compute(&existing.order.custom_steps);
            return Ok(IngestOutcome {
                stored: existing,
                progress,
                replayed: true,
            });
        }

        let order = materialize_order(&product, store_id, extracted, now);

        let stored = match with_deadline(self.store_timeout, self.store.create(order)).await {
            Ok(stored) => stored,
            // Two replays raced past the lookup; the index caught the second.
            Err(StoreError::Duplicate {
                store_id: s,
                external_order_id: e,
            }) => {
                warn!(store_id = %s, external_order_id = %e, "create lost replay race, returning existing order");
                let existing = with_deadline(
                    self.store_timeout,
                    self.store.find_by_external_id(&s, &e),
                )
                .await?
                .ok_or_else(|| {
                    StoreError::Unavailable(format!(
                        "order for external id {e} vanished after duplicate create"
                    ))
                })?;
                let progress = progress::compute(&existing.order.custom_steps);
                return Ok(IngestOutcome {
                    stored: existing,
                    progress,
                    replayed: true,
                });
            }
            Err(err) => return Err(err.into()),
        };

        let progress = progress::compute(&stored.order.custom_steps);
        info!(
            order_id = %stored.order.id,
            external_order_id = %stored.order.external_order_id,
            store_id,
            product_id,
            steps = stored.order.custom_steps.len(),
            progress = progress.percent,
            "order created from webhook"
        );

        Ok(IngestOutcome {
            stored,
            progress,
            replayed: false,
        })
    }

    async fn resolve_product(&self, product_id: &str, store_id: &str) -> Result<Product> {
        let product = self
            .catalog
            .product(product_id)
            .await?
            .ok_or_else(|| FulfillmentError::NotFound(format!("unknown product {product_id}")))?;
        if !product.active {
            return Err(FulfillmentError::NotFound(format!(
                "product {product_id} is inactive"
            )));
        }
        if product.store_id != store_id {
            // Collapse ownership mismatch into NotFound; the caller has no
            // business learning the product exists under another store.
            return Err(FulfillmentError::NotFound(format!(
                "product {product_id} not found for store {store_id}"
            )));
        }
        Ok(product)
    }
}

/// Copy the product template into a step timeline and assemble the order.
fn materialize_order(
    product: &Product,
    store_id: &str,
    extracted: ExtractedPayload,
    now: DateTime<Utc>,
) -> Order {
    let custom_steps: Vec<CustomStep> = product
        .steps
        .iter()
        .enumerate()
        .map(|(i, entry)| CustomStep {
            name: entry.name.clone(),
            description: entry.description.clone(),
            duration: entry.duration,
            scheduled_at: now + entry.duration.as_offset(),
            // A zero-duration first step is visibly in progress from the
            // start; everything else waits for the advancer. Completion is
            // never performed inline at ingestion.
            status: if i == 0 && entry.duration.is_zero() {
                StepStatus::Current
            } else {
                StepStatus::Pending
            },
        })
        .collect();

    Order {
        id: Uuid::new_v4(),
        external_order_id: extracted.external_order_id,
        external_order_number: extracted.external_order_number,
        store_id: store_id.to_string(),
        product_id: product.id.clone(),
        customer_email: extracted.customer_email,
        customer_name: extracted.customer_name,
        metadata: extracted.metadata,
        created_at: now,
        custom_steps,
    }
}

/// Pull the required fields out of the raw payload, tolerating the
/// provider's field variants (`order.id` vs `order.number`, `order.email`
/// vs `order.customer.email`).
fn extract_payload(payload: &Value) -> Result<ExtractedPayload> {
    let order = payload
        .get("order")
        .filter(|v| v.is_object())
        .ok_or_else(|| FulfillmentError::InvalidPayload("missing order object".to_string()))?;

    let external_order_id = order
        .get("id")
        .and_then(json_identifier)
        .or_else(|| order.get("number").and_then(json_identifier))
        .ok_or_else(|| {
            FulfillmentError::InvalidPayload("missing external order identifier".to_string())
        })?;

    let external_order_number = order
        .get("number")
        .or_else(|| order.get("order_number"))
        .and_then(json_identifier);

    let customer = order.get("customer");
    let customer_email = order
        .get("email")
        .and_then(Value::as_str)
        .or_else(|| customer.and_then(|c| c.get("email")).and_then(Value::as_str))
        .filter(|s| !s.trim().is_empty())
        .map(str::to_string)
        .ok_or_else(|| FulfillmentError::InvalidPayload("missing customer email".to_string()))?;

    let customer_name = customer.and_then(|c| {
        let first = c.get("first_name").and_then(Value::as_str).unwrap_or("");
        let last = c.get("last_name").and_then(Value::as_str).unwrap_or("");
        let full = format!("{first} {last}").trim().to_string();
        (!full.is_empty()).then_some(full)
    });

    Ok(ExtractedPayload {
        external_order_id,
        external_order_number,
        customer_email,
        customer_name,
        metadata: order.clone(),
    })
}

/// External identifiers arrive as numbers or strings depending on provider.
fn json_identifier(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
