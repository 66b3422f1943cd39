//! Shared factories for the integration suite.

// Not every test binary exercises every helper.
#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};

use fulfillment_core::advancer::{AdvancerConfig, StepAdvancer};
use fulfillment_core::events::EventPublisher;
use fulfillment_core::ingest::{InMemoryProductCatalog, WebhookIngestor};
use fulfillment_core::models::{Product, StepDuration, StepTemplateEntry, TimeUnit};
use fulfillment_core::store::InMemoryOrderStore;

pub const STORE_ID: &str = "store-1";
pub const PRODUCT_ID: &str = "prod-1";

/// Product with the given `(name, value, unit)` template entries.
pub fn product(steps: &[(&str, i64, TimeUnit)]) -> Product {
    Product {
        id: PRODUCT_ID.to_string(),
        store_id: STORE_ID.to_string(),
        display_name: "Burn Jaro - 6 bottles".to_string(),
        active: true,
        steps: steps
            .iter()
            .map(|(name, value, unit)| {
                StepTemplateEntry::new(*name, StepDuration::new(*value, *unit))
            })
            .collect(),
    }
}

/// The two-step packing/shipping template used across the suite.
pub fn pack_and_ship_product() -> Product {
    product(&[("Pack", 1, TimeUnit::Hours), ("Ship", 1, TimeUnit::Days)])
}

/// Realistic commerce-order payload in the shape the provider delivers.
pub fn order_paid_payload(external_id: u64, email: &str) -> Value {
    json!({
        "event": "order.paid",
        "order": {
            "id": external_id,
            "number": format!("#{external_id}"),
            "email": email,
            "customer": {
                "first_name": "Maria",
                "last_name": "Silva",
                "phone": "+1 555 0100"
            },
            "line_items": [
                {"title": "Burn Jaro - 6 bottles", "sku": "BJ-6", "quantity": 1, "price": "179.82"}
            ],
            "address": {
                "address1": "100 Main St",
                "city": "Austin",
                "province": "TX",
                "zip": "78701",
                "country": "United States"
            },
            "payment_type": "credit_card"
        }
    })
}

pub struct TestEngine {
    pub store: Arc<InMemoryOrderStore>,
    pub catalog: Arc<InMemoryProductCatalog>,
    pub ingestor: WebhookIngestor,
    pub advancer: StepAdvancer,
    pub publisher: EventPublisher,
}

/// Wire an engine around an in-memory store with the given products.
pub fn engine_with_products(products: Vec<Product>) -> TestEngine {
    let store = Arc::new(InMemoryOrderStore::new());
    let catalog = Arc::new(InMemoryProductCatalog::new());
    for product in products {
        catalog.insert(product);
    }

    let publisher = EventPublisher::new(64);
    let ingestor = WebhookIngestor::new(store.clone(), catalog.clone(), Duration::from_secs(2));
    let advancer = StepAdvancer::new(
        store.clone(),
        publisher.clone(),
        AdvancerConfig {
            sweep_interval: Duration::from_millis(50),
            store_timeout: Duration::from_secs(2),
            max_orders_per_sweep: 100,
        },
    );

    TestEngine {
        store,
        catalog,
        ingestor,
        advancer,
        publisher,
    }
}
