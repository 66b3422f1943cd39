//! Shared state for the web surface.

use std::sync::Arc;
use std::time::Duration;

use crate::ingest::{ProductCatalog, WebhookIngestor};
use crate::store::OrderStore;

/// Everything the handlers need: the ingestor for webhook deliveries and
/// the store for the read surface.
#[derive(Clone)]
pub struct AppState {
    pub ingestor: Arc<WebhookIngestor>,
    pub store: Arc<dyn OrderStore>,
    pub store_timeout: Duration,
}

impl AppState {
    pub fn new(
        store: Arc<dyn OrderStore>,
        catalog: Arc<dyn ProductCatalog>,
        store_timeout: Duration,
    ) -> Self {
        let ingestor = Arc::new(WebhookIngestor::new(
            store.clone(),
            catalog,
            store_timeout,
        ));
        Self {
            ingestor,
            store,
            store_timeout,
        }
    }
}
