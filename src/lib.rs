#![allow(clippy::doc_markdown)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]

//! # Fulfillment Core
//!
//! Order fulfillment timeline engine: ingests commerce-order webhooks,
//! materializes orders with scheduled custom steps, and advances those
//! steps on a fixed interval as their time arrives.
//!
//! ## Architecture
//!
//! - A webhook delivery names a product and store; the product's step
//!   template (relative durations) is copied into a new order with absolute
//!   `scheduled_at` timestamps anchored to ingestion time. Replaying the
//!   same external order id is idempotent.
//! - A single periodic sweep promotes due steps (`pending → current →
//!   completed`, strictly monotonic, no skipping), committing each order's
//!   flag changes in one conditional write keyed on its version token.
//! - Progress is a pure function of the step list and is recomputed on
//!   every read, so the store operator and customer views always agree.
//! - Step completions are published as fire-and-forget events for the
//!   notification dispatcher; emission never rolls back persisted state.
//!
//! ## Module Organization
//!
//! - [`models`] - Orders, custom steps, and product step templates
//! - [`ingest`] - Webhook validation and idempotent order creation
//! - [`progress`] - Pure progress calculation
//! - [`advancer`] - The periodic sweep that promotes due steps
//! - [`store`] - Persistence contract with optimistic concurrency
//! - [`events`] - Step-completion event publishing
//! - [`web`] - Webhook endpoint and read API
//! - [`config`] - Engine configuration
//! - [`error`] - Structured error taxonomy
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use fulfillment_core::advancer::StepAdvancer;
//! use fulfillment_core::config::EngineConfig;
//! use fulfillment_core::events::EventPublisher;
//! use fulfillment_core::ingest::InMemoryProductCatalog;
//! use fulfillment_core::store::InMemoryOrderStore;
//! use fulfillment_core::web::{self, AppState};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = EngineConfig::load()?;
//! let store = Arc::new(InMemoryOrderStore::new());
//! let catalog = Arc::new(InMemoryProductCatalog::new());
//! let publisher = EventPublisher::new(config.events.channel_capacity);
//!
//! let advancer = Arc::new(StepAdvancer::new(
//!     store.clone(),
//!     publisher.clone(),
//!     config.advancer_config(),
//! ));
//! let sweeper = advancer.clone();
//! tokio::spawn(async move { sweeper.run().await });
//!
//! let state = AppState::new(store, catalog, config.store_timeout());
//! web::serve(&config.web.bind_address, state).await?;
//! # Ok(())
//! # }
//! ```

pub mod advancer;
pub mod config;
pub mod error;
pub mod events;
pub mod ingest;
pub mod logging;
pub mod models;
pub mod progress;
pub mod store;
pub mod web;

pub use advancer::{AdvancerConfig, StepAdvancer, SweepStats};
pub use config::EngineConfig;
pub use error::{FulfillmentError, Result};
pub use events::{EventPublisher, FulfillmentEvent};
pub use ingest::{IngestOutcome, ProductCatalog, WebhookIngestor};
pub use models::{CustomStep, Order, OrderStatus, Product, StepDuration, StepStatus, TimeUnit};
pub use progress::Progress;
pub use store::{OrderStore, StoreError, VersionedOrder};
