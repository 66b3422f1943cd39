//! Webhook ingestion: step materialization, idempotent replay, and the
//! validation failure modes.

mod common;

use chrono::{Duration, Utc};
use serde_json::json;

use common::{engine_with_products, order_paid_payload, pack_and_ship_product, product, PRODUCT_ID, STORE_ID};
use fulfillment_core::error::FulfillmentError;
use fulfillment_core::models::TimeUnit;
use fulfillment_core::store::OrderStore;

#[tokio::test]
async fn test_ingestion_materializes_independent_schedules() {
    // Template [Pack +1h, Ship +1d] ingested at T0. Anchoring is
    // independent: each step is offset from T0, not from its predecessor,
    // so Ship lands at T0+24h rather than T0+25h.
    let engine = engine_with_products(vec![pack_and_ship_product()]);
    let t0 = Utc::now();

    let outcome = engine
        .ingestor
        .ingest_at(PRODUCT_ID, STORE_ID, &order_paid_payload(9001, "maria@example.com"), t0)
        .await
        .unwrap();

    let order = &outcome.stored.order;
    assert_eq!(order.custom_steps.len(), 2);
    assert_eq!(order.custom_steps[0].name, "Pack");
    assert_eq!(order.custom_steps[0].scheduled_at, t0 + Duration::hours(1));
    assert_eq!(order.custom_steps[1].name, "Ship");
    assert_eq!(order.custom_steps[1].scheduled_at, t0 + Duration::hours(24));

    // Nonzero first duration: nothing current yet, progress 0.
    assert!(order.custom_steps[0].status.is_pending());
    assert_eq!(outcome.progress.percent, 0);
    assert_eq!(outcome.progress.current_step_index, None);
    assert!(!outcome.replayed);
    assert_eq!(outcome.stored.version, 1);

    order.check_invariants().unwrap();
}

#[tokio::test]
async fn test_zero_duration_first_step_starts_current() {
    let engine = engine_with_products(vec![product(&[
        ("Received", 0, TimeUnit::Minutes),
        ("Ship", 1, TimeUnit::Days),
    ])]);

    let outcome = engine
        .ingestor
        .ingest(PRODUCT_ID, STORE_ID, &order_paid_payload(9001, "maria@example.com"))
        .await
        .unwrap();

    let order = &outcome.stored.order;
    assert!(order.custom_steps[0].is_current());
    // Current but not completed: the advancer owns completion.
    assert!(!order.custom_steps[0].is_completed());
    assert_eq!(outcome.progress.percent, 25);
    assert_eq!(outcome.progress.current_step_index, Some(0));
}

#[tokio::test]
async fn test_replayed_webhook_returns_existing_order() {
    // Idempotent replay: same payload twice, one order in the store.
    let engine = engine_with_products(vec![pack_and_ship_product()]);
    let payload = order_paid_payload(9001, "maria@example.com");

    let first = engine
        .ingestor
        .ingest(PRODUCT_ID, STORE_ID, &payload)
        .await
        .unwrap();
    let second = engine
        .ingestor
        .ingest(PRODUCT_ID, STORE_ID, &payload)
        .await
        .unwrap();

    assert_eq!(first.stored.order.id, second.stored.order.id);
    assert!(!first.replayed);
    assert!(second.replayed);
    assert_eq!(engine.store.len(), 1);

    // The replay did not touch the stored record.
    assert_eq!(second.stored.version, first.stored.version);
}

#[tokio::test]
async fn test_empty_template_rejected_and_nothing_stored() {
    // A misconfigured product must never produce a stepless order.
    let engine = engine_with_products(vec![product(&[])]);

    let err = engine
        .ingestor
        .ingest(PRODUCT_ID, STORE_ID, &order_paid_payload(9001, "maria@example.com"))
        .await
        .unwrap_err();

    assert!(matches!(err, FulfillmentError::InvalidTemplate(_)));
    assert!(engine.store.is_empty());
}

#[tokio::test]
async fn test_unknown_product_is_not_found() {
    let engine = engine_with_products(vec![]);
    let err = engine
        .ingestor
        .ingest("no-such-product", STORE_ID, &order_paid_payload(9001, "maria@example.com"))
        .await
        .unwrap_err();
    assert!(matches!(err, FulfillmentError::NotFound(_)));
}

#[tokio::test]
async fn test_inactive_product_is_not_found() {
    let mut inactive = pack_and_ship_product();
    inactive.active = false;
    let engine = engine_with_products(vec![inactive]);

    let err = engine
        .ingestor
        .ingest(PRODUCT_ID, STORE_ID, &order_paid_payload(9001, "maria@example.com"))
        .await
        .unwrap_err();
    assert!(matches!(err, FulfillmentError::NotFound(_)));
}

#[tokio::test]
async fn test_product_of_another_store_is_not_found() {
    let engine = engine_with_products(vec![pack_and_ship_product()]);
    let err = engine
        .ingestor
        .ingest(PRODUCT_ID, "some-other-store", &order_paid_payload(9001, "maria@example.com"))
        .await
        .unwrap_err();
    assert!(matches!(err, FulfillmentError::NotFound(_)));
}

#[tokio::test]
async fn test_payload_without_email_rejected() {
    let engine = engine_with_products(vec![pack_and_ship_product()]);
    let payload = json!({"event": "order.paid", "order": {"id": 9001}});

    let err = engine
        .ingestor
        .ingest(PRODUCT_ID, STORE_ID, &payload)
        .await
        .unwrap_err();
    assert!(matches!(err, FulfillmentError::InvalidPayload(_)));
    assert!(engine.store.is_empty());
}

#[tokio::test]
async fn test_payload_with_number_instead_of_id() {
    let engine = engine_with_products(vec![pack_and_ship_product()]);
    let payload = json!({
        "event": "order.paid",
        "order": {"number": "A-77", "email": "maria@example.com"}
    });

    let outcome = engine
        .ingestor
        .ingest(PRODUCT_ID, STORE_ID, &payload)
        .await
        .unwrap();
    assert_eq!(outcome.stored.order.external_order_id, "A-77");
}

#[tokio::test]
async fn test_ingested_order_carries_customer_and_metadata() {
    let engine = engine_with_products(vec![pack_and_ship_product()]);

    let outcome = engine
        .ingestor
        .ingest(PRODUCT_ID, STORE_ID, &order_paid_payload(9001, "maria@example.com"))
        .await
        .unwrap();

    let order = &outcome.stored.order;
    assert_eq!(order.customer_email, "maria@example.com");
    assert_eq!(order.customer_name.as_deref(), Some("Maria Silva"));
    assert_eq!(order.external_order_number.as_deref(), Some("#9001"));
    // Commerce metadata passes through opaquely.
    assert_eq!(
        order.metadata["line_items"][0]["sku"],
        serde_json::json!("BJ-6")
    );

    // The stored record matches what the ingestor returned.
    let stored = engine.store.get(order.id).await.unwrap().unwrap();
    assert_eq!(stored.order, *order);
}
