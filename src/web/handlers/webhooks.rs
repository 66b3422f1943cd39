//! Webhook receiver: `POST /webhooks/orders?productId=..&storeId=..`.

use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use crate::web::errors::ApiResult;
use crate::web::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookQuery {
    pub product_id: String,
    pub store_id: String,
}

/// Summary returned to the webhook sender; replay and first delivery both
/// answer 200 so at-least-once senders stop retrying.
#[derive(Debug, Serialize)]
pub struct WebhookResponse {
    pub order_id: Uuid,
    pub external_order_id: String,
    pub customer_email: String,
    pub steps_scheduled: usize,
    pub progress_percent: u8,
    pub replayed: bool,
}

pub async fn receive_order(
    State(state): State<AppState>,
    Query(query): Query<WebhookQuery>,
    Json(payload): Json<Value>,
) -> ApiResult<Json<WebhookResponse>> {
    debug!(
        product_id = %query.product_id,
        store_id = %query.store_id,
        "webhook delivery received"
    );

    let outcome = state
        .ingestor
        .ingest(&query.product_id, &query.store_id, &payload)
        .await?;

    let order = &outcome.stored.order;
    Ok(Json(WebhookResponse {
        order_id: order.id,
        external_order_id: order.external_order_id.clone(),
        customer_email: order.customer_email.clone(),
        steps_scheduled: order.custom_steps.len(),
        progress_percent: outcome.progress.percent,
        replayed: outcome.replayed,
    }))
}
