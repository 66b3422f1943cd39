//! Read surface consumed by the presentation layer.

use axum::extract::{Path, State};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::models::{CustomStep, OrderStatus};
use crate::progress;
use crate::store::{with_deadline, VersionedOrder};
use crate::web::errors::{ApiError, ApiResult};
use crate::web::state::AppState;

/// Step as presented to readers: the stored step plus the human-readable
/// relative form (`"1 hours"`). The string is a display convenience; the
/// scheduling source of truth stays `scheduled_at`.
#[derive(Debug, Serialize)]
pub struct StepView {
    #[serde(flatten)]
    pub step: CustomStep,
    pub scheduled_for: String,
}

impl From<CustomStep> for StepView {
    fn from(step: CustomStep) -> Self {
        let scheduled_for = step.scheduled_for();
        Self {
            step,
            scheduled_for,
        }
    }
}

/// Order plus derived fields. `version` lets polling consumers detect
/// staleness without the engine knowing about delivery mechanics.
#[derive(Debug, Serialize)]
pub struct OrderView {
    pub id: Uuid,
    pub external_order_id: String,
    pub external_order_number: Option<String>,
    pub store_id: String,
    pub product_id: String,
    pub customer_email: String,
    pub customer_name: Option<String>,
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub custom_steps: Vec<StepView>,
    pub status: OrderStatus,
    pub progress_percent: u8,
    pub current_step_index: Option<usize>,
    pub version: u64,
}

impl From<VersionedOrder> for OrderView {
    fn from(versioned: VersionedOrder) -> Self {
        let computed = progress::compute(&versioned.order.custom_steps);
        let status = versioned.order.status();
        let order = versioned.order;
        Self {
            id: order.id,
            external_order_id: order.external_order_id,
            external_order_number: order.external_order_number,
            store_id: order.store_id,
            product_id: order.product_id,
            customer_email: order.customer_email,
            customer_name: order.customer_name,
            metadata: order.metadata,
            created_at: order.created_at,
            custom_steps: order.custom_steps.into_iter().map(StepView::from).collect(),
            status,
            progress_percent: computed.percent,
            current_step_index: computed.current_step_index,
            version: versioned.version,
        }
    }
}

/// Lightweight progress answer for frequent polling.
#[derive(Debug, Serialize)]
pub struct ProgressView {
    pub order_id: Uuid,
    pub status: OrderStatus,
    pub progress_percent: u8,
    pub current_step_index: Option<usize>,
    pub version: u64,
}

/// `GET /v1/orders/{id}`
pub async fn get_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<OrderView>> {
    let versioned = fetch_order(&state, id).await?;
    Ok(Json(versioned.into()))
}

/// `GET /v1/orders/{id}/progress`
pub async fn get_order_progress(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ProgressView>> {
    let versioned = fetch_order(&state, id).await?;
    let computed = progress::compute(&versioned.order.custom_steps);
    Ok(Json(ProgressView {
        order_id: versioned.order.id,
        status: versioned.order.status(),
        progress_percent: computed.percent,
        current_step_index: computed.current_step_index,
        version: versioned.version,
    }))
}

/// `GET /v1/stores/{store_id}/orders`
pub async fn list_store_orders(
    State(state): State<AppState>,
    Path(store_id): Path<String>,
) -> ApiResult<Json<Vec<OrderView>>> {
    let orders = with_deadline(state.store_timeout, state.store.list_by_store(&store_id)).await?;
    Ok(Json(orders.into_iter().map(OrderView::from).collect()))
}

async fn fetch_order(state: &AppState, id: Uuid) -> ApiResult<VersionedOrder> {
    with_deadline(state.store_timeout, state.store.get(id))
        .await?
        .ok_or_else(|| ApiError::not_found(format!("order {id} not found")))
}
