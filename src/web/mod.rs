//! HTTP surface: the webhook endpoint plus the read API the presentation
//! layer consumes. The router is plain axum state + handlers so embedding
//! applications can merge it into their own service.

pub mod errors;
pub mod handlers;
pub mod state;

use axum::routing::{get, post};
use axum::Router;

pub use errors::{ApiError, ApiResult};
pub use state::AppState;

/// Build the engine's router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/webhooks/orders", post(handlers::webhooks::receive_order))
        .route("/v1/orders/:id", get(handlers::orders::get_order))
        .route(
            "/v1/orders/:id/progress",
            get(handlers::orders::get_order_progress),
        )
        .route(
            "/v1/stores/:store_id/orders",
            get(handlers::orders::list_store_orders),
        )
        .with_state(state)
}

/// Bind and serve the router until the process is stopped.
pub async fn serve(bind_address: &str, state: AppState) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(bind_address).await?;
    tracing::info!(%bind_address, "fulfillment web surface listening");
    axum::serve(listener, router(state)).await?;
    Ok(())
}
