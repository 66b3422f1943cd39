//! Structured logging.
//!
//! Environment-aware tracing setup with console output and an optional JSON
//! file layer for debugging sweeps and webhook deliveries after the fact.

use chrono::Utc;
use std::fs;
use std::path::PathBuf;
use std::process;
use std::sync::OnceLock;
use tracing_subscriber::{
    fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer,
};

static LOGGER_INITIALIZED: OnceLock<()> = OnceLock::new();

/// Initialize tracing once for the process. Safe to call repeatedly; a
/// pre-existing global subscriber (e.g. set by an embedding application)
/// is left in place.
pub fn init_logging() {
    LOGGER_INITIALIZED.get_or_init(|| {
        let environment = environment();
        let log_level = default_log_level(&environment);

        let console_layer = fmt::layer()
            .with_target(true)
            .with_level(true)
            .with_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level.clone())));

        let registry = tracing_subscriber::registry().with(console_layer);

        match file_writer(&environment) {
            Some((writer, guard)) => {
                let file_layer = fmt::layer()
                    .with_writer(writer)
                    .with_target(true)
                    .with_ansi(false)
                    .json()
                    .with_filter(EnvFilter::new(log_level));
                if registry.with(file_layer).try_init().is_err() {
                    tracing::debug!("global tracing subscriber already set, keeping it");
                }
                // Keep the non-blocking writer alive for the process lifetime.
                std::mem::forget(guard);
            }
            None => {
                if registry.try_init().is_err() {
                    tracing::debug!("global tracing subscriber already set, keeping it");
                }
            }
        }

        tracing::info!(
            pid = process::id(),
            environment = %environment,
            "structured logging initialized"
        );
    });
}

/// Build a non-blocking JSON file writer under `log/`; console-only when
/// the directory cannot be created.
fn file_writer(
    environment: &str,
) -> Option<(
    tracing_appender::non_blocking::NonBlocking,
    tracing_appender::non_blocking::WorkerGuard,
)> {
    let log_dir = PathBuf::from("log");
    if !log_dir.exists() && fs::create_dir_all(&log_dir).is_err() {
        return None;
    }

    let filename = format!(
        "{}.{}.{}.log",
        environment,
        process::id(),
        Utc::now().format("%Y%m%d_%H%M%S")
    );
    let appender = tracing_appender::rolling::never(&log_dir, filename);
    Some(tracing_appender::non_blocking(appender))
}

fn environment() -> String {
    std::env::var("FULFILLMENT_ENV")
        .or_else(|_| std::env::var("APP_ENV"))
        .unwrap_or_else(|_| "development".to_string())
}

fn default_log_level(environment: &str) -> String {
    match environment {
        "production" => "info".to_string(),
        _ => "debug".to_string(),
    }
}
