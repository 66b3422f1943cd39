//! Engine configuration.
//!
//! Loaded from an optional `fulfillment.toml`/`.yaml` file with
//! `FULFILLMENT`-prefixed environment overrides (`__` separates nesting
//! levels); every field has a validated default so an empty environment
//! still yields a working engine.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::advancer::AdvancerConfig;
use crate::error::{FulfillmentError, Result};

/// Root configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct EngineConfig {
    pub advancer: AdvancerSettings,
    pub events: EventSettings,
    pub web: WebSettings,
}

/// Sweep loop tuning.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AdvancerSettings {
    /// Seconds between sweeps.
    pub sweep_interval_seconds: u64,
    /// Deadline in seconds for each store call.
    pub store_timeout_seconds: u64,
    /// Upper bound on orders examined per sweep.
    pub max_orders_per_sweep: usize,
}

impl Default for AdvancerSettings {
    fn default() -> Self {
        Self {
            sweep_interval_seconds: 300,
            store_timeout_seconds: 5,
            max_orders_per_sweep: 100,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct EventSettings {
    /// Broadcast channel capacity; lagging subscribers drop their backlog.
    pub channel_capacity: usize,
}

impl Default for EventSettings {
    fn default() -> Self {
        Self {
            channel_capacity: 1024,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WebSettings {
    pub bind_address: String,
}

impl Default for WebSettings {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

impl EngineConfig {
    /// Load from `fulfillment.{toml,yaml,json}` (if present) and
    /// `FULFILLMENT__*` environment variables, then validate.
    pub fn load() -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name("fulfillment").required(false))
            .add_source(config::Environment::with_prefix("FULFILLMENT").separator("__"))
            .build()
            .map_err(|e| FulfillmentError::Configuration(e.to_string()))?;

        let engine: Self = settings
            .try_deserialize()
            .map_err(|e| FulfillmentError::Configuration(e.to_string()))?;
        engine.validate()?;
        Ok(engine)
    }

    pub fn validate(&self) -> Result<()> {
        if self.advancer.sweep_interval_seconds == 0 {
            return Err(FulfillmentError::Configuration(
                "advancer.sweep_interval_seconds must be at least 1".to_string(),
            ));
        }
        if self.advancer.store_timeout_seconds == 0 {
            return Err(FulfillmentError::Configuration(
                "advancer.store_timeout_seconds must be at least 1".to_string(),
            ));
        }
        if self.advancer.max_orders_per_sweep == 0 {
            return Err(FulfillmentError::Configuration(
                "advancer.max_orders_per_sweep must be at least 1".to_string(),
            ));
        }
        if self.events.channel_capacity == 0 {
            return Err(FulfillmentError::Configuration(
                "events.channel_capacity must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn advancer_config(&self) -> AdvancerConfig {
        AdvancerConfig {
            sweep_interval: Duration::from_secs(self.advancer.sweep_interval_seconds),
            store_timeout: Duration::from_secs(self.advancer.store_timeout_seconds),
            max_orders_per_sweep: self.advancer.max_orders_per_sweep,
        }
    }

    pub fn store_timeout(&self) -> Duration {
        Duration::from_secs(self.advancer.store_timeout_seconds)
    }
}
