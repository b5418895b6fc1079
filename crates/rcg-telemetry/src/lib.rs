//! # RCG Telemetry
//!
//! Logging and metrics for the router command gateway.
//!
//! ## Components
//!
//! - **Logs**: `tracing-subscriber` with an env filter and either a compact or
//!   a JSON formatter
//! - **Metrics**: Prometheus counters in a private registry, rendered in the
//!   text exposition format for `GET /metrics`
//!
//! ## Usage
//!
//! ```rust,ignore
//! use rcg_telemetry::{init_telemetry, TelemetryConfig};
//!
//! let _guard = init_telemetry(TelemetryConfig::from_env())?;
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `RCG_SERVICE_NAME` | `router-command-gateway` | Service name in logs |
//! | `RCG_LOG_LEVEL` | `info` | Log filter, falls back to `RUST_LOG` |
//! | `RCG_JSON_LOGS` | container-dependent | JSON log output |
//! | `RCG_CONSOLE_OUTPUT` | `true` | Emit logs to stdout |

#![warn(missing_docs)]

mod config;
pub mod metrics;
mod tracing_setup;

pub use config::TelemetryConfig;
pub use metrics::{
    register_metrics, render_metrics, MetricsHandle, RATE_LIMIT_DENIED, ROUTER_COMMANDS,
    ROUTER_CONNECTS, SESSION_REJECTED,
};
pub use tracing_setup::init_tracing;

use thiserror::Error;

/// Errors raised while setting up logging or metrics.
#[derive(Error, Debug)]
pub enum TelemetryError {
    /// A global subscriber is already set, or could not be set.
    #[error("tracing subscriber: {0}")]
    TracerInit(String),

    /// Registering or encoding a metric failed.
    #[error("metrics: {0}")]
    MetricsInit(String),

    /// The log filter or another setting did not parse.
    #[error("telemetry config: {0}")]
    Config(String),
}

/// Register metrics and install the log subscriber.
pub fn init_telemetry(config: TelemetryConfig) -> Result<TelemetryGuard, TelemetryError> {
    let metrics = register_metrics()?;
    init_tracing(&config)?;

    tracing::info!(
        service = %config.service_name,
        level = %config.log_level,
        json = config.json_logs,
        "logging ready"
    );

    Ok(TelemetryGuard {
        service: config.service_name,
        _metrics: metrics,
    })
}

/// Held by `main` until shutdown.
pub struct TelemetryGuard {
    service: String,
    _metrics: MetricsHandle,
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        tracing::info!(service = %self.service, "stopped");
    }
}
