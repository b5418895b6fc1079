//! Prometheus metrics for the router command gateway.
//!
//! All metrics follow the naming convention: `rcg_<area>_<metric>_total`

use std::sync::OnceLock;

use lazy_static::lazy_static;
use prometheus::{Encoder, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};

use crate::TelemetryError;

lazy_static! {
    /// Gateway metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    /// Requests denied by the rate limiter, by policy tier
    pub static ref RATE_LIMIT_DENIED: IntCounterVec = IntCounterVec::new(
        Opts::new("rcg_rate_limit_denied_total", "Requests denied by the rate limiter"),
        &["tier"]
    ).expect("metric creation failed");

    /// Router connection attempts, by outcome
    pub static ref ROUTER_CONNECTS: IntCounterVec = IntCounterVec::new(
        Opts::new("rcg_router_connect_total", "Router API connection attempts"),
        &["outcome"]  // success / timeout / refused / auth_rejected / error
    ).expect("metric creation failed");

    /// Router command writes, by outcome
    pub static ref ROUTER_COMMANDS: IntCounterVec = IntCounterVec::new(
        Opts::new("rcg_router_command_total", "Router API command writes"),
        &["outcome"]  // ok / trap / error
    ).expect("metric creation failed");

    /// Session cookies present but rejected (tampered, expired key, malformed)
    pub static ref SESSION_REJECTED: IntCounter = IntCounter::new(
        "rcg_session_rejected_total",
        "Session cookies that failed to decrypt or validate"
    ).expect("metric creation failed");
}

static REGISTERED: OnceLock<Result<(), String>> = OnceLock::new();

/// Handle proving the metrics were registered.
#[derive(Debug, Clone, Copy)]
pub struct MetricsHandle;

/// Register all gateway metrics. Safe to call more than once.
pub fn register_metrics() -> Result<MetricsHandle, TelemetryError> {
    let outcome = REGISTERED.get_or_init(|| {
        let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
            Box::new(RATE_LIMIT_DENIED.clone()),
            Box::new(ROUTER_CONNECTS.clone()),
            Box::new(ROUTER_COMMANDS.clone()),
            Box::new(SESSION_REJECTED.clone()),
        ];

        for metric in metrics {
            REGISTRY.register(metric).map_err(|e| e.to_string())?;
        }
        Ok(())
    });

    outcome
        .clone()
        .map(|_| MetricsHandle)
        .map_err(TelemetryError::MetricsInit)
}

/// Render the registry in the Prometheus text format.
pub fn render_metrics() -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    encoder
        .encode(&REGISTRY.gather(), &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}
