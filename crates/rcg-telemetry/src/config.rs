//! Telemetry configuration from environment variables.

/// Configuration for logging output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetryConfig {
    /// Service name attached to the startup log line
    pub service_name: String,

    /// Filter directive (`info`, `rcg_02_api_gateway=debug,info`, ...)
    pub log_level: String,

    /// Emit logs to stdout at all
    pub console_output: bool,

    /// One JSON object per line instead of the human format
    pub json_logs: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "router-command-gateway".to_string(),
            log_level: "info".to_string(),
            console_output: true,
            json_logs: false,
        }
    }
}

fn flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

impl TelemetryConfig {
    /// Configuration from the process environment.
    ///
    /// - `RCG_SERVICE_NAME`: service name (default: router-command-gateway)
    /// - `RCG_LOG_LEVEL`, then `RUST_LOG`: filter (default: info)
    /// - `RCG_CONSOLE_OUTPUT`: stdout logging (default: true)
    /// - `RCG_JSON_LOGS`: JSON lines (default: true inside containers)
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let in_container =
            lookup("KUBERNETES_SERVICE_HOST").is_some() || lookup("DOCKER_CONTAINER").is_some();

        Self {
            service_name: lookup("RCG_SERVICE_NAME").unwrap_or(defaults.service_name),
            log_level: lookup("RCG_LOG_LEVEL")
                .or_else(|| lookup("RUST_LOG"))
                .filter(|level| !level.trim().is_empty())
                .unwrap_or(defaults.log_level),
            console_output: lookup("RCG_CONSOLE_OUTPUT")
                .and_then(|v| flag(&v))
                .unwrap_or(defaults.console_output),
            json_logs: lookup("RCG_JSON_LOGS")
                .and_then(|v| flag(&v))
                .unwrap_or(in_container),
        }
    }
}
