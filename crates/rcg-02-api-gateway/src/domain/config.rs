//! Gateway configuration with validation.
//!
//! Loaded from an optional TOML file, then overridden by `RCG_*`
//! environment variables. Durations are written as `500ms`, `60s`, `15m`
//! or `24h`.

use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use crate::middleware::rate_limit::Tier;

/// Main gateway configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// HTTP server configuration
    pub http: HttpConfig,
    /// Session cookie configuration
    pub session: SessionConfig,
    /// Router API client configuration
    pub router: RouterConfig,
    /// Rate limiting tiers
    pub rate_limit: RateLimitConfig,
    /// Router inventory backing store
    pub inventory: InventoryConfig,
}

impl GatewayConfig {
    /// Parse a TOML document; missing sections keep their defaults.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        toml::from_str(source).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Apply `RCG_*` overrides from `lookup` (normally `std::env::var`).
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(secret) = lookup("RCG_SESSION_SECRET") {
            self.session.secret = secret;
        }
        if let Some(env) = lookup("RCG_ENV") {
            self.session.environment = env.parse()?;
        }
        if let Some(port) = lookup("RCG_HTTP_PORT") {
            self.http.port = port
                .trim()
                .parse()
                .map_err(|_| ConfigError::Invalid(format!("RCG_HTTP_PORT={port}")))?;
        }
        if let Some(path) = lookup("RCG_INVENTORY_PATH") {
            self.inventory.path = (!path.is_empty()).then(|| PathBuf::from(path));
        }
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.session.secret.is_empty() {
            return Err(ConfigError::MissingSecret);
        }
        if self.session.cookie_name.is_empty() {
            return Err(ConfigError::Invalid("session.cookie_name cannot be empty".into()));
        }
        if self.session.max_age.is_zero() {
            return Err(ConfigError::InvalidTimeout("session.max_age cannot be 0".into()));
        }

        for tier in Tier::ALL {
            let policy = self.rate_limit.policy(tier);
            if policy.max_requests == 0 {
                return Err(ConfigError::InvalidRateLimit(format!(
                    "{tier}.max_requests cannot be 0"
                )));
            }
            if policy.window.is_zero() {
                return Err(ConfigError::InvalidRateLimit(format!("{tier}.window cannot be 0")));
            }
        }
        if self.rate_limit.sweep_interval.is_zero() {
            return Err(ConfigError::InvalidRateLimit(
                "sweep_interval cannot be 0".into(),
            ));
        }

        if self.router.connect_timeout.is_zero() {
            return Err(ConfigError::InvalidTimeout(
                "router.connect_timeout cannot be 0".into(),
            ));
        }
        if self.router.default_port == 0 {
            return Err(ConfigError::Invalid("router.default_port cannot be 0".into()));
        }

        Ok(())
    }

    /// Get HTTP server bind address
    pub fn http_addr(&self) -> SocketAddr {
        SocketAddr::new(self.http.host, self.http.port)
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Bind address
    pub host: IpAddr,
    /// Port (default: 3000)
    pub port: u16,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)),
            port: 3000,
        }
    }
}

/// Deployment environment; decides the cookie `Secure` flag.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Production,
}

impl Environment {
    /// True outside development.
    pub fn is_production(&self) -> bool {
        *self == Environment::Production
    }
}

impl std::str::FromStr for Environment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "production" | "prod" => Ok(Environment::Production),
            other => Err(ConfigError::Invalid(format!("unknown environment {other:?}"))),
        }
    }
}

/// Session cookie configuration
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Cookie name
    pub cookie_name: String,
    /// Cookie max-age and token lifetime
    #[serde(with = "humantime_serde")]
    pub max_age: Duration,
    /// Deployment environment
    pub environment: Environment,
    /// Operator secret the token key is derived from
    #[serde(skip_serializing)]
    pub secret: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: "mikrotik_session".to_string(),
            max_age: Duration::from_secs(24 * 60 * 60),
            environment: Environment::Development,
            secret: String::new(),
        }
    }
}

impl std::fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionConfig")
            .field("cookie_name", &self.cookie_name)
            .field("max_age", &self.max_age)
            .field("environment", &self.environment)
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// Router API client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
    /// Bound on TCP connect plus login
    #[serde(with = "humantime_serde")]
    pub connect_timeout: Duration,
    /// API port used when a router entry does not name one
    pub default_port: u16,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            default_port: shared_types::DEFAULT_API_PORT,
        }
    }
}

/// One rate-limit tier: requests allowed per fixed window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierPolicy {
    /// Window length
    #[serde(with = "humantime_serde")]
    pub window: Duration,
    /// Requests allowed per window
    pub max_requests: u32,
}

impl TierPolicy {
    /// Policy of `max_requests` per `window`.
    pub const fn new(window: Duration, max_requests: u32) -> Self {
        Self {
            window,
            max_requests,
        }
    }
}

/// Rate limiting configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Login and session opening
    pub auth: TierPolicy,
    /// Destructive operations
    pub sensitive: TierPolicy,
    /// Ordinary mutations
    pub api: TierPolicy,
    /// Polling and dashboards
    pub readonly: TierPolicy,
    /// Interval of the expired-entry sweep
    #[serde(with = "humantime_serde")]
    pub sweep_interval: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            auth: TierPolicy::new(Duration::from_secs(15 * 60), 5),
            sensitive: TierPolicy::new(Duration::from_secs(60), 10),
            api: TierPolicy::new(Duration::from_secs(60), 60),
            readonly: TierPolicy::new(Duration::from_secs(60), 200),
            sweep_interval: Duration::from_secs(60),
        }
    }
}

impl RateLimitConfig {
    /// Policy for `tier`.
    pub fn policy(&self, tier: Tier) -> TierPolicy {
        match tier {
            Tier::Auth => self.auth,
            Tier::Sensitive => self.sensitive,
            Tier::Api => self.api,
            Tier::Readonly => self.readonly,
        }
    }
}

/// Router inventory configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct InventoryConfig {
    /// JSON file; in-memory inventory when absent
    pub path: Option<PathBuf>,
}

/// Configuration errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    /// Session secret not configured
    #[error("session secret is required (set RCG_SESSION_SECRET)")]
    MissingSecret,
    /// Invalid rate limiting configuration
    #[error("invalid rate limit: {0}")]
    InvalidRateLimit(String),
    /// Invalid timeout value
    #[error("invalid timeout: {0}")]
    InvalidTimeout(String),
    /// Configuration file did not parse
    #[error("config parse error: {0}")]
    Parse(String),
    /// General configuration error
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Humantime serde module for Duration serialization
mod humantime_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        if duration.subsec_millis() != 0 {
            serializer.serialize_str(&format!("{}ms", duration.as_millis()))
        } else {
            serializer.serialize_str(&format!("{}s", duration.as_secs()))
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        parse_duration(&s).map_err(serde::de::Error::custom)
    }

    pub(super) fn parse_duration(s: &str) -> Result<Duration, &'static str> {
        let s = s.trim();
        // "ms" before "s" and "m"
        if let Some(ms) = s.strip_suffix("ms") {
            ms.trim()
                .parse::<u64>()
                .map(Duration::from_millis)
                .map_err(|_| "invalid milliseconds")
        } else if let Some(secs) = s.strip_suffix('s') {
            secs.trim()
                .parse::<u64>()
                .map(Duration::from_secs)
                .map_err(|_| "invalid seconds")
        } else if let Some(mins) = s.strip_suffix('m') {
            mins.trim()
                .parse::<u64>()
                .map(|m| Duration::from_secs(m * 60))
                .map_err(|_| "invalid minutes")
        } else if let Some(hours) = s.strip_suffix('h') {
            hours
                .trim()
                .parse::<u64>()
                .map(|h| Duration::from_secs(h * 3600))
                .map_err(|_| "invalid hours")
        } else {
            // Try parsing as plain seconds
            s.parse::<u64>()
                .map(Duration::from_secs)
                .map_err(|_| "invalid duration format")
        }
    }
}
