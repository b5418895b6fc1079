//! Tiered fixed-window rate limiting.
//!
//! Each `(tier, client)` pair owns one counter that resets at a fixed
//! boundary. The check-and-increment runs under the map shard lock for that
//! key, so concurrent requests from one client never double-create or lose a
//! count. Expired entries are never read: the next request replaces them,
//! and a background sweep drops the ones nobody comes back for.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use axum::{
    body::Body,
    http::{HeaderValue, Request},
    response::{IntoResponse, Response},
};
use dashmap::DashMap;
use rcg_telemetry::metrics::RATE_LIMIT_DENIED;
use serde::{Deserialize, Serialize};
use tower::{Layer, Service};
use tracing::{debug, warn};

use crate::domain::config::{RateLimitConfig, TierPolicy};
use crate::domain::error::ApiError;
use crate::middleware::client_ip::client_identifier;
use crate::ports::outbound::{SystemTimeSource, TimeSource};

/// Rate-limit policy tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    /// Session opening; long window, few requests.
    Auth,
    /// Destructive operations.
    Sensitive,
    /// Ordinary mutations.
    Api,
    /// Polling and dashboards.
    Readonly,
}

impl Tier {
    /// Every tier.
    pub const ALL: [Tier; 4] = [Tier::Auth, Tier::Sensitive, Tier::Api, Tier::Readonly];

    /// Lowercase name, used in keys, logs and metric labels.
    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Auth => "auth",
            Tier::Sensitive => "sensitive",
            Tier::Api => "api",
            Tier::Readonly => "readonly",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one [`RateLimiter::check`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitDecision {
    /// Request may proceed.
    pub allowed: bool,
    /// Requests left in the current window.
    pub remaining: u32,
    /// Window end, unix milliseconds.
    pub reset_at_ms: u64,
    /// Whole seconds until the window ends; set only on denial.
    pub retry_after: Option<u64>,
}

impl RateLimitDecision {
    /// Window end in unix seconds, rounded up.
    pub fn reset_at_secs(&self) -> u64 {
        self.reset_at_ms.div_ceil(1000)
    }
}

#[derive(Debug, Clone, Copy)]
struct WindowEntry {
    count: u32,
    reset_at_ms: u64,
}

struct LimiterState {
    config: RateLimitConfig,
    entries: DashMap<(Tier, String), WindowEntry>,
    clock: Arc<dyn TimeSource>,
    sweeper_started: AtomicBool,
}

impl LimiterState {
    fn sweep(&self) -> usize {
        let now = self.clock.now_millis();
        let before = self.entries.len();
        self.entries.retain(|_, entry| now <= entry.reset_at_ms);
        before.saturating_sub(self.entries.len())
    }
}

/// Process-wide limiter. Cheap to clone; clones share state.
#[derive(Clone)]
pub struct RateLimiter {
    state: Arc<LimiterState>,
}

impl fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RateLimiter")
            .field("entries", &self.state.entries.len())
            .finish()
    }
}

impl RateLimiter {
    /// Limiter on the system clock.
    pub fn new(config: RateLimitConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemTimeSource))
    }

    /// Limiter on an explicit clock.
    pub fn with_clock(config: RateLimitConfig, clock: Arc<dyn TimeSource>) -> Self {
        Self {
            state: Arc::new(LimiterState {
                config,
                entries: DashMap::new(),
                clock,
                sweeper_started: AtomicBool::new(false),
            }),
        }
    }

    /// Policy applied to `tier`.
    pub fn policy(&self, tier: Tier) -> TierPolicy {
        self.state.config.policy(tier)
    }

    /// Count one request from `client` against `tier`.
    pub fn check(&self, client: &str, tier: Tier) -> RateLimitDecision {
        self.ensure_sweeper();

        let policy = self.policy(tier);
        let window_ms = policy.window.as_millis() as u64;
        let now = self.state.clock.now_millis();

        let mut entry = self
            .state
            .entries
            .entry((tier, client.to_string()))
            .or_insert(WindowEntry {
                count: 0,
                reset_at_ms: 0,
            });

        if entry.count == 0 || now > entry.reset_at_ms {
            *entry = WindowEntry {
                count: 1,
                reset_at_ms: now + window_ms,
            };
            return RateLimitDecision {
                allowed: true,
                remaining: policy.max_requests.saturating_sub(1),
                reset_at_ms: entry.reset_at_ms,
                retry_after: None,
            };
        }

        entry.count = entry.count.saturating_add(1);
        let reset_at_ms = entry.reset_at_ms;

        if entry.count > policy.max_requests {
            let retry_after = (reset_at_ms - now).div_ceil(1000).max(1);
            RateLimitDecision {
                allowed: false,
                remaining: 0,
                reset_at_ms,
                retry_after: Some(retry_after),
            }
        } else {
            RateLimitDecision {
                allowed: true,
                remaining: policy.max_requests - entry.count,
                reset_at_ms,
                retry_after: None,
            }
        }
    }

    /// Drop every expired entry now; returns how many were removed.
    pub fn sweep(&self) -> usize {
        self.state.sweep()
    }

    /// Live entries, expired or not.
    pub fn entry_count(&self) -> usize {
        self.state.entries.len()
    }

    /// Start the periodic sweep once per limiter, on the current runtime.
    ///
    /// The task holds only a weak reference and ends with the limiter.
    fn ensure_sweeper(&self) {
        if self.state.sweeper_started.load(Ordering::Acquire) {
            return;
        }
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            return;
        };
        if self.state.sweeper_started.swap(true, Ordering::AcqRel) {
            return;
        }

        let weak = Arc::downgrade(&self.state);
        let interval = self.state.config.sweep_interval;
        runtime.spawn(sweep_task(weak, interval));
        debug!(interval_ms = interval.as_millis() as u64, "rate limit sweep started");
    }

    /// Layer enforcing `tier` on the routes it wraps.
    pub fn layer(&self, tier: Tier) -> RateLimitLayer {
        RateLimitLayer {
            limiter: self.clone(),
            tier,
        }
    }
}

async fn sweep_task(state: Weak<LimiterState>, interval: Duration) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    // first tick completes immediately
    ticker.tick().await;

    loop {
        ticker.tick().await;
        let Some(state) = state.upgrade() else {
            return;
        };
        let removed = state.sweep();
        if removed > 0 {
            debug!(removed, remaining = state.entries.len(), "swept expired rate limit entries");
        }
    }
}

/// Rate limit layer
#[derive(Clone)]
pub struct RateLimitLayer {
    limiter: RateLimiter,
    tier: Tier,
}

impl<S> Layer<S> for RateLimitLayer {
    type Service = RateLimitService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RateLimitService {
            inner,
            limiter: self.limiter.clone(),
            tier: self.tier,
        }
    }
}

/// Rate limit service
#[derive(Clone)]
pub struct RateLimitService<S> {
    inner: S,
    limiter: RateLimiter,
    tier: Tier,
}

impl<S> Service<Request<Body>> for RateLimitService<S>
where
    S: Service<Request<Body>, Response = Response> + Clone + Send + 'static,
    S::Future: Send,
{
    type Response = Response;
    type Error = S::Error;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(
        &mut self,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let limiter = self.limiter.clone();
        let tier = self.tier;
        // keep the instance that was driven to readiness
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        Box::pin(async move {
            let client = client_identifier(req.headers());
            let decision = limiter.check(&client, tier);

            let mut response = if decision.allowed {
                inner.call(req).await?
            } else {
                let retry_after = decision.retry_after.unwrap_or(1);
                warn!(
                    client = %client,
                    tier = %tier,
                    retry_after_secs = retry_after,
                    path = %req.uri().path(),
                    "Rate limit exceeded"
                );
                RATE_LIMIT_DENIED.with_label_values(&[tier.as_str()]).inc();
                ApiError::RateLimited { retry_after }.into_response()
            };

            let headers = response.headers_mut();
            headers.insert("x-ratelimit-remaining", HeaderValue::from(decision.remaining));
            headers.insert("x-ratelimit-reset", HeaderValue::from(decision.reset_at_secs()));
            Ok(response)
        })
    }
}
