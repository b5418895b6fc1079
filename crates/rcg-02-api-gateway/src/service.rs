//! Gateway service: state assembly, route table and serving.

use std::future::Future;
use std::sync::Arc;

use axum::extract::FromRef;
use axum::routing::{delete, get, post};
use axum::Router;
use rcg_telemetry::metrics::register_metrics;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::adapters::{FileInventory, MemoryInventory};
use crate::domain::config::GatewayConfig;
use crate::domain::error::GatewayError;
use crate::gateway::RouterGateway;
use crate::middleware::rate_limit::{RateLimiter, Tier};
use crate::ports::outbound::RouterInventory;
use crate::routes::resources::{
    self, DhcpLeases, HotspotActive, HotspotProfiles, HotspotServers, HotspotUsers, IpBindings,
    PppActive, PppProfiles, PppSecrets,
};
use crate::routes::{self as api, routers, session, system, vouchers};
use crate::session::SessionStore;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<SessionStore>,
    pub inventory: Arc<dyn RouterInventory>,
    pub gateway: Arc<RouterGateway>,
    pub limiter: RateLimiter,
}

impl FromRef<AppState> for Arc<SessionStore> {
    fn from_ref(state: &AppState) -> Self {
        Arc::clone(&state.sessions)
    }
}

/// Assemble the full route table.
///
/// Each route carries exactly one rate-limit tier: `auth` for opening a
/// session, `sensitive` for deletions and resource actions, `api` for other
/// writes and `readonly` for reads.
pub fn build_router(state: AppState) -> Router {
    let limiter = state.limiter.clone();
    let tier = |t: Tier| limiter.layer(t);

    Router::new()
        // ═══════════════════════════════════════════════════════════════
        // SESSION & INVENTORY
        // ═══════════════════════════════════════════════════════════════
        .route(
            "/api/session",
            post(session::open)
                .layer(tier(Tier::Auth))
                .merge(get(session::current).layer(tier(Tier::Readonly)))
                .merge(delete(session::close).layer(tier(Tier::Api))),
        )
        .route(
            "/api/routers",
            get(routers::list)
                .layer(tier(Tier::Readonly))
                .merge(post(routers::upsert).layer(tier(Tier::Api))),
        )
        .route(
            "/api/routers/:id",
            delete(routers::delete).layer(tier(Tier::Sensitive)),
        )
        // ═══════════════════════════════════════════════════════════════
        // HOTSPOT
        // ═══════════════════════════════════════════════════════════════
        .merge(resources::editable::<HotspotUsers>("/api/hotspot/users", &limiter))
        .route(
            "/api/hotspot/users/:id/reset-counters",
            post(resources::reset_counters).layer(tier(Tier::Api)),
        )
        .merge(resources::editable::<HotspotProfiles>("/api/hotspot/profiles", &limiter))
        .merge(resources::with_actions::<HotspotActive>("/api/hotspot/active", &limiter))
        .merge(resources::read_only::<HotspotServers>("/api/hotspot/servers", &limiter))
        .merge(resources::editable::<IpBindings>("/api/hotspot/bindings", &limiter))
        // ═══════════════════════════════════════════════════════════════
        // PPP & DHCP
        // ═══════════════════════════════════════════════════════════════
        .merge(resources::editable::<PppSecrets>("/api/ppp/secrets", &limiter))
        .merge(resources::editable::<PppProfiles>("/api/ppp/profiles", &limiter))
        .merge(resources::with_actions::<PppActive>("/api/ppp/active", &limiter))
        .merge(resources::editable::<DhcpLeases>("/api/dhcp/leases", &limiter))
        .route(
            "/api/dhcp/leases/:id/make-static",
            post(resources::make_static).layer(tier(Tier::Api)),
        )
        // ═══════════════════════════════════════════════════════════════
        // SYSTEM, TRAFFIC & VOUCHERS
        // ═══════════════════════════════════════════════════════════════
        .route("/api/system/resource", get(system::resource).layer(tier(Tier::Readonly)))
        .route("/api/system/identity", get(system::identity).layer(tier(Tier::Readonly)))
        .route("/api/system/clock", get(system::clock).layer(tier(Tier::Readonly)))
        .route(
            "/api/system/routerboard",
            get(system::routerboard).layer(tier(Tier::Readonly)),
        )
        .route("/api/interfaces", get(system::interfaces).layer(tier(Tier::Readonly)))
        .route(
            "/api/interfaces/:name/traffic",
            get(system::traffic).layer(tier(Tier::Readonly)),
        )
        .route("/api/vouchers", post(vouchers::create).layer(tier(Tier::Api)))
        // ═══════════════════════════════════════════════════════════════
        // OPERATIONS (not rate limited)
        // ═══════════════════════════════════════════════════════════════
        .route("/health", get(api::health))
        .route("/metrics", get(api::metrics))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Router command gateway service
pub struct GatewayService {
    config: GatewayConfig,
    state: AppState,
}

impl GatewayService {
    /// Validate `config` and build the shared state.
    pub async fn new(config: GatewayConfig) -> Result<Self, GatewayError> {
        config.validate()?;
        register_metrics()?;

        let sessions = Arc::new(SessionStore::new(&config.session)?);
        let inventory: Arc<dyn RouterInventory> = match &config.inventory.path {
            Some(path) => {
                info!(path = %path.display(), "using file router inventory");
                Arc::new(FileInventory::open(path.clone()).await?)
            }
            None => {
                warn!("no inventory path configured, routers will not survive a restart");
                Arc::new(MemoryInventory::new())
            }
        };

        let state = AppState {
            sessions,
            inventory,
            gateway: Arc::new(RouterGateway::from_config(&config.router)),
            limiter: RateLimiter::new(config.rate_limit.clone()),
        };

        Ok(Self { config, state })
    }

    /// Shared handler state.
    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Route table bound to this service's state.
    pub fn router(&self) -> Router {
        build_router(self.state.clone())
    }

    /// Serve until `shutdown` resolves.
    pub async fn serve<F>(self, shutdown: F) -> Result<(), GatewayError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = self.config.http_addr();
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| GatewayError::Bind(format!("{addr}: {e}")))?;

        info!(
            addr = %addr,
            environment = ?self.config.session.environment,
            "Starting router command gateway"
        );
        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown)
            .await?;

        info!("Router command gateway stopped");
        Ok(())
    }
}
