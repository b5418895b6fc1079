//! Generic list / add / update / action handlers over router resources.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use rcg_01_router_protocol::{
    CommandParams, DhcpLeaseParams, HotspotProfileParams, HotspotUserParams, IpBindingParams,
    NoParams, PppProfileParams, PppSecretParams, Record, Resource, ResourceKind, RouterConnection,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::info;

use super::{json_body, Success};
use crate::domain::error::{ApiError, ApiResult};
use crate::middleware::rate_limit::{RateLimiter, Tier};
use crate::service::AppState;
use crate::session::RouterSession;
use crate::validation::schemas::{
    ResourceActionInput, DHCP_LEASE, HOTSPOT_PROFILE, HOTSPOT_USER, IP_BINDING, ITEM,
    PPP_PROFILE, PPP_SECRET, RESOURCE_ACTION,
};
use crate::validation::{validate, Schema};

/// A router menu reachable over HTTP.
pub trait Listed: Send + Sync + 'static {
    /// Parameter struct for writes.
    type Params: CommandParams + Send + Sync + 'static;

    /// Menu path and the actions it offers.
    const KIND: ResourceKind;

    /// Bind the resource to a live connection.
    fn open(conn: &mut RouterConnection) -> Resource<'_, Self::Params> {
        Resource::new(conn, Self::KIND)
    }
}

/// A menu that also accepts `add` and `set`.
pub trait Editable: Listed {
    /// Schema for `add`; `set` uses its partial form.
    fn schema() -> &'static Schema;
}

macro_rules! listed {
    ($(#[$meta:meta])* $name:ident, $params:ty, $kind:ident) => {
        $(#[$meta])*
        pub struct $name;

        impl Listed for $name {
            type Params = $params;
            const KIND: ResourceKind = ResourceKind::$kind;
        }
    };
    ($(#[$meta:meta])* $name:ident, $params:ty, $kind:ident, $schema:ident) => {
        listed!($(#[$meta])* $name, $params, $kind);

        impl Editable for $name {
            fn schema() -> &'static Schema {
                &$schema
            }
        }
    };
}

listed!(
    /// `/ip/hotspot/user`
    HotspotUsers, HotspotUserParams, HOTSPOT_USER, HOTSPOT_USER
);
listed!(
    /// `/ip/hotspot/user/profile`
    HotspotProfiles, HotspotProfileParams, HOTSPOT_PROFILE, HOTSPOT_PROFILE
);
listed!(
    /// `/ip/hotspot/active`
    HotspotActive, NoParams, HOTSPOT_ACTIVE
);
listed!(
    /// `/ip/hotspot`
    HotspotServers, NoParams, HOTSPOT_SERVER
);
listed!(
    /// `/ip/hotspot/ip-binding`
    IpBindings, IpBindingParams, IP_BINDING, IP_BINDING
);
listed!(
    /// `/ppp/secret`
    PppSecrets, PppSecretParams, PPP_SECRET, PPP_SECRET
);
listed!(
    /// `/ppp/profile`
    PppProfiles, PppProfileParams, PPP_PROFILE, PPP_PROFILE
);
listed!(
    /// `/ppp/active`
    PppActive, NoParams, PPP_ACTIVE
);
listed!(
    /// `/ip/dhcp-server/lease`
    DhcpLeases, DhcpLeaseParams, DHCP_LEASE, DHCP_LEASE
);

/// Body of a successful `add`.
#[derive(Debug, Serialize)]
pub struct Created {
    /// Router-assigned id, e.g. `*1A`.
    pub id: String,
}

/// Reject path ids the router could not have issued.
pub(crate) fn item_id(id: String) -> ApiResult<String> {
    let mut value = json!({ "id": id });
    ITEM.check(&mut value)?;
    Ok(id)
}

/// `GET <base>`
pub async fn list<R: Listed>(
    State(state): State<AppState>,
    RouterSession(session): RouterSession,
) -> ApiResult<Success<Vec<Record>>> {
    state
        .gateway
        .with_router(&session.credential, |conn| {
            Box::pin(async move { R::open(conn).list(Vec::new()).await })
        })
        .await
        .map(Success)
}

/// `POST <base>`
pub async fn add<R>(
    State(state): State<AppState>,
    RouterSession(session): RouterSession,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Success<Created>>
where
    R: Editable,
    R::Params: DeserializeOwned,
{
    let params: R::Params = validate(R::schema(), json_body(payload)?)?;
    let id = state
        .gateway
        .with_router(&session.credential, move |conn| {
            Box::pin(async move { R::open(conn).add(&params).await })
        })
        .await?;

    info!(router_id = %session.router_id, id = %id, "entry added");
    Ok(Success(Created { id }))
}

/// `PUT <base>/:id`; only the submitted fields change.
pub async fn update<R>(
    State(state): State<AppState>,
    RouterSession(session): RouterSession,
    Path(id): Path<String>,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Success<()>>
where
    R: Editable,
    R::Params: DeserializeOwned,
{
    let id = item_id(id)?;
    let params: R::Params = validate(&R::schema().partial(), json_body(payload)?)?;
    state
        .gateway
        .with_router(&session.credential, move |conn| {
            Box::pin(async move { R::open(conn).update(&id, &params).await })
        })
        .await
        .map(Success)
}

/// `POST <base>/action`: enable, disable or remove one entry.
pub async fn action<R: Listed>(
    State(state): State<AppState>,
    RouterSession(session): RouterSession,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Success<()>> {
    let input: ResourceActionInput = validate(&RESOURCE_ACTION, json_body(payload)?)?;
    let ResourceActionInput { id, action } = input;
    R::KIND
        .check(action)
        .map_err(|err| ApiError::Validation(err.to_string()))?;
    let item = id.clone();

    state
        .gateway
        .with_router(&session.credential, move |conn| {
            Box::pin(async move { R::open(conn).apply(action, &item).await })
        })
        .await?;

    info!(router_id = %session.router_id, id = %id, action = %action, "resource action applied");
    Ok(Success(()))
}

/// `POST /api/hotspot/users/:id/reset-counters`
pub async fn reset_counters(
    State(state): State<AppState>,
    RouterSession(session): RouterSession,
    Path(id): Path<String>,
) -> ApiResult<Success<()>> {
    let id = item_id(id)?;
    state
        .gateway
        .with_router(&session.credential, move |conn| {
            Box::pin(async move { conn.hotspot_users().reset_counters(&id).await })
        })
        .await
        .map(Success)
}

/// `POST /api/dhcp/leases/:id/make-static`
pub async fn make_static(
    State(state): State<AppState>,
    RouterSession(session): RouterSession,
    Path(id): Path<String>,
) -> ApiResult<Success<()>> {
    let id = item_id(id)?;
    state
        .gateway
        .with_router(&session.credential, move |conn| {
            Box::pin(async move { conn.dhcp_leases().make_static(&id).await })
        })
        .await
        .map(Success)
}

/// `GET base` only.
pub fn read_only<R: Listed>(base: &str, limiter: &RateLimiter) -> Router<AppState> {
    Router::new().route(base, get(list::<R>).layer(limiter.layer(Tier::Readonly)))
}

/// `GET base` and `POST base/action`.
pub fn with_actions<R: Listed>(base: &str, limiter: &RateLimiter) -> Router<AppState> {
    read_only::<R>(base, limiter).route(
        &format!("{base}/action"),
        post(action::<R>).layer(limiter.layer(Tier::Sensitive)),
    )
}

/// Full CRUD plus actions.
pub fn editable<R>(base: &str, limiter: &RateLimiter) -> Router<AppState>
where
    R: Editable,
    R::Params: DeserializeOwned,
{
    Router::new()
        .route(
            base,
            get(list::<R>)
                .layer(limiter.layer(Tier::Readonly))
                .merge(post(add::<R>).layer(limiter.layer(Tier::Api))),
        )
        .route(
            &format!("{base}/:id"),
            put(update::<R>).layer(limiter.layer(Tier::Api)),
        )
        .route(
            &format!("{base}/action"),
            post(action::<R>).layer(limiter.layer(Tier::Sensitive)),
        )
}
