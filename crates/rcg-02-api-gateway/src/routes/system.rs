//! Read-only system and interface endpoints.

use axum::extract::{Path, State};
use rcg_01_router_protocol::Record;
use serde_json::json;

use super::Success;
use crate::domain::error::ApiResult;
use crate::service::AppState;
use crate::session::RouterSession;
use crate::validation::schemas::INTERFACE;

/// `GET /api/system/resource`
pub async fn resource(
    State(state): State<AppState>,
    RouterSession(session): RouterSession,
) -> ApiResult<Success<Record>> {
    state
        .gateway
        .with_router(&session.credential, |conn| {
            Box::pin(async move { conn.system().resource().await })
        })
        .await
        .map(Success)
}

/// `GET /api/system/identity`
pub async fn identity(
    State(state): State<AppState>,
    RouterSession(session): RouterSession,
) -> ApiResult<Success<Record>> {
    state
        .gateway
        .with_router(&session.credential, |conn| {
            Box::pin(async move { conn.system().identity().await })
        })
        .await
        .map(Success)
}

/// `GET /api/system/clock`
pub async fn clock(
    State(state): State<AppState>,
    RouterSession(session): RouterSession,
) -> ApiResult<Success<Record>> {
    state
        .gateway
        .with_router(&session.credential, |conn| {
            Box::pin(async move { conn.system().clock().await })
        })
        .await
        .map(Success)
}

/// `GET /api/system/routerboard`
pub async fn routerboard(
    State(state): State<AppState>,
    RouterSession(session): RouterSession,
) -> ApiResult<Success<Record>> {
    state
        .gateway
        .with_router(&session.credential, |conn| {
            Box::pin(async move { conn.system().routerboard().await })
        })
        .await
        .map(Success)
}

/// `GET /api/interfaces`
pub async fn interfaces(
    State(state): State<AppState>,
    RouterSession(session): RouterSession,
) -> ApiResult<Success<Vec<Record>>> {
    state
        .gateway
        .with_router(&session.credential, |conn| {
            Box::pin(async move { conn.system().interfaces().await })
        })
        .await
        .map(Success)
}

/// `GET /api/interfaces/:name/traffic`: one `monitor-traffic` sample.
pub async fn traffic(
    State(state): State<AppState>,
    RouterSession(session): RouterSession,
    Path(name): Path<String>,
) -> ApiResult<Success<Record>> {
    INTERFACE.check(&mut json!({ "interface": name }))?;
    state
        .gateway
        .with_router(&session.credential, move |conn| {
            Box::pin(async move { conn.system().monitor_traffic(&name).await })
        })
        .await
        .map(Success)
}
