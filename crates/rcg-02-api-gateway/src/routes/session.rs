//! `/api/session`: open, inspect and close the router session.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use axum_extra::extract::cookie::CookieJar;
use serde::Serialize;
use serde_json::Value;
use shared_types::RouterId;
use tracing::info;

use super::routers::RouterView;
use super::{json_body, Success};
use crate::domain::error::{ApiError, ApiResult};
use crate::service::AppState;
use crate::session::RouterSession;
use crate::validation::schemas::{SessionOpenInput, SESSION_OPEN};
use crate::validation::validate;

/// Opened session as reported to the dashboard.
#[derive(Debug, Serialize)]
pub struct SessionView {
    pub router: RouterView,
    /// `/system/identity` name read during the connect test.
    pub identity: Option<String>,
}

/// `POST /api/session`
///
/// Loads the router from the inventory, proves the credential with a
/// connect test and only then issues the cookie.
pub async fn open(
    State(state): State<AppState>,
    jar: CookieJar,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<(CookieJar, Success<SessionView>)> {
    let input: SessionOpenInput = validate(&SESSION_OPEN, json_body(payload)?)?;
    let router_id =
        RouterId::new(input.router_id).map_err(|e| ApiError::validation(e.to_string()))?;

    let credential = state
        .inventory
        .get(&router_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("router".to_string()))?;

    let identity = state.gateway.test_connection(&credential).await?;

    let data = state.sessions.issue(router_id.clone(), credential);
    let jar = state.sessions.save(jar, &data)?;
    info!(router_id = %router_id, host = %data.credential.host, "router session opened");

    Ok((
        jar,
        Success(SessionView {
            router: RouterView::new(&data.router_id, &data.credential),
            identity: identity.get("name").map(str::to_string),
        }),
    ))
}

/// `GET /api/session`
pub async fn current(RouterSession(session): RouterSession) -> Success<RouterView> {
    Success(RouterView::new(&session.router_id, &session.credential))
}

/// `DELETE /api/session`
pub async fn close(State(state): State<AppState>, jar: CookieJar) -> (CookieJar, Success<()>) {
    (state.sessions.clear(jar), Success(()))
}
