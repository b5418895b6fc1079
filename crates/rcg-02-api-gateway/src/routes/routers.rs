//! `/api/routers`: router inventory management.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::Json;
use rand::RngCore;
use serde::Serialize;
use serde_json::Value;
use shared_types::{RouterCredential, RouterId};
use tracing::info;

use super::{json_body, Success};
use crate::domain::error::{ApiError, ApiResult};
use crate::service::AppState;
use crate::validation::schemas::{RouterInput, ROUTER};
use crate::validation::validate;

/// Inventory entry without its secret.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouterView {
    pub id: RouterId,
    pub name: String,
    pub host: String,
    pub port: u16,
    pub username: String,
    pub currency: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hotspot_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dns_name: Option<String>,
}

impl RouterView {
    /// View of `credential` under `id`.
    pub fn new(id: &RouterId, credential: &RouterCredential) -> Self {
        Self {
            id: id.clone(),
            name: credential.display_name().to_string(),
            host: credential.host.clone(),
            port: credential.port,
            username: credential.username.clone(),
            currency: credential.currency.clone(),
            hotspot_name: credential.hotspot_name.clone(),
            dns_name: credential.dns_name.clone(),
        }
    }
}

fn parse_id(id: String) -> ApiResult<RouterId> {
    RouterId::new(id).map_err(|e| ApiError::validation(e.to_string()))
}

fn generate_id() -> ApiResult<RouterId> {
    let mut bytes = [0u8; 8];
    rand::thread_rng().fill_bytes(&mut bytes);
    RouterId::new(hex::encode(bytes)).map_err(|_| ApiError::Internal)
}

/// `GET /api/routers`
pub async fn list(State(state): State<AppState>) -> ApiResult<Success<Vec<RouterView>>> {
    let routers = state.inventory.list().await?;
    Ok(Success(
        routers
            .iter()
            .map(|(id, credential)| RouterView::new(id, credential))
            .collect(),
    ))
}

/// `POST /api/routers`: create, or replace when `id` names an existing entry.
pub async fn upsert(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Success<RouterView>> {
    let input: RouterInput = validate(&ROUTER, json_body(payload)?)?;
    let id = match input.id.clone() {
        Some(id) => parse_id(id)?,
        None => generate_id()?,
    };

    let credential = input.into_credential(state.gateway.default_port());
    credential
        .check()
        .map_err(|e| ApiError::validation(e.to_string()))?;

    state.inventory.upsert(id.clone(), credential.clone()).await?;
    info!(router_id = %id, host = %credential.host, "router saved");
    Ok(Success(RouterView::new(&id, &credential)))
}

/// `DELETE /api/routers/:id`
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Success<()>> {
    let id = parse_id(id)?;
    if !state.inventory.delete(&id).await? {
        return Err(ApiError::NotFound("router".to_string()));
    }
    info!(router_id = %id, "router deleted");
    Ok(Success(()))
}
