//! `POST /api/vouchers`

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use serde_json::Value;
use tracing::info;

use super::{json_body, Success};
use crate::domain::error::ApiResult;
use crate::service::AppState;
use crate::session::RouterSession;
use crate::validation::schemas::{VoucherBatchInput, VOUCHER_BATCH};
use crate::validation::validate;
use crate::vouchers::{self, Voucher};

/// Generate a batch and create every voucher in one router session.
pub async fn create(
    State(state): State<AppState>,
    RouterSession(session): RouterSession,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Success<Vec<Voucher>>> {
    let input: VoucherBatchInput = validate(&VOUCHER_BATCH, json_body(payload)?)?;
    let users = vouchers::plan(&mut rand::thread_rng(), &input);

    let created = state
        .gateway
        .with_router(&session.credential, move |conn| {
            Box::pin(vouchers::create_batch(conn, users))
        })
        .await?;

    info!(
        router_id = %session.router_id,
        count = created.len(),
        profile = %input.profile,
        "vouchers issued"
    );
    Ok(Success(created))
}
