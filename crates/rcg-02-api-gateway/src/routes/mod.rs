//! HTTP handlers.
//!
//! Every router-facing handler runs the same sequence: the rate limit layer
//! for its tier, the session extractor, the validation gate on the body,
//! then one scoped router connection.

pub mod resources;
pub mod routers;
pub mod session;
pub mod system;
pub mod vouchers;

use axum::extract::rejection::JsonRejection;
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::{json, Value};

use crate::domain::error::{ApiError, ApiResult};

/// `{"success": true, "data": ...}`
#[derive(Debug)]
pub struct Success<T>(pub T);

#[derive(Serialize)]
struct Envelope<'a, T> {
    success: bool,
    data: &'a T,
}

impl<T: Serialize> IntoResponse for Success<T> {
    fn into_response(self) -> Response {
        Json(Envelope {
            success: true,
            data: &self.0,
        })
        .into_response()
    }
}

/// Unwrap a JSON body, reporting malformed bodies as validation errors.
pub(crate) fn json_body(payload: Result<Json<Value>, JsonRejection>) -> ApiResult<Value> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| ApiError::validation(rejection.body_text()))
}

/// Liveness probe.
pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": crate::VERSION,
    }))
}

/// Prometheus text exposition.
pub async fn metrics() -> Response {
    match rcg_telemetry::metrics::render_metrics() {
        Ok(body) => (
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            body,
        )
            .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "metrics rendering failed");
            ApiError::Internal.into_response()
        }
    }
}
