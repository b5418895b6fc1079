//! # Session Store
//!
//! One router credential per browser, carried in an HTTP-only cookie as an
//! AES-GCM token. A cookie that fails to open in any way is treated exactly
//! like a missing cookie.

mod store;

pub use store::{SessionData, SessionStore};

use std::sync::Arc;

use axum::async_trait;
use axum::extract::{FromRef, FromRequestParts};
use axum::http::request::Parts;
use axum_extra::extract::cookie::CookieJar;

use crate::domain::error::ApiError;

/// Extractor for handlers that need an open router session.
///
/// Rejects with [`ApiError::Unauthenticated`] when the cookie is absent,
/// tampered, stale or expired.
#[derive(Debug, Clone)]
pub struct RouterSession(pub SessionData);

#[async_trait]
impl<S> FromRequestParts<S> for RouterSession
where
    Arc<SessionStore>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let store = Arc::<SessionStore>::from_ref(state);
        let jar = CookieJar::from_headers(&parts.headers);
        store
            .load(&jar)
            .map(RouterSession)
            .ok_or(ApiError::Unauthenticated)
    }
}
