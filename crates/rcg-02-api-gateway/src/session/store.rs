//! Encrypted session cookie.
//!
//! The cookie carries the router credential sealed by [`TokenCipher`]. Any
//! failure to open it (bad base64, tag mismatch, stale payload) reads as no
//! session at all; the cause reaches only the debug log and a counter.

use std::sync::Arc;
use std::time::Duration;

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use rcg_telemetry::metrics::SESSION_REJECTED;
use serde::{Deserialize, Serialize};
use shared_crypto::{CryptoError, TokenCipher};
use shared_types::{RouterCredential, RouterId};
use tracing::{debug, warn};

use crate::domain::config::SessionConfig;
use crate::domain::error::ApiError;
use crate::ports::outbound::{SystemTimeSource, TimeSource};

/// Payload sealed inside the session cookie.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionData {
    /// Inventory id the session was opened for.
    pub router_id: RouterId,
    /// Login material for that router.
    pub credential: RouterCredential,
    /// Issue time, unix milliseconds.
    pub issued_at_ms: u64,
}

/// Seals, opens and clears the session cookie.
pub struct SessionStore {
    cipher: TokenCipher,
    cookie_name: String,
    max_age: Duration,
    secure: bool,
    clock: Arc<dyn TimeSource>,
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("cookie_name", &self.cookie_name)
            .field("max_age", &self.max_age)
            .field("secure", &self.secure)
            .finish_non_exhaustive()
    }
}

impl SessionStore {
    /// Build from configuration; the key is derived from the configured secret.
    pub fn new(config: &SessionConfig) -> Result<Self, CryptoError> {
        Self::with_clock(config, Arc::new(SystemTimeSource))
    }

    /// Build with an explicit clock.
    pub fn with_clock(
        config: &SessionConfig,
        clock: Arc<dyn TimeSource>,
    ) -> Result<Self, CryptoError> {
        Ok(Self {
            cipher: TokenCipher::from_secret(&config.secret)?,
            cookie_name: config.cookie_name.clone(),
            max_age: config.max_age,
            secure: config.environment.is_production(),
            clock,
        })
    }

    /// Cookie name.
    pub fn cookie_name(&self) -> &str {
        &self.cookie_name
    }

    /// Session data for `router_id` issued now.
    pub fn issue(&self, router_id: RouterId, credential: RouterCredential) -> SessionData {
        SessionData {
            router_id,
            credential,
            issued_at_ms: self.clock.now_millis(),
        }
    }

    /// Seal `data` into the cookie.
    pub fn save(&self, jar: CookieJar, data: &SessionData) -> Result<CookieJar, ApiError> {
        let plaintext = serde_json::to_vec(data).map_err(|e| {
            warn!(error = %e, "session payload did not serialize");
            ApiError::Internal
        })?;
        let token = self.cipher.encrypt(&plaintext).map_err(|e| {
            warn!(error = %e, "session payload did not encrypt");
            ApiError::Internal
        })?;

        let max_age = i64::try_from(self.max_age.as_secs()).unwrap_or(i64::MAX);
        let cookie = Cookie::build((self.cookie_name.clone(), token))
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(self.secure)
            .path("/")
            .max_age(time::Duration::seconds(max_age));

        debug!(router_id = %data.router_id, "session saved");
        Ok(jar.add(cookie))
    }

    /// Open the cookie, if present and intact.
    ///
    /// Decrypt failures, malformed payloads, implausible credentials and
    /// sessions older than the max age all yield `None`.
    pub fn load(&self, jar: &CookieJar) -> Option<SessionData> {
        let cookie = jar.get(&self.cookie_name)?;
        match self.open(cookie.value()) {
            Ok(data) => Some(data),
            Err(reason) => {
                SESSION_REJECTED.inc();
                debug!(reason, "session cookie rejected");
                None
            }
        }
    }

    fn open(&self, token: &str) -> Result<SessionData, &'static str> {
        let plaintext = self.cipher.decrypt(token).map_err(|e| match e {
            CryptoError::MalformedToken(_) => "malformed",
            _ => "decrypt",
        })?;
        let data: SessionData = serde_json::from_slice(&plaintext).map_err(|_| "payload")?;
        data.credential.check().map_err(|_| "credential")?;

        let age = self.clock.now_millis().saturating_sub(data.issued_at_ms);
        if u128::from(age) > self.max_age.as_millis() {
            return Err("expired");
        }
        Ok(data)
    }

    /// Remove the cookie.
    pub fn clear(&self, jar: CookieJar) -> CookieJar {
        jar.remove(Cookie::build(self.cookie_name.clone()).path("/"))
    }
}
