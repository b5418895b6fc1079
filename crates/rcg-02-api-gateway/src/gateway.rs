//! Scoped router access for one request.
//!
//! Every call opens its own connection, runs the caller's writes serially on
//! it and disconnects before returning, whatever the outcome. Connections
//! are never pooled or shared between requests.

use std::time::Duration;

use futures::future::BoxFuture;
use rcg_01_router_protocol::{Record, RouterConnection, RouterError, RouterResult};
use rcg_telemetry::metrics::{ROUTER_COMMANDS, ROUTER_CONNECTS};
use shared_types::RouterCredential;
use tracing::{debug, warn};

use crate::domain::config::RouterConfig;
use crate::domain::error::{ApiError, ApiResult};

/// Opens, uses and releases router connections.
#[derive(Debug, Clone)]
pub struct RouterGateway {
    connect_timeout: Duration,
    default_port: u16,
}

impl RouterGateway {
    /// Gateway with an explicit connect timeout.
    pub fn new(connect_timeout: Duration, default_port: u16) -> Self {
        Self {
            connect_timeout,
            default_port,
        }
    }

    /// Gateway from the `[router]` config section.
    pub fn from_config(config: &RouterConfig) -> Self {
        Self::new(config.connect_timeout, config.default_port)
    }

    /// Port assumed for routers submitted without one.
    pub fn default_port(&self) -> u16 {
        self.default_port
    }

    /// Run `op` on a fresh connection to `credential`.
    ///
    /// The connection is closed on every path: after success, after a
    /// failed write, and (by drop) when the request future is abandoned.
    /// Connect failures surface as the generic [`ApiError::ConnectFailure`];
    /// the cause is only logged.
    pub async fn with_router<T, F>(&self, credential: &RouterCredential, op: F) -> ApiResult<T>
    where
        F: for<'c> FnOnce(&'c mut RouterConnection) -> BoxFuture<'c, RouterResult<T>> + Send,
        T: Send,
    {
        let mut conn = RouterConnection::new();
        if let Err(err) = conn.connect(credential, self.connect_timeout).await {
            ROUTER_CONNECTS.with_label_values(&[err.outcome()]).inc();
            warn!(
                host = %credential.host,
                port = credential.port,
                outcome = err.outcome(),
                "router unavailable"
            );
            return Err(ApiError::ConnectFailure);
        }
        ROUTER_CONNECTS.with_label_values(&["success"]).inc();

        let result = op(&mut conn).await;
        conn.disconnect().await;

        match result {
            Ok(value) => {
                ROUTER_COMMANDS.with_label_values(&["ok"]).inc();
                Ok(value)
            }
            Err(err) => {
                ROUTER_COMMANDS.with_label_values(&[err.outcome()]).inc();
                Err(command_error(credential, err))
            }
        }
    }

    /// Log in and read the router identity.
    pub async fn test_connection(&self, credential: &RouterCredential) -> ApiResult<Record> {
        self.with_router(credential, |conn| Box::pin(async move { conn.system().identity().await }))
            .await
    }
}

fn command_error(credential: &RouterCredential, err: RouterError) -> ApiError {
    match err {
        RouterError::Unsupported { .. } => {
            debug!(error = %err, "operation not offered by resource");
            ApiError::Validation(err.to_string())
        }
        err => {
            warn!(
                host = %credential.host,
                outcome = err.outcome(),
                kind = ?err.trap_kind(),
                error = %err,
                "router command failed"
            );
            ApiError::CommandFailure
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rcg_01_router_protocol::testing::{done, re, trap, MockRouter};
    use rcg_01_router_protocol::HotspotUserParams;

    fn gateway() -> RouterGateway {
        RouterGateway::new(Duration::from_millis(500), 8728)
    }

    fn handler(command: &[String]) -> Vec<Vec<String>> {
        match command[0].as_str() {
            "/system/identity/print" => vec![re(&[("name", "Office")]), done()],
            "/ip/hotspot/user/print" => vec![re(&[(".id", "*1"), ("name", "vc1")]), done()],
            _ => vec![trap("no such command"), done()],
        }
    }

    async fn last_is_quit(mock: &MockRouter) -> bool {
        assert!(mock.wait_all_closed(Duration::from_secs(2)).await);
        mock.commands()
            .last()
            .is_some_and(|command| command[0] == "/quit")
    }

    #[tokio::test]
    async fn test_success_disconnects() {
        let mock = MockRouter::start(handler).await.unwrap();

        let users = gateway()
            .with_router(&mock.credential(), |conn| {
                Box::pin(async move { conn.hotspot_users().list(Vec::new()).await })
            })
            .await
            .unwrap();

        assert_eq!(users.len(), 1);
        assert_eq!(mock.opened(), 1);
        assert!(last_is_quit(&mock).await);
    }

    #[tokio::test]
    async fn test_failed_write_still_disconnects() {
        let mock = MockRouter::start(handler).await.unwrap();

        let err = gateway()
            .with_router(&mock.credential(), |conn| {
                Box::pin(async move { conn.write("/nope/print", Vec::new()).await })
            })
            .await
            .unwrap_err();

        assert_eq!(err, ApiError::CommandFailure);
        assert!(last_is_quit(&mock).await);
    }

    #[tokio::test]
    async fn test_bad_credentials_are_generic() {
        let mock = MockRouter::start(handler).await.unwrap();
        let mut credential = mock.credential();
        credential.password = "wrong".to_string();

        let err = gateway()
            .with_router(&credential, |conn| Box::pin(async move { conn.system().identity().await }))
            .await
            .unwrap_err();
        assert_eq!(err, ApiError::ConnectFailure);
    }

    #[tokio::test]
    async fn test_unreachable_is_generic() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let mut credential = RouterCredential::new("127.0.0.1", "admin", "secret");
        credential.port = listener.local_addr().unwrap().port();
        drop(listener);

        let err = gateway().test_connection(&credential).await.unwrap_err();
        assert_eq!(err, ApiError::ConnectFailure);
    }

    #[tokio::test]
    async fn test_unsupported_operation_is_validation() {
        let mock = MockRouter::start(handler).await.unwrap();

        let err = gateway()
            .with_router(&mock.credential(), |conn| {
                Box::pin(async move { conn.hotspot_servers().remove("*1").await })
            })
            .await
            .unwrap_err();

        assert!(matches!(err, ApiError::Validation(_)));
        assert!(last_is_quit(&mock).await);
        assert_eq!(mock.commands().len(), 1);
    }

    #[tokio::test]
    async fn test_serial_writes_share_one_connection() {
        let mock = MockRouter::start(|command| match command[0].as_str() {
            "/ip/hotspot/user/add" => vec![vec!["!done".to_string(), "=ret=*9".to_string()]],
            _ => vec![done()],
        })
        .await
        .unwrap();

        let ids = gateway()
            .with_router(&mock.credential(), |conn| {
                Box::pin(async move {
                    let mut ids = Vec::new();
                    for name in ["a", "b", "c"] {
                        let params = HotspotUserParams {
                            name: Some(name.to_string()),
                            ..Default::default()
                        };
                        ids.push(conn.hotspot_users().add(&params).await?);
                    }
                    Ok::<_, RouterError>(ids)
                })
            })
            .await
            .unwrap();

        assert_eq!(ids, vec!["*9", "*9", "*9"]);
        assert_eq!(mock.opened(), 1);
    }

    #[tokio::test]
    async fn test_test_connection_reads_identity() {
        let mock = MockRouter::start(handler).await.unwrap();
        let identity = gateway().test_connection(&mock.credential()).await.unwrap();
        assert_eq!(identity.get("name"), Some("Office"));
    }
}
