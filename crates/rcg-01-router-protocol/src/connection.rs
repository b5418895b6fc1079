//! # Router Connection
//!
//! One live API session to one router.
//!
//! ```text
//! Disconnected ──connect──▶ Connecting ──login ok──▶ Connected
//!      ▲                        │                        │
//!      └────── any failure ─────┘◀──── disconnect ───────┘
//! ```
//!
//! TCP connect and login share a single timeout bound. Writes are strictly
//! serial: one tagged sentence out, one reply batch back.

use std::time::Duration;

use shared_types::RouterCredential;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tracing::{debug, info, warn};

use crate::domain::command::Command;
use crate::domain::reply::{Record, Reply, ReplyKind, Sentence};
use crate::domain::word::Word;
use crate::error::{RouterError, RouterResult};
use crate::wire;

/// Bound on the best-effort `/quit` during disconnect.
const QUIT_TIMEOUT: Duration = Duration::from_millis(500);

/// Lifecycle state of a [`RouterConnection`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No transport.
    Disconnected,
    /// TCP connect or login in flight.
    Connecting,
    /// Logged in and usable.
    Connected,
}

type Transport = BufReader<TcpStream>;

/// Handle to one RouterOS API session.
///
/// Not shared and not pooled: each request owns its own handle.
pub struct RouterConnection {
    state: ConnectionState,
    transport: Option<Transport>,
    next_tag: u32,
    peer: String,
}

impl Default for RouterConnection {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for RouterConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouterConnection")
            .field("state", &self.state)
            .field("peer", &self.peer)
            .finish()
    }
}

impl RouterConnection {
    /// Create a disconnected handle.
    pub fn new() -> Self {
        Self {
            state: ConnectionState::Disconnected,
            transport: None,
            next_tag: 0,
            peer: String::new(),
        }
    }

    /// Create a handle and connect it.
    pub async fn open(credential: &RouterCredential, timeout: Duration) -> RouterResult<Self> {
        let mut conn = Self::new();
        conn.connect(credential, timeout).await?;
        Ok(conn)
    }

    /// Current state.
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// True once logged in.
    pub fn is_connected(&self) -> bool {
        self.state == ConnectionState::Connected
    }

    /// Open the transport and log in, all within `timeout`.
    ///
    /// Any failure leaves the handle `Disconnected`. The distinguishing
    /// cause is logged here and kept in the error; callers facing end users
    /// should not repeat it.
    pub async fn connect(
        &mut self,
        credential: &RouterCredential,
        timeout: Duration,
    ) -> RouterResult<()> {
        if self.state != ConnectionState::Disconnected {
            return Err(RouterError::AlreadyConnected);
        }

        let peer = credential.address();
        self.state = ConnectionState::Connecting;
        debug!(peer = %peer, "connecting to router API");

        let outcome = match tokio::time::timeout(timeout, handshake(credential, &peer)).await {
            Ok(result) => result,
            Err(_) => Err(RouterError::ConnectTimeout(timeout)),
        };

        match outcome {
            Ok(transport) => {
                self.transport = Some(transport);
                self.state = ConnectionState::Connected;
                self.next_tag = 1;
                info!(peer = %peer, user = %credential.username, "router session opened");
                self.peer = peer;
                Ok(())
            }
            Err(err) => {
                self.state = ConnectionState::Disconnected;
                warn!(peer = %peer, outcome = err.outcome(), error = %err, "router connect failed");
                Err(err)
            }
        }
    }

    /// Send one command and collect its `!re` records.
    pub async fn write(&mut self, path: &str, words: Vec<Word>) -> RouterResult<Vec<Record>> {
        let reply = self.execute(&Command::with_words(path, words)).await?;
        Ok(reply.records)
    }

    /// Send one command and return the whole reply batch.
    pub async fn execute(&mut self, command: &Command) -> RouterResult<Reply> {
        command.validate()?;
        let transport = self.transport.as_mut().ok_or(RouterError::NotConnected)?;

        let tag = self.next_tag;
        self.next_tag = self.next_tag.wrapping_add(1);

        debug!(peer = %self.peer, path = command.path(), tag, "router command");
        let result = exchange(transport, command, tag).await;

        if let Err(err) = &result {
            if err.poisons_connection() {
                warn!(peer = %self.peer, path = command.path(), error = %err, "router session lost");
                self.transport = None;
                self.state = ConnectionState::Disconnected;
            } else {
                debug!(peer = %self.peer, path = command.path(), error = %err, "router command failed");
            }
        }
        result
    }

    /// Close the session. Safe to call in any state.
    pub async fn disconnect(&mut self) {
        self.state = ConnectionState::Disconnected;
        let Some(mut transport) = self.transport.take() else {
            return;
        };

        let quit = async {
            wire::write_sentence(&mut transport, &["/quit"]).await?;
            transport.get_mut().shutdown().await?;
            Ok::<_, RouterError>(())
        };
        if let Ok(Err(err)) = tokio::time::timeout(QUIT_TIMEOUT, quit).await {
            debug!(peer = %self.peer, error = %err, "quit not delivered");
        }
        debug!(peer = %self.peer, "router session closed");
    }
}

async fn handshake(credential: &RouterCredential, peer: &str) -> RouterResult<Transport> {
    let stream = TcpStream::connect(peer)
        .await
        .map_err(|e| RouterError::ConnectRefused(e.to_string()))?;
    stream.set_nodelay(true).ok();
    let mut transport = BufReader::new(stream);

    let login = Command::new("/login")
        .attr("name", credential.username.as_str())
        .attr("password", credential.password.as_str());

    match exchange(&mut transport, &login, 0).await {
        // pre-6.43 routers answer with an MD5 challenge instead
        Ok(reply) if reply.ret().is_some() => Err(RouterError::AuthRejected(
            "router requested legacy challenge login".to_string(),
        )),
        Ok(_) => Ok(transport),
        Err(RouterError::Trap { message, .. }) => Err(RouterError::AuthRejected(message)),
        Err(err) => Err(err),
    }
}

/// Write one tagged sentence and read until its `!done`.
async fn exchange<S>(stream: &mut S, command: &Command, tag: u32) -> RouterResult<Reply>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    wire::write_sentence(stream, &command.to_sentence(tag)).await?;

    let expected = tag.to_string();
    let mut reply = Reply::default();
    let mut trap = None;

    loop {
        let words = wire::read_sentence(stream).await?;
        if words.is_empty() {
            continue;
        }
        let sentence = Sentence::parse(words)?;

        // !fatal is untagged and ends the session whatever was in flight
        let correlated = sentence.tag.as_deref() == Some(expected.as_str());
        if sentence.kind != ReplyKind::Fatal && !correlated {
            debug!(tag = ?sentence.tag, expected = %expected, "discarding uncorrelated reply");
            continue;
        }

        match sentence.kind {
            ReplyKind::Re => reply.records.push(Record::new(sentence.attributes)),
            ReplyKind::Trap => {
                // keep the first trap; the batch still ends with !done
                if trap.is_none() {
                    trap = Some(sentence.into_trap());
                }
            }
            ReplyKind::Empty => {}
            ReplyKind::Done => {
                return match trap {
                    Some(err) => Err(err),
                    None => {
                        reply.done = sentence.attributes;
                        Ok(reply)
                    }
                };
            }
            ReplyKind::Fatal => return Err(RouterError::Fatal(sentence.message())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_write_without_connect() {
        let mut conn = RouterConnection::new();
        let err = conn.write("/system/resource/print", vec![]).await.unwrap_err();
        assert!(matches!(err, RouterError::NotConnected));
        assert_eq!(conn.state(), ConnectionState::Disconnected);
    }

    #[tokio::test]
    async fn test_invalid_path_checked_before_connection() {
        let mut conn = RouterConnection::new();
        let err = conn.write("system resource", vec![]).await.unwrap_err();
        assert!(matches!(err, RouterError::InvalidPath(_)));
    }

    #[tokio::test]
    async fn test_disconnect_is_idempotent() {
        let mut conn = RouterConnection::new();
        conn.disconnect().await;
        conn.disconnect().await;
        assert_eq!(conn.state(), ConnectionState::Disconnected);
    }

    #[tokio::test]
    async fn test_exchange_collects_records_and_ret() {
        let (mut client, mut server) = tokio::io::duplex(4096);
        let router = tokio::spawn(async move {
            let request = wire::read_sentence(&mut server).await.unwrap();
            assert_eq!(request.last().map(String::as_str), Some(".tag=3"));
            wire::write_sentence(&mut server, &["!re", "=name=a", ".tag=9"]).await.unwrap();
            wire::write_sentence(&mut server, &["!re", "=name=b", ".tag=3"]).await.unwrap();
            wire::write_sentence(&mut server, &["!done", "=ret=*5", ".tag=3"]).await.unwrap();
        });

        let reply = exchange(&mut client, &Command::new("/ip/hotspot/user/print"), 3)
            .await
            .unwrap();
        router.await.unwrap();

        assert_eq!(reply.records.len(), 1);
        assert_eq!(reply.records[0].get("name"), Some("b"));
        assert_eq!(reply.ret(), Some("*5"));
    }

    #[tokio::test]
    async fn test_exchange_trap_then_done() {
        let (mut client, mut server) = tokio::io::duplex(4096);
        tokio::spawn(async move {
            let _ = wire::read_sentence(&mut server).await;
            let _ = wire::write_sentence(
                &mut server,
                &["!trap", "=message=no such command", ".tag=1"],
            )
            .await;
            let _ = wire::write_sentence(&mut server, &["!done", ".tag=1"]).await;
        });

        let err = exchange(&mut client, &Command::new("/nope/print"), 1)
            .await
            .unwrap_err();
        assert!(matches!(err, RouterError::Trap { ref message, .. } if message == "no such command"));
    }
}
