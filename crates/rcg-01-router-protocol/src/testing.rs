//! Scripted in-process RouterOS API server.
//!
//! Speaks the real sentence codec on `127.0.0.1:0`, answers `/login` and
//! `/quit` itself and hands every other command to a handler closure.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use shared_types::RouterCredential;
use tokio::io::BufReader;
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

use crate::wire;

/// Reply sentences (without tags) for one command (without its tag).
pub type Handler = Arc<dyn Fn(&[String]) -> Vec<Vec<String>> + Send + Sync>;

/// Mock behaviour knobs.
#[derive(Debug, Clone)]
pub struct MockOptions {
    /// Accepted login name.
    pub username: String,
    /// Accepted login password.
    pub password: String,
    /// Answer login with a pre-6.43 `=ret=` challenge.
    pub legacy_login: bool,
    /// Accept TCP but never reply.
    pub silent: bool,
}

impl Default for MockOptions {
    fn default() -> Self {
        Self {
            username: "admin".to_string(),
            password: "secret".to_string(),
            legacy_login: false,
            silent: false,
        }
    }
}

#[derive(Default)]
struct Shared {
    commands: Mutex<Vec<Vec<String>>>,
    opened: AtomicUsize,
    closed: AtomicUsize,
}

/// Running mock router; the listener stops when this is dropped.
pub struct MockRouter {
    addr: SocketAddr,
    options: MockOptions,
    shared: Arc<Shared>,
    task: JoinHandle<()>,
}

impl MockRouter {
    /// Start with default options.
    pub async fn start<F>(handler: F) -> std::io::Result<Self>
    where
        F: Fn(&[String]) -> Vec<Vec<String>> + Send + Sync + 'static,
    {
        Self::start_with(MockOptions::default(), handler).await
    }

    /// Start with explicit options.
    pub async fn start_with<F>(options: MockOptions, handler: F) -> std::io::Result<Self>
    where
        F: Fn(&[String]) -> Vec<Vec<String>> + Send + Sync + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let shared = Arc::new(Shared::default());
        let handler: Handler = Arc::new(handler);

        let task = {
            let shared = shared.clone();
            let options = options.clone();
            tokio::spawn(async move {
                while let Ok((stream, _)) = listener.accept().await {
                    shared.opened.fetch_add(1, Ordering::SeqCst);
                    let shared = shared.clone();
                    let options = options.clone();
                    let handler = handler.clone();
                    tokio::spawn(async move {
                        serve(stream, &options, &shared, &handler).await;
                        shared.closed.fetch_add(1, Ordering::SeqCst);
                    });
                }
            })
        };

        Ok(Self {
            addr,
            options,
            shared,
            task,
        })
    }

    /// Listening address.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Credential that logs in successfully.
    pub fn credential(&self) -> RouterCredential {
        let mut credential = RouterCredential::new(
            self.addr.ip().to_string(),
            self.options.username.clone(),
            self.options.password.clone(),
        );
        credential.port = self.addr.port();
        credential
    }

    /// Commands received after login, tags stripped, `/quit` included.
    pub fn commands(&self) -> Vec<Vec<String>> {
        self.shared.commands.lock().clone()
    }

    /// Connections accepted so far.
    pub fn opened(&self) -> usize {
        self.shared.opened.load(Ordering::SeqCst)
    }

    /// Connections that have ended so far.
    pub fn closed(&self) -> usize {
        self.shared.closed.load(Ordering::SeqCst)
    }

    /// Wait until every accepted connection has ended, up to `limit`.
    pub async fn wait_all_closed(&self, limit: Duration) -> bool {
        let deadline = tokio::time::Instant::now() + limit;
        loop {
            if self.closed() == self.opened() {
                return true;
            }
            if tokio::time::Instant::now() >= deadline {
                return false;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }
}

impl Drop for MockRouter {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// `!re` with the given attributes.
pub fn re(attributes: &[(&str, &str)]) -> Vec<String> {
    let mut sentence = vec!["!re".to_string()];
    sentence.extend(attributes.iter().map(|(k, v)| format!("={k}={v}")));
    sentence
}

/// Plain `!done`.
pub fn done() -> Vec<String> {
    vec!["!done".to_string()]
}

/// `!done =ret=<value>`.
pub fn done_ret(value: &str) -> Vec<String> {
    vec!["!done".to_string(), format!("=ret={value}")]
}

/// `!trap =message=<message>`.
pub fn trap(message: &str) -> Vec<String> {
    vec!["!trap".to_string(), format!("=message={message}")]
}

async fn serve(stream: TcpStream, options: &MockOptions, shared: &Shared, handler: &Handler) {
    let mut stream = BufReader::new(stream);
    let mut logged_in = false;

    loop {
        let Ok(mut words) = wire::read_sentence(&mut stream).await else {
            return;
        };
        if options.silent {
            continue;
        }

        let tag = words
            .iter()
            .position(|w| w.starts_with(".tag="))
            .map(|i| words.remove(i));
        let path = words.first().cloned().unwrap_or_default();

        let replies = if !logged_in {
            if path != "/login" {
                vec![vec!["!fatal".to_string(), "not logged in".to_string()]]
            } else if options.legacy_login {
                vec![done_ret("ebddd18303a54111e2dea05a92ab46b4")]
            } else {
                let name = format!("=name={}", options.username);
                let password = format!("=password={}", options.password);
                if words.contains(&name) && words.contains(&password) {
                    logged_in = true;
                    vec![done()]
                } else {
                    vec![
                        trap("invalid user name or password (6)"),
                        done(),
                    ]
                }
            }
        } else {
            shared.commands.lock().push(words.clone());
            if path == "/quit" {
                vec![vec!["!fatal".to_string(), "session terminated on request".to_string()]]
            } else {
                handler(&words)
            }
        };

        for mut reply in replies {
            let fatal = reply.first().map(String::as_str) == Some("!fatal");
            if let (Some(tag), false) = (&tag, fatal) {
                reply.push(tag.clone());
            }
            if wire::write_sentence(&mut stream, &reply).await.is_err() || fatal {
                return;
            }
        }
    }
}
