//! # Router Connection Lifecycle Tests
//!
//! Drive the client against the scripted mock router over real TCP.
//!
//! 1. **Connect** - login success, rejected credentials, legacy challenge,
//!    timeout bound, refused port
//! 2. **Commands** - records, ids from `add`, traps, tag correlation
//! 3. **Release** - disconnect is idempotent and closes the socket

use std::time::{Duration, Instant};

use rcg_01_router_protocol::testing::{done, done_ret, re, trap, MockOptions, MockRouter};
use rcg_01_router_protocol::{
    ConnectionState, HotspotUserParams, ResourceAction, RouterConnection, RouterError, TrapKind,
    Word,
};
use shared_types::RouterCredential;
use tokio::net::TcpListener;

// =============================================================================
// TEST HELPERS
// =============================================================================

const TIMEOUT: Duration = Duration::from_secs(2);

fn hotspot_router(words: &[String]) -> Vec<Vec<String>> {
    match words[0].as_str() {
        "/ip/hotspot/user/print" => {
            if words.iter().any(|w| w == "?name=ghost") {
                return vec![done()];
            }
            vec![
                re(&[(".id", "*1"), ("name", "vc1001"), ("profile", "1h")]),
                re(&[(".id", "*2"), ("name", "vc1002"), ("disabled", "true")]),
                done(),
            ]
        }
        "/ip/hotspot/user/add" => {
            if words.iter().any(|w| w == "=name=taken") {
                vec![trap("failure: already have user with this name"), done()]
            } else {
                vec![done_ret("*A")]
            }
        }
        "/system/resource/print" => vec![
            re(&[("uptime", "1d2h"), ("version", "7.14.2"), ("cpu-load", "3")]),
            done(),
        ],
        "/interface/monitor-traffic" => vec![
            re(&[("name", "ether1"), ("rx-bits-per-second", "1200")]),
            done(),
        ],
        "/nope/print" => vec![trap("no such command prefix"), done()],
        _ if words[0].ends_with("/print") => vec![done()],
        _ => vec![done()],
    }
}

async fn connected(mock: &MockRouter) -> RouterConnection {
    RouterConnection::open(&mock.credential(), TIMEOUT)
        .await
        .expect("mock login should succeed")
}

// =============================================================================
// CONNECT
// =============================================================================

#[tokio::test]
async fn test_connect_and_list() {
    let mock = MockRouter::start(hotspot_router).await.unwrap();
    let mut conn = connected(&mock).await;
    assert_eq!(conn.state(), ConnectionState::Connected);

    let users = conn.hotspot_users().list(Vec::new()).await.unwrap();
    assert_eq!(users.len(), 2);
    assert_eq!(users[0].id(), Some("*1"));
    assert!(users[1].is_disabled());

    conn.disconnect().await;
    assert_eq!(conn.state(), ConnectionState::Disconnected);
}

#[tokio::test]
async fn test_rejected_credentials_leave_disconnected() {
    let mock = MockRouter::start(hotspot_router).await.unwrap();
    let mut credential = mock.credential();
    credential.password = "wrong".to_string();

    let mut conn = RouterConnection::new();
    let err = conn.connect(&credential, TIMEOUT).await.unwrap_err();
    assert!(matches!(err, RouterError::AuthRejected(ref m) if m.contains("invalid user name")));
    assert!(err.is_connect_failure());
    assert_eq!(conn.state(), ConnectionState::Disconnected);

    let err = conn.write("/system/resource/print", Vec::new()).await.unwrap_err();
    assert!(matches!(err, RouterError::NotConnected));
}

#[tokio::test]
async fn test_legacy_challenge_is_rejected() {
    let options = MockOptions {
        legacy_login: true,
        ..Default::default()
    };
    let mock = MockRouter::start_with(options, hotspot_router).await.unwrap();

    let err = RouterConnection::open(&mock.credential(), TIMEOUT)
        .await
        .unwrap_err();
    assert!(matches!(err, RouterError::AuthRejected(_)));
}

#[tokio::test]
async fn test_silent_router_times_out_within_bound() {
    let options = MockOptions {
        silent: true,
        ..Default::default()
    };
    let mock = MockRouter::start_with(options, hotspot_router).await.unwrap();
    let bound = Duration::from_millis(200);

    let mut conn = RouterConnection::new();
    let started = Instant::now();
    let err = conn.connect(&mock.credential(), bound).await.unwrap_err();

    assert!(matches!(err, RouterError::ConnectTimeout(d) if d == bound));
    assert!(started.elapsed() < Duration::from_secs(2));
    assert_eq!(conn.state(), ConnectionState::Disconnected);

    let err = conn.write("/system/resource/print", Vec::new()).await.unwrap_err();
    assert!(matches!(err, RouterError::NotConnected));
}

#[tokio::test]
async fn test_unreachable_port_fails_fast() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let mut credential = RouterCredential::new("127.0.0.1", "admin", "secret");
    credential.port = port;

    let mut conn = RouterConnection::new();
    let started = Instant::now();
    let err = conn.connect(&credential, TIMEOUT).await.unwrap_err();

    assert!(err.is_connect_failure());
    assert!(started.elapsed() <= TIMEOUT + Duration::from_millis(500));
    assert!(matches!(
        conn.write("/system/resource/print", Vec::new()).await,
        Err(RouterError::NotConnected)
    ));
}

#[tokio::test]
async fn test_connect_twice_is_refused() {
    let mock = MockRouter::start(hotspot_router).await.unwrap();
    let mut conn = connected(&mock).await;
    let err = conn.connect(&mock.credential(), TIMEOUT).await.unwrap_err();
    assert!(matches!(err, RouterError::AlreadyConnected));
    assert!(conn.is_connected());
    conn.disconnect().await;
}

// =============================================================================
// COMMANDS
// =============================================================================

#[tokio::test]
async fn test_add_sends_only_defined_fields_and_returns_id() {
    let mock = MockRouter::start(hotspot_router).await.unwrap();
    let mut conn = connected(&mock).await;

    let params = HotspotUserParams {
        name: Some("vc1234".into()),
        password: Some("vc1234".into()),
        profile: Some("default".into()),
        comment: None,
        ..Default::default()
    };
    let id = conn.hotspot_users().add(&params).await.unwrap();
    assert_eq!(id, "*A");
    conn.disconnect().await;
    assert!(mock.wait_all_closed(Duration::from_secs(2)).await);

    let commands = mock.commands();
    assert_eq!(
        commands[0],
        vec![
            "/ip/hotspot/user/add",
            "=name=vc1234",
            "=password=vc1234",
            "=profile=default"
        ]
    );
    assert_eq!(commands.last().unwrap(), &vec!["/quit".to_string()]);
}

#[tokio::test]
async fn test_trap_preserves_router_message() {
    let mock = MockRouter::start(hotspot_router).await.unwrap();
    let mut conn = connected(&mock).await;

    let params = HotspotUserParams {
        name: Some("taken".into()),
        ..Default::default()
    };
    let err = conn.hotspot_users().add(&params).await.unwrap_err();
    assert!(matches!(
        err,
        RouterError::Trap { ref message, .. } if message.contains("already have user")
    ));
    assert_eq!(err.trap_kind(), Some(TrapKind::Other));

    // a trap does not poison the session
    assert!(conn.is_connected());
    let resource = conn.system().resource().await.unwrap();
    assert_eq!(resource.get("version"), Some("7.14.2"));

    let err = conn.write("/nope/print", Vec::new()).await.unwrap_err();
    assert_eq!(err.trap_kind(), Some(TrapKind::NoSuchCommand));
    conn.disconnect().await;
}

#[tokio::test]
async fn test_actions_and_queries() {
    let mock = MockRouter::start(hotspot_router).await.unwrap();
    let mut conn = connected(&mock).await;

    assert!(conn.hotspot_users().find_by_name("ghost").await.unwrap().is_none());
    conn.hotspot_users()
        .apply(ResourceAction::Disable, "*2")
        .await
        .unwrap();
    conn.hotspot_users().reset_counters("*1").await.unwrap();
    conn.dhcp_leases().make_static("*9").await.unwrap();
    conn.hotspot_active().remove("*4").await.unwrap();

    let sample = conn.system().monitor_traffic("ether1").await.unwrap();
    assert_eq!(sample.get("rx-bits-per-second"), Some("1200"));
    conn.disconnect().await;

    let commands = mock.commands();
    assert_eq!(commands[0], vec!["/ip/hotspot/user/print", "?name=ghost"]);
    assert_eq!(commands[1], vec!["/ip/hotspot/user/disable", "=.id=*2"]);
    assert_eq!(commands[2], vec!["/ip/hotspot/user/reset-counters", "=.id=*1"]);
    assert_eq!(commands[3], vec!["/ip/dhcp-server/lease/make-static", "=.id=*9"]);
    assert_eq!(commands[4], vec!["/ip/hotspot/active/remove", "=.id=*4"]);
    assert_eq!(
        commands[5],
        vec!["/interface/monitor-traffic", "=interface=ether1", "=once="]
    );
}

#[tokio::test]
async fn test_proplist_and_raw_write() {
    let mock = MockRouter::start(hotspot_router).await.unwrap();
    let mut conn = connected(&mock).await;

    let records = conn
        .write(
            "/ip/hotspot/user/print",
            vec![Word::ProplistFilter(vec![".id".into(), "name".into()])],
        )
        .await
        .unwrap();
    assert_eq!(records.len(), 2);
    conn.disconnect().await;

    assert_eq!(
        mock.commands()[0],
        vec!["/ip/hotspot/user/print", "=.proplist=.id,name"]
    );
}

// =============================================================================
// RELEASE
// =============================================================================

#[tokio::test]
async fn test_disconnect_idempotent_and_closes_socket() {
    let mock = MockRouter::start(hotspot_router).await.unwrap();
    let mut conn = connected(&mock).await;

    conn.disconnect().await;
    conn.disconnect().await;
    assert_eq!(conn.state(), ConnectionState::Disconnected);
    assert!(mock.wait_all_closed(Duration::from_secs(2)).await);

    let err = conn.write("/system/resource/print", Vec::new()).await.unwrap_err();
    assert!(matches!(err, RouterError::NotConnected));
}

#[tokio::test]
async fn test_dropped_handle_releases_socket() {
    let mock = MockRouter::start(hotspot_router).await.unwrap();
    {
        let mut conn = connected(&mock).await;
        conn.system().identity().await.unwrap_err();
    }
    assert!(mock.wait_all_closed(Duration::from_secs(2)).await);
    assert_eq!(mock.opened(), 1);
}
