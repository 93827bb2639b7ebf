//! Gateway Integration Tests
//!
//! Each test runs the real client against an in-process mock gateway.
//!
//! Run with: cargo test -p integration-tests --test gateway_tests

use std::time::Duration;

use cordis_common::ClientError;
use cordis_core::{RestGateway, Snowflake};
use cordis_gateway::protocol::OpCode;
use cordis_gateway::{Activity, Event, EventKind, GatewayClient, SocketState, UserStatus};
use integration_tests::{
    eventually, fixtures::*, test_client, test_config, wait_for, Action, Inbound, MockGateway,
};

/// Long enough for the 50ms settle delay to elapse on the client
const AFTER_SETTLE: Duration = Duration::from_millis(300);

fn handshake(ready_frame: serde_json::Value) -> Vec<Action> {
    vec![
        Action::Send(hello(LONG_HEARTBEAT_MS)),
        Action::AwaitOp(OpCode::Identify),
        Action::Send(ready_frame),
    ]
}

fn id(n: u64) -> Snowflake {
    Snowflake::new(n)
}

// ============================================================================
// Handshake
// ============================================================================

#[tokio::test]
async fn test_hello_then_identify() {
    let mut mock = MockGateway::start(vec![vec![
        Action::Send(hello(LONG_HEARTBEAT_MS)),
        Action::AwaitOp(OpCode::Identify),
    ]])
    .await
    .unwrap();

    let client = test_client(mock.url()).unwrap();
    client.connect().await.unwrap();

    let (connection, identify) = mock.expect_op(OpCode::Identify).await.unwrap();
    assert_eq!(connection, 0);
    assert_eq!(identify.d["token"], TEST_TOKEN);
    assert_eq!(identify.d["intents"], 33283);
    assert!(identify.d["properties"]["os"].is_string());
}

#[tokio::test]
async fn test_ready_after_settle_then_resume_on_resume_url() {
    let mut resume_target = MockGateway::start(vec![vec![
        Action::AwaitOp(OpCode::Resume),
        Action::Send(hello(LONG_HEARTBEAT_MS)),
        Action::Send(resumed(2)),
    ]])
    .await
    .unwrap();

    let mut script = handshake(ready(1, Some(resume_target.url())));
    script.push(Action::Wait(AFTER_SETTLE));
    script.push(Action::Send(reconnect()));
    let initial = MockGateway::start(vec![script]).await.unwrap();

    let client = test_client(initial.url()).unwrap();
    let mut events = client.subscribe();
    client.connect().await.unwrap();

    let Event::Ready { user } = wait_for(&mut events, EventKind::Ready).await.unwrap() else {
        unreachable!();
    };
    assert_eq!(user.id, id(1));
    assert_eq!(client.user().unwrap().id, id(1));
    assert_eq!(client.session_id().as_deref(), Some(TEST_SESSION));

    // op 7 forces a reconnect, which must target the resume URL and resume
    let (_, resume) = resume_target.expect_op(OpCode::Resume).await.unwrap();
    assert_eq!(resume.d["session_id"], TEST_SESSION);
    assert_eq!(resume.d["seq"], 1);
    assert_eq!(resume.d["token"], TEST_TOKEN);

    wait_for(&mut events, EventKind::Resumed).await.unwrap();
    assert_eq!(client.state(), SocketState::Ready);
}

// ============================================================================
// Cache
// ============================================================================

#[tokio::test]
async fn test_guild_delete_removes_its_channels() {
    let mut script = handshake(ready(1, None));
    script.push(Action::Send(guild_create(2, 5, &[10, 11])));
    script.push(Action::Wait(AFTER_SETTLE));
    script.push(Action::Send(guild_delete(3, 5)));
    let mock = MockGateway::start(vec![script]).await.unwrap();

    let client = test_client(mock.url()).unwrap();
    let mut events = client.subscribe();
    client.connect().await.unwrap();

    wait_for(&mut events, EventKind::Ready).await.unwrap();
    let cache = client.cache();
    assert!(cache.channels().get(id(10)).is_some());
    assert!(cache.channels().get(id(11)).is_some());
    assert_eq!(cache.guilds().get(id(5)).unwrap().channel_ids.len(), 2);

    let event = wait_for(&mut events, EventKind::GuildDelete).await.unwrap();
    assert!(matches!(event, Event::GuildDelete { guild: Some(_), .. }));
    assert!(cache.channels().get(id(10)).is_none());
    assert!(cache.channels().get(id(11)).is_none());
    assert!(cache.guilds().get(id(5)).is_none());
}

#[tokio::test]
async fn test_events_before_ready_are_not_delivered() {
    let mut script = handshake(ready(1, None));
    script.push(Action::Send(guild_create(2, 5, &[10])));
    let mock = MockGateway::start(vec![script]).await.unwrap();

    let client = test_client(mock.url()).unwrap();
    let mut events = client.subscribe();
    client.connect().await.unwrap();

    // GUILD_CREATE lands during the settle window: cached, not emitted
    wait_for(&mut events, EventKind::Ready).await.unwrap();
    assert!(events.try_recv().is_err());
    assert!(client.cache().guilds().get(id(5)).is_some());
    assert!(client.permissions().has_permission(
        id(5),
        id(1),
        cordis_core::Permissions::all()
    ));
}

// ============================================================================
// Reconnect
// ============================================================================

#[tokio::test]
async fn test_close_reconnects_and_resumes() {
    let mut first = handshake(ready(5, None));
    first.push(Action::Wait(AFTER_SETTLE));
    first.push(Action::Close(4000));
    let mut mock = MockGateway::start(vec![first, vec![Action::AwaitOp(OpCode::Resume)]])
        .await
        .unwrap();

    let client = test_client(mock.url()).unwrap();
    client.connect().await.unwrap();

    mock.expect_op(OpCode::Identify).await.unwrap();
    let (connection, resume) = mock.expect_op(OpCode::Resume).await.unwrap();
    assert_eq!(connection, 1);
    assert_eq!(resume.d["seq"], 5);
    assert_eq!(resume.d["session_id"], TEST_SESSION);
}

#[tokio::test]
async fn test_close_during_settle_still_delivers_ready() {
    let mut first = handshake(ready(5, None));
    first.push(Action::Close(4000));
    let second = vec![
        Action::AwaitOp(OpCode::Resume),
        Action::Send(hello(LONG_HEARTBEAT_MS)),
        Action::Send(resumed(6)),
    ];
    let mut mock = MockGateway::start(vec![first, second]).await.unwrap();

    // Settle outlasts the reconnect, so the socket drops before READY is released
    let config = test_config(mock.url()).with_ready_settle(Duration::from_secs(2));
    let client = GatewayClient::new(config).unwrap();
    let mut events = client.subscribe();
    client.connect().await.unwrap();

    mock.expect_op(OpCode::Identify).await.unwrap();
    let (connection, resume) = mock.expect_op(OpCode::Resume).await.unwrap();
    assert_eq!(connection, 1);
    assert_eq!(resume.d["seq"], 5);

    let Event::Ready { user } = wait_for(&mut events, EventKind::Ready).await.unwrap() else {
        unreachable!();
    };
    assert_eq!(user.id, id(1));
    wait_for(&mut events, EventKind::Resumed).await.unwrap();
    assert_eq!(client.state(), SocketState::Ready);
    assert!(client.is_ready());
}

#[tokio::test]
async fn test_unresumable_close_identifies_again() {
    let mut first = handshake(ready(5, None));
    first.push(Action::Wait(AFTER_SETTLE));
    first.push(Action::Close(4009));
    let second = vec![
        Action::Send(hello(LONG_HEARTBEAT_MS)),
        Action::AwaitOp(OpCode::Identify),
    ];
    let mut mock = MockGateway::start(vec![first, second]).await.unwrap();

    let client = test_client(mock.url()).unwrap();
    client.connect().await.unwrap();

    mock.expect_op(OpCode::Identify).await.unwrap();
    // A resume frame here would fail the expectation
    let (connection, _) = mock.expect_op(OpCode::Identify).await.unwrap();
    assert_eq!(connection, 1);
    assert!(client.session_id().is_none());
}

#[tokio::test]
async fn test_invalid_session_starts_over() {
    let mut first = handshake(ready(3, None));
    first.push(Action::Wait(AFTER_SETTLE));
    first.push(Action::Send(invalid_session(false)));
    let second = vec![
        Action::Send(hello(LONG_HEARTBEAT_MS)),
        Action::AwaitOp(OpCode::Identify),
    ];
    let mut mock = MockGateway::start(vec![first, second]).await.unwrap();

    let client = test_client(mock.url()).unwrap();
    client.connect().await.unwrap();

    mock.expect_op(OpCode::Identify).await.unwrap();
    let (connection, _) = mock.expect_op(OpCode::Identify).await.unwrap();
    assert_eq!(connection, 1);
}

// ============================================================================
// Heartbeat and presence
// ============================================================================

#[tokio::test]
async fn test_heartbeat_carries_last_sequence() {
    let mock_script = vec![
        Action::Send(hello(100)),
        Action::AwaitOp(OpCode::Identify),
        Action::Send(ready(3, None)),
    ];
    let mut mock = MockGateway::start(vec![mock_script]).await.unwrap();

    let client = test_client(mock.url()).unwrap();
    client.connect().await.unwrap();
    mock.expect_op(OpCode::Identify).await.unwrap();

    loop {
        let (_, beat) = mock.expect_op(OpCode::Heartbeat).await.unwrap();
        if beat.d == serde_json::json!(3) {
            break;
        }
    }

    // The mock acknowledges every heartbeat
    eventually(|| client.latency().is_some()).await.unwrap();
}

#[tokio::test]
async fn test_presence_update_is_sent() {
    let mut mock = MockGateway::start(vec![handshake(ready(1, None))]).await.unwrap();

    let client = test_client(mock.url()).unwrap();
    let mut events = client.subscribe();
    client.connect().await.unwrap();
    wait_for(&mut events, EventKind::Ready).await.unwrap();
    mock.expect_op(OpCode::Identify).await.unwrap();

    client
        .update_presence(UserStatus::Idle, Some(Activity::playing("chess")))
        .await
        .unwrap();

    let (_, presence) = mock.expect_op(OpCode::PresenceUpdate).await.unwrap();
    assert_eq!(presence.d["status"], "idle");
    assert_eq!(presence.d["activities"][0]["name"], "chess");
    assert_eq!(presence.d["afk"], false);
}

// ============================================================================
// Disconnect
// ============================================================================

#[tokio::test]
async fn test_disconnect_is_terminal() {
    let mut mock = MockGateway::start(vec![handshake(ready(1, None))]).await.unwrap();

    let client = test_client(mock.url()).unwrap();
    let mut events = client.subscribe();
    client.connect().await.unwrap();
    wait_for(&mut events, EventKind::Ready).await.unwrap();

    client.disconnect().await;

    let (connection, code) = mock.expect_closed().await.unwrap();
    assert_eq!(connection, 0);
    assert_eq!(code, Some(1000));
    assert_eq!(client.state(), SocketState::Disconnected);
    assert!(!client.rest().is_token_valid());
    assert!(matches!(
        client.connect().await,
        Err(ClientError::SessionTerminated)
    ));

    // No reconnect follows an explicit disconnect
    let late = tokio::time::timeout(AFTER_SETTLE, mock.next()).await;
    assert!(
        !matches!(late, Ok(Ok(Inbound::Frame { connection, .. })) if connection > 0),
        "client reconnected after disconnect"
    );
}
