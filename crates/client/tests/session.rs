//! Session state machine tests: connect, handshake, reconnect, teardown,
//! and listener dispatch, all against an in-memory transport with tokio's
//! paused clock.

mod support;

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::json;

use cardroom_client::{ConnectionState, EventKind, EventTransport, Session, SessionEvent};

use support::{config, room_json, settle, FakeTransport};

fn session_with(transport: Arc<FakeTransport>) -> Session {
    Session::new(config(), transport as Arc<dyn EventTransport>)
}

#[tokio::test(start_paused = true)]
async fn test_initialize_is_idempotent_and_dials_once() {
    let transport = FakeTransport::new();
    let session = session_with(Arc::clone(&transport));

    assert!(session.initialize(Some("tok1")));
    assert!(!session.initialize(Some("tok1")));
    settle().await;

    assert!(session.is_connected());
    assert_eq!(transport.connect_calls(), 1);

    // Still idempotent while live.
    assert!(!session.initialize(Some("tok2")));
    settle().await;
    assert_eq!(transport.connect_calls(), 1);
    assert_eq!(transport.auth_tokens(), vec![Some("tok1".to_string())]);
}

#[tokio::test(start_paused = true)]
async fn test_bounded_reconnect_with_fixed_delay() {
    let transport = FakeTransport::failing();
    let session = session_with(Arc::clone(&transport));

    session.initialize(None);
    settle().await;

    // Initial dial failed; no retry before the full fixed delay has passed.
    assert_eq!(transport.connect_calls(), 1);
    assert_eq!(session.reconnect_attempts(), 0);

    tokio::time::sleep(Duration::from_millis(4_999)).await;
    settle().await;
    assert_eq!(transport.connect_calls(), 1);

    tokio::time::sleep(Duration::from_millis(1)).await;
    settle().await;
    assert_eq!(transport.connect_calls(), 2);
    assert_eq!(session.reconnect_attempts(), 1);

    // Exhaust the rest of the budget.
    tokio::time::sleep(Duration::from_secs(60)).await;
    settle().await;
    assert_eq!(transport.connect_calls(), 6); // initial + 5 retries
    assert_eq!(session.reconnect_attempts(), 5);
    assert_eq!(session.state(), ConnectionState::Failed);

    // Terminal: nothing more fires, ever.
    tokio::time::sleep(Duration::from_secs(300)).await;
    settle().await;
    assert_eq!(transport.connect_calls(), 6);

    // Attempts are never closer together than the configured delay.
    let times = transport.connect_times();
    for pair in times.windows(2) {
        assert!(pair[1] - pair[0] >= Duration::from_millis(5_000));
    }
}

#[tokio::test(start_paused = true)]
async fn test_successful_reconnect_resets_attempts_and_reauthenticates() {
    let transport = FakeTransport::new();
    let session = session_with(Arc::clone(&transport));

    let changes: Arc<Mutex<Vec<bool>>> = Arc::new(Mutex::new(Vec::new()));
    let changes_inner = Arc::clone(&changes);
    session.on(EventKind::ConnectionChange, move |event| {
        if let SessionEvent::ConnectionChange { connected } = event {
            changes_inner.lock().unwrap().push(*connected);
        }
    });

    session.initialize(Some("tok1"));
    settle().await;
    transport.push_inbound("authenticated", json!({"userId": "u1"}));
    settle().await;
    assert_eq!(session.user_id().as_deref(), Some("u1"));

    transport.drop_connection("mid-hand wifi loss");
    settle().await;
    assert!(!session.is_connected());
    // Identity is kept across a transient drop so the UI can show a
    // reconnect spinner without logging the player out.
    assert_eq!(session.user_id().as_deref(), Some("u1"));

    tokio::time::sleep(Duration::from_millis(5_000)).await;
    settle().await;

    assert!(session.is_connected());
    assert_eq!(session.reconnect_attempts(), 0);
    assert_eq!(transport.connect_calls(), 2);
    // The stored token rides along on every dial.
    assert_eq!(
        transport.auth_tokens(),
        vec![Some("tok1".to_string()), Some("tok1".to_string())]
    );
    assert_eq!(*changes.lock().unwrap(), vec![true, false, true]);
}

#[tokio::test(start_paused = true)]
async fn test_guarded_commands_emit_nothing_while_disconnected() {
    let transport = FakeTransport::new();
    let session = session_with(Arc::clone(&transport));

    session.initialize(None);
    settle().await;
    transport.drop_connection("gone");
    settle().await;
    assert!(!session.is_connected());

    assert!(!session.get_rooms("all"));
    assert!(!session.join_room("r1", None));
    assert!(!session.leave_room("r1"));
    assert!(!session.ready(true, "r1"));
    assert!(!session.start_game("r1"));
    assert!(!session.game_action("fold", json!({}), "r1"));
    assert!(!session.send_chat_message("hi", "r1"));
    assert!(!session.get_room_info("r1"));
    assert!(!session.create_room(cardroom_protocol::CreateRoomParams {
        name: "t".into(),
        is_private: false,
        password: None,
        max_players: 6,
        options: Default::default(),
    }));

    assert!(transport.sent().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_close_cancels_pending_reconnect_timer() {
    let transport = FakeTransport::failing();
    let session = session_with(Arc::clone(&transport));

    session.initialize(None);
    settle().await;
    assert_eq!(transport.connect_calls(), 1);

    // A reconnect is now scheduled; close must disarm it.
    session.close();
    assert_eq!(session.state(), ConnectionState::Disconnected);
    assert!(transport.was_closed());

    tokio::time::sleep(Duration::from_secs(30)).await;
    settle().await;
    assert_eq!(transport.connect_calls(), 1);
    assert_eq!(session.reconnect_attempts(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_close_clears_identity_and_fires_connection_change() {
    let transport = FakeTransport::new();
    let session = session_with(Arc::clone(&transport));

    let changes: Arc<Mutex<Vec<bool>>> = Arc::new(Mutex::new(Vec::new()));
    let changes_inner = Arc::clone(&changes);
    session.on(EventKind::ConnectionChange, move |event| {
        if let SessionEvent::ConnectionChange { connected } = event {
            changes_inner.lock().unwrap().push(*connected);
        }
    });

    session.initialize(Some("tok1"));
    settle().await;
    transport.push_inbound("authenticated", json!({"userId": "u1"}));
    transport.push_inbound("connected", json!({"playerId": "p1"}));
    settle().await;
    assert_eq!(session.user_id().as_deref(), Some("u1"));
    assert_eq!(session.player_id().as_deref(), Some("p1"));

    session.close();
    assert_eq!(session.user_id(), None);
    assert_eq!(session.player_id(), None);
    assert_eq!(*changes.lock().unwrap(), vec![true, false]);

    // Closed for good until the next initialize.
    assert!(!session.get_rooms("all"));
    assert!(session.initialize(Some("tok2")));
    settle().await;
    assert!(session.is_connected());
    assert_eq!(transport.connect_calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_handshake_tolerates_either_order() {
    let transport = FakeTransport::new();
    let session = session_with(Arc::clone(&transport));

    session.initialize(None);
    settle().await;

    // connected ack first, authenticated second
    transport.push_inbound("connected", json!({"playerId": "p7"}));
    transport.push_inbound("authenticated", json!({"userId": "u7"}));
    settle().await;

    assert_eq!(session.player_id().as_deref(), Some("p7"));
    assert_eq!(session.user_id().as_deref(), Some("u7"));
}

#[tokio::test(start_paused = true)]
async fn test_ping_is_answered_with_echoed_timestamp() {
    let transport = FakeTransport::new();
    let session = session_with(Arc::clone(&transport));

    let seen = Arc::new(AtomicU32::new(0));
    for kind in [EventKind::ConnectionChange, EventKind::Error] {
        let seen = Arc::clone(&seen);
        session.on(kind, move |_| {
            seen.fetch_add(1, Ordering::SeqCst);
        });
    }

    session.initialize(None);
    settle().await;
    let before = seen.load(Ordering::SeqCst);

    transport.push_inbound("ping", json!({"time": 1710000000123i64}));
    settle().await;

    let sent = transport.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].name, "pong");
    assert_eq!(sent[0].data, json!({"time": 1710000000123i64}));
    // The probe is not fanned out to listeners.
    assert_eq!(seen.load(Ordering::SeqCst), before);
}

#[tokio::test(start_paused = true)]
async fn test_panicking_listener_does_not_starve_the_next_one() {
    let transport = FakeTransport::new();
    let session = session_with(Arc::clone(&transport));

    session.on(EventKind::RoomCreated, |_| panic!("broken listener"));
    let delivered = Arc::new(AtomicU32::new(0));
    let delivered_inner = Arc::clone(&delivered);
    session.on(EventKind::RoomCreated, move |_| {
        delivered_inner.fetch_add(1, Ordering::SeqCst);
    });

    session.initialize(None);
    settle().await;

    transport.push_inbound("roomCreated", json!({"room": room_json("r1")}));
    settle().await;
    assert_eq!(delivered.load(Ordering::SeqCst), 1);

    // The driver survives and keeps delivering.
    transport.push_inbound("roomCreated", json!({"room": room_json("r2")}));
    settle().await;
    assert_eq!(delivered.load(Ordering::SeqCst), 2);
}

#[tokio::test(start_paused = true)]
async fn test_legacy_and_canonical_names_reach_the_same_listener() {
    let transport = FakeTransport::new();
    let session = session_with(Arc::clone(&transport));

    let rooms: Arc<Mutex<Vec<SessionEvent>>> = Arc::new(Mutex::new(Vec::new()));
    let rooms_inner = Arc::clone(&rooms);
    session.on(EventKind::RoomCreated, move |event| {
        rooms_inner.lock().unwrap().push(event.clone());
    });

    session.initialize(None);
    settle().await;

    transport.push_inbound("room_created", json!({"room": room_json("r1")}));
    transport.push_inbound("roomCreated", json!({"room": room_json("r1")}));
    settle().await;

    let rooms = rooms.lock().unwrap();
    assert_eq!(rooms.len(), 2);
    assert_eq!(rooms[0], rooms[1]);
}

#[tokio::test(start_paused = true)]
async fn test_unknown_event_names_are_dropped_quietly() {
    let transport = FakeTransport::new();
    let session = session_with(Arc::clone(&transport));

    let delivered = Arc::new(AtomicU32::new(0));
    let delivered_inner = Arc::clone(&delivered);
    session.on(EventKind::RoomCreated, move |_| {
        delivered_inner.fetch_add(1, Ordering::SeqCst);
    });

    session.initialize(None);
    settle().await;

    transport.push_inbound("roomExploded", json!({"boom": true}));
    transport.push_inbound("roomCreated", json!({"room": room_json("r1")}));
    settle().await;

    // The bad event is skipped; later traffic is unaffected.
    assert_eq!(delivered.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn test_initialize_connect_authenticate_scenario() {
    let transport = FakeTransport::new();
    let session = session_with(Arc::clone(&transport));

    let changes = Arc::new(AtomicU32::new(0));
    let changes_inner = Arc::clone(&changes);
    session.on(EventKind::ConnectionChange, move |event| {
        if matches!(event, SessionEvent::ConnectionChange { connected: true }) {
            changes_inner.fetch_add(1, Ordering::SeqCst);
        }
    });
    let auths: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
    let auths_inner = Arc::clone(&auths);
    session.on(EventKind::Authenticated, move |event| {
        if let SessionEvent::Authenticated { user_id } = event {
            auths_inner.lock().unwrap().push(user_id.clone());
        }
    });

    session.initialize(Some("tok1"));
    settle().await;
    transport.push_inbound("authenticated", json!({"userId": "u1"}));
    settle().await;

    assert_eq!(session.user_id().as_deref(), Some("u1"));
    assert_eq!(changes.load(Ordering::SeqCst), 1);
    assert_eq!(*auths.lock().unwrap(), vec!["u1".to_string()]);
    assert_eq!(transport.auth_tokens(), vec![Some("tok1".to_string())]);
}

#[tokio::test(start_paused = true)]
async fn test_off_removes_one_or_all_listeners() {
    let transport = FakeTransport::new();
    let session = session_with(Arc::clone(&transport));

    let count = Arc::new(AtomicU32::new(0));
    let count_a = Arc::clone(&count);
    let a = session.on(EventKind::Error, move |_| {
        count_a.fetch_add(1, Ordering::SeqCst);
    });
    let count_b = Arc::clone(&count);
    session.on(EventKind::Error, move |_| {
        count_b.fetch_add(10, Ordering::SeqCst);
    });

    session.initialize(None);
    settle().await;

    session.off(EventKind::Error, Some(a));
    transport.push_inbound("error", json!({"message": "bad bet"}));
    settle().await;
    assert_eq!(count.load(Ordering::SeqCst), 10);

    session.off(EventKind::Error, None);
    transport.push_inbound("error", json!({"message": "worse bet"}));
    settle().await;
    assert_eq!(count.load(Ordering::SeqCst), 10);
}
