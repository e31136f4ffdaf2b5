//! Connection manager for the realtime session.
//!
//! A [`Session`] owns at most one live transport connection and the driver
//! task that feeds it: connect, pump inbound events to listeners, and retry
//! lost connections on a fixed delay with a bounded attempt budget. All
//! listener dispatch happens synchronously on the driver task, in transport
//! arrival order.
//!
//! Sessions are constructed explicitly and passed around by the application
//! composition root; `Clone` is cheap and shares the same connection.

use std::sync::atomic::{AtomicU32, AtomicU8, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use cardroom_protocol::{
    ClientEvent, CreateRoomParams, DecodeError, Room, ServerEvent, WireEvent,
};

use crate::config::ClientConfig;
use crate::events::{EventKind, SessionEvent};
use crate::registry::{ListenerId, ListenerRegistry};
use crate::transport::{EventTransport, TransportSignal};

/// Connection lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Not connected (never initialized, or explicitly closed)
    Disconnected,
    /// First connection attempt in flight
    Connecting,
    /// Successfully connected
    Connected,
    /// Connection lost, retry scheduled or in flight
    Reconnecting,
    /// Retry budget exhausted; terminal until close + initialize
    Failed,
}

impl ConnectionState {
    /// Convert to u8 for atomic storage.
    fn to_u8(self) -> u8 {
        match self {
            ConnectionState::Disconnected => 0,
            ConnectionState::Connecting => 1,
            ConnectionState::Connected => 2,
            ConnectionState::Reconnecting => 3,
            ConnectionState::Failed => 4,
        }
    }

    /// Convert from u8 (atomic storage).
    fn from_u8(v: u8) -> Self {
        match v {
            1 => ConnectionState::Connecting,
            2 => ConnectionState::Connected,
            3 => ConnectionState::Reconnecting,
            4 => ConnectionState::Failed,
            _ => ConnectionState::Disconnected,
        }
    }
}

struct DriverHandle {
    cancel: CancellationToken,
    #[allow(dead_code)]
    task: tokio::task::JoinHandle<()>,
}

struct SessionInner {
    config: ClientConfig,
    transport: Arc<dyn EventTransport>,
    registry: ListenerRegistry,
    state: AtomicU8,
    reconnect_attempts: AtomicU32,
    auth: Mutex<Option<String>>,
    user_id: Mutex<Option<String>>,
    player_id: Mutex<Option<String>>,
    driver: Mutex<Option<DriverHandle>>,
}

impl SessionInner {
    fn set_state(&self, state: ConnectionState) {
        tracing::debug!(?state, "connection state");
        self.state.store(state.to_u8(), Ordering::SeqCst);
    }

    fn state(&self) -> ConnectionState {
        ConnectionState::from_u8(self.state.load(Ordering::SeqCst))
    }

    fn dispatch(&self, event: &SessionEvent) {
        self.registry.dispatch(event);
    }
}

/// The realtime session: connection manager plus event fan-out.
#[derive(Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

impl Session {
    pub fn new(config: ClientConfig, transport: Arc<dyn EventTransport>) -> Self {
        Self {
            inner: Arc::new(SessionInner {
                config,
                transport,
                registry: ListenerRegistry::new(),
                state: AtomicU8::new(ConnectionState::Disconnected.to_u8()),
                reconnect_attempts: AtomicU32::new(0),
                auth: Mutex::new(None),
                user_id: Mutex::new(None),
                player_id: Mutex::new(None),
                driver: Mutex::new(None),
            }),
        }
    }

    /// Start the connection. Idempotent: while a driver exists (live,
    /// reconnecting, or exhausted), later calls change nothing and return
    /// `false`. The token is kept and re-sent on every dial, so reconnects
    /// re-authenticate automatically.
    ///
    /// Must be called from within a tokio runtime.
    pub fn initialize(&self, token: Option<&str>) -> bool {
        let mut driver = self
            .inner
            .driver
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if driver.is_some() {
            tracing::debug!("session already initialized");
            return false;
        }

        *self
            .inner
            .auth
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = token.map(str::to_owned);

        let cancel = CancellationToken::new();
        let signals = self.inner.transport.take_signals();
        let task = tokio::spawn(drive(
            Arc::clone(&self.inner),
            signals,
            cancel.clone(),
        ));
        *driver = Some(DriverHandle { cancel, task });
        true
    }

    /// Disconnect and reset. Cancels any pending reconnect timer, clears the
    /// handshake identity, and fires `ConnectionChange { connected: false }`.
    /// Domain commands become warn-and-`false` until `initialize` runs again.
    ///
    /// Safe to call from inside a listener callback.
    pub fn close(&self) {
        let handle = self
            .inner
            .driver
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        let Some(handle) = handle else {
            tracing::debug!("close called on an uninitialized session");
            return;
        };

        handle.cancel.cancel();
        self.inner.transport.close();
        self.inner.set_state(ConnectionState::Disconnected);
        self.inner.reconnect_attempts.store(0, Ordering::SeqCst);
        *self
            .inner
            .user_id
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = None;
        *self
            .inner
            .player_id
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = None;

        tracing::info!("session closed");
        self.inner
            .dispatch(&SessionEvent::ConnectionChange { connected: false });
    }

    /// Register a listener. Listeners run synchronously on the driver task,
    /// in registration order; a panicking listener is isolated and logged.
    pub fn on(
        &self,
        kind: EventKind,
        callback: impl Fn(&SessionEvent) + Send + Sync + 'static,
    ) -> ListenerId {
        self.inner.registry.add(kind, callback)
    }

    /// Unregister one listener by handle, or every listener for the kind when
    /// no handle is given.
    pub fn off(&self, kind: EventKind, id: Option<ListenerId>) {
        match id {
            Some(id) => {
                self.inner.registry.remove(kind, id);
            }
            None => self.inner.registry.remove_all(kind),
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.inner.state()
    }

    pub fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Connected
    }

    /// Identity pushed by the server's `authenticated` event. Survives
    /// transient disconnects; cleared only by [`Session::close`].
    pub fn user_id(&self) -> Option<String> {
        self.inner
            .user_id
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Identity pushed by the server's `connected` acknowledgment.
    pub fn player_id(&self) -> Option<String> {
        self.inner
            .player_id
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn reconnect_attempts(&self) -> u32 {
        self.inner.reconnect_attempts.load(Ordering::SeqCst)
    }

    // =========================================================================
    // Domain commands
    //
    // Each is a guarded emit: while disconnected it logs a warning and
    // returns false without touching the wire; otherwise it emits exactly
    // one event. Responses arrive as later named events, never as return
    // values.
    // =========================================================================

    pub fn get_rooms(&self, filter: &str) -> bool {
        self.emit(ClientEvent::GetRooms {
            filter: filter.to_string(),
        })
    }

    pub fn create_room(&self, params: CreateRoomParams) -> bool {
        self.emit(ClientEvent::CreateRoom(params))
    }

    pub fn join_room(&self, room_id: &str, password: Option<&str>) -> bool {
        self.emit(ClientEvent::JoinRoom {
            room_id: room_id.to_string(),
            password: password.map(str::to_owned),
        })
    }

    pub fn leave_room(&self, room_id: &str) -> bool {
        self.emit(ClientEvent::LeaveRoom {
            room_id: room_id.to_string(),
        })
    }

    pub fn ready(&self, ready: bool, room_id: &str) -> bool {
        self.emit(ClientEvent::Ready {
            ready,
            room_id: room_id.to_string(),
        })
    }

    pub fn start_game(&self, room_id: &str) -> bool {
        self.emit(ClientEvent::StartGame {
            room_id: room_id.to_string(),
        })
    }

    pub fn game_action(&self, action: &str, data: serde_json::Value, room_id: &str) -> bool {
        self.emit(ClientEvent::GameAction {
            action: action.to_string(),
            data,
            room_id: room_id.to_string(),
        })
    }

    pub fn send_chat_message(&self, message: &str, room_id: &str) -> bool {
        self.emit(ClientEvent::Chat {
            message: message.to_string(),
            room_id: room_id.to_string(),
        })
    }

    pub fn get_room_info(&self, room_id: &str) -> bool {
        self.emit(ClientEvent::GetRoomInfo {
            room_id: room_id.to_string(),
            timestamp: chrono::Utc::now().timestamp_millis(),
        })
    }

    fn emit(&self, event: ClientEvent) -> bool {
        if !self.is_connected() {
            tracing::warn!(
                event = event.wire_name(),
                "dropping command while disconnected"
            );
            return false;
        }
        let wire = match event.encode() {
            Ok(wire) => wire,
            Err(e) => {
                tracing::error!(error = %e, "failed to encode outbound event");
                return false;
            }
        };
        match self.inner.transport.send(wire) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(error = %e, "failed to queue outbound event");
                false
            }
        }
    }
}

// =============================================================================
// Driver task
// =============================================================================

enum PumpEnd {
    Cancelled,
    Disconnected { reason: String },
}

async fn drive(
    inner: Arc<SessionInner>,
    mut signals: mpsc::UnboundedReceiver<TransportSignal>,
    cancel: CancellationToken,
) {
    loop {
        let retrying = inner.reconnect_attempts.load(Ordering::SeqCst) > 0;
        inner.set_state(if retrying {
            ConnectionState::Reconnecting
        } else {
            ConnectionState::Connecting
        });

        let auth = inner
            .auth
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        let dialed = tokio::select! {
            _ = cancel.cancelled() => return,
            dialed = inner.transport.connect(auth) => dialed,
        };

        match dialed {
            Ok(()) => {
                tracing::info!(url = %inner.config.server_url, "connected to realtime server");
                inner.reconnect_attempts.store(0, Ordering::SeqCst);
                inner.set_state(ConnectionState::Connected);
                inner.dispatch(&SessionEvent::ConnectionChange { connected: true });

                match pump(&inner, &mut signals, &cancel).await {
                    PumpEnd::Cancelled => return,
                    PumpEnd::Disconnected { reason } => {
                        tracing::warn!(%reason, "connection lost");
                        inner.set_state(ConnectionState::Disconnected);
                        inner.dispatch(&SessionEvent::ConnectionChange { connected: false });
                    }
                }
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to connect to realtime server");
                inner.set_state(ConnectionState::Disconnected);
            }
        }

        let attempts = inner.reconnect_attempts.load(Ordering::SeqCst);
        if attempts >= inner.config.max_reconnect_attempts {
            tracing::warn!(attempts, "max reconnection attempts reached, giving up");
            inner.set_state(ConnectionState::Failed);
            return;
        }

        inner.set_state(ConnectionState::Reconnecting);
        tokio::select! {
            _ = cancel.cancelled() => return,
            _ = tokio::time::sleep(inner.config.reconnect_delay) => {}
        }
        // Attempt counted before the dial so a hung dial still consumes budget.
        inner.reconnect_attempts.fetch_add(1, Ordering::SeqCst);
    }
}

async fn pump(
    inner: &SessionInner,
    signals: &mut mpsc::UnboundedReceiver<TransportSignal>,
    cancel: &CancellationToken,
) -> PumpEnd {
    loop {
        tokio::select! {
            _ = cancel.cancelled() => return PumpEnd::Cancelled,
            signal = signals.recv() => match signal {
                None => {
                    return PumpEnd::Disconnected {
                        reason: "transport signal channel closed".to_string(),
                    }
                }
                Some(TransportSignal::Closed { reason }) => {
                    return PumpEnd::Disconnected { reason }
                }
                Some(TransportSignal::Inbound(wire)) => handle_inbound(inner, wire),
            }
        }
    }
}

fn handle_inbound(inner: &SessionInner, wire: WireEvent) {
    let event = match ServerEvent::decode(&wire) {
        Ok(event) => event,
        Err(DecodeError::UnknownEvent(name)) => {
            tracing::warn!(event = %name, "unrecognized inbound event, dropping");
            return;
        }
        Err(e) => {
            tracing::warn!(error = %e, "malformed inbound event, dropping");
            return;
        }
    };

    match &event {
        ServerEvent::Ping { time } => {
            // Liveness probe: echo the timestamp back, nothing else.
            match (ClientEvent::Pong { time: *time }).encode() {
                Ok(pong) => {
                    if let Err(e) = inner.transport.send(pong) {
                        tracing::warn!(error = %e, "failed to answer ping");
                    }
                }
                Err(e) => tracing::error!(error = %e, "failed to encode pong"),
            }
            return;
        }
        ServerEvent::Authenticated { user_id } => {
            *inner
                .user_id
                .lock()
                .unwrap_or_else(PoisonError::into_inner) = Some(user_id.clone());
        }
        ServerEvent::Connected { player_id } => {
            *inner
                .player_id
                .lock()
                .unwrap_or_else(PoisonError::into_inner) = Some(player_id.clone());
        }
        other => warn_inconsistent_rooms(other),
    }

    if let Some(event) = SessionEvent::from_server(event) {
        inner.dispatch(&event);
    }
}

/// The server owns room state, so inconsistent projections are logged and
/// still delivered rather than rejected.
fn warn_inconsistent_rooms(event: &ServerEvent) {
    let rooms: Vec<&Room> = match event {
        ServerEvent::RoomCreated { room }
        | ServerEvent::RoomJoined { room }
        | ServerEvent::RoomInfo { room }
        | ServerEvent::RoomUpdated { room } => vec![room],
        ServerEvent::RoomList { rooms } | ServerEvent::RoomListUpdated { rooms } => {
            rooms.iter().collect()
        }
        _ => Vec::new(),
    };
    for room in rooms {
        if let Err(violation) = room.check_consistency() {
            tracing::warn!(error = %violation, "server sent inconsistent room projection");
        }
    }
}
