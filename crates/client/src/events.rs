//! Application-facing session events.
//!
//! This is the canonical vocabulary the rest of the application subscribes
//! to, independent of wire spellings. Wire events arrive as
//! [`ServerEvent`]s and are mapped here; `connectionChange` is synthesized
//! locally by the session and has no wire form, while `ping` is answered
//! inside the session and never fanned out.

use cardroom_protocol::{ChatEntry, GameSnapshot, Room, ServerEvent};

/// Keys for listener registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    ConnectionChange,
    Authenticated,
    Connected,
    Error,
    RoomCreated,
    RoomJoined,
    RoomLeft,
    RoomList,
    RoomListUpdated,
    RoomInfo,
    RoomUpdated,
    GameStarted,
    GameEnded,
    GameUpdated,
    Chat,
}

/// One event delivered to registered listeners.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// Connectivity changed. Fired on transport connect, transport loss, and
    /// explicit close.
    ConnectionChange { connected: bool },
    /// Identity half of the handshake; may arrive before or after
    /// [`SessionEvent::Connected`].
    Authenticated { user_id: String },
    /// Server connection acknowledgment carrying the player identity.
    Connected { player_id: String },
    /// Server-reported protocol error, forwarded verbatim.
    Error { message: String },
    RoomCreated { room: Room },
    RoomJoined { room: Room },
    RoomLeft {
        room_id: String,
        player_id: Option<String>,
    },
    RoomList { rooms: Vec<Room> },
    RoomListUpdated { rooms: Vec<Room> },
    RoomInfo { room: Room },
    RoomUpdated { room: Room },
    GameStarted {
        room_id: String,
        game: GameSnapshot,
    },
    GameEnded {
        room_id: String,
        results: Option<serde_json::Value>,
    },
    GameUpdated { game: GameSnapshot },
    Chat(ChatEntry),
}

impl SessionEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            SessionEvent::ConnectionChange { .. } => EventKind::ConnectionChange,
            SessionEvent::Authenticated { .. } => EventKind::Authenticated,
            SessionEvent::Connected { .. } => EventKind::Connected,
            SessionEvent::Error { .. } => EventKind::Error,
            SessionEvent::RoomCreated { .. } => EventKind::RoomCreated,
            SessionEvent::RoomJoined { .. } => EventKind::RoomJoined,
            SessionEvent::RoomLeft { .. } => EventKind::RoomLeft,
            SessionEvent::RoomList { .. } => EventKind::RoomList,
            SessionEvent::RoomListUpdated { .. } => EventKind::RoomListUpdated,
            SessionEvent::RoomInfo { .. } => EventKind::RoomInfo,
            SessionEvent::RoomUpdated { .. } => EventKind::RoomUpdated,
            SessionEvent::GameStarted { .. } => EventKind::GameStarted,
            SessionEvent::GameEnded { .. } => EventKind::GameEnded,
            SessionEvent::GameUpdated { .. } => EventKind::GameUpdated,
            SessionEvent::Chat(_) => EventKind::Chat,
        }
    }

    /// Map a decoded wire event. `Ping` has no application-facing form.
    pub(crate) fn from_server(event: ServerEvent) -> Option<Self> {
        Some(match event {
            ServerEvent::Ping { .. } => return None,
            ServerEvent::Authenticated { user_id } => SessionEvent::Authenticated { user_id },
            ServerEvent::Connected { player_id } => SessionEvent::Connected { player_id },
            ServerEvent::Error { message } => SessionEvent::Error { message },
            ServerEvent::RoomCreated { room } => SessionEvent::RoomCreated { room },
            ServerEvent::RoomJoined { room } => SessionEvent::RoomJoined { room },
            ServerEvent::RoomLeft { room_id, player_id } => SessionEvent::RoomLeft {
                room_id,
                player_id,
            },
            ServerEvent::RoomList { rooms } => SessionEvent::RoomList { rooms },
            ServerEvent::RoomListUpdated { rooms } => SessionEvent::RoomListUpdated { rooms },
            ServerEvent::RoomInfo { room } => SessionEvent::RoomInfo { room },
            ServerEvent::RoomUpdated { room } => SessionEvent::RoomUpdated { room },
            ServerEvent::GameStarted { room_id, game } => {
                SessionEvent::GameStarted { room_id, game }
            }
            ServerEvent::GameEnded { room_id, results } => {
                SessionEvent::GameEnded { room_id, results }
            }
            ServerEvent::GameUpdated { game } => SessionEvent::GameUpdated { game },
            ServerEvent::Chat(entry) => SessionEvent::Chat(entry),
        })
    }
}
