//! Named wire events exchanged over the realtime connection.
//!
//! Events travel as a JSON envelope `{"event": <name>, "data": <payload>}`.
//! Outbound names are fixed. Inbound names are resolved through a table that
//! also accepts the legacy snake_case spellings (`room_created`, ...) still
//! produced by older server builds, so naming drift is handled as data rather
//! than duplicated handler code.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::types::{ChatEntry, CreateRoomParams, GameSnapshot, Room};

/// The on-the-wire envelope for one named event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireEvent {
    #[serde(rename = "event")]
    pub name: String,
    #[serde(default)]
    pub data: Value,
}

impl WireEvent {
    pub fn new(name: impl Into<String>, data: Value) -> Self {
        Self {
            name: name.into(),
            data,
        }
    }

    /// Serialize to the JSON text frame sent over the transport.
    pub fn to_frame(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Parse a received JSON text frame.
    pub fn from_frame(frame: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(frame)
    }
}

// =============================================================================
// Outbound (client → server)
// =============================================================================

/// Events the client emits. Serialization yields the payload object only; the
/// event name comes from [`ClientEvent::wire_name`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ClientEvent {
    #[serde(rename_all = "camelCase")]
    GetRooms { filter: String },
    CreateRoom(CreateRoomParams),
    #[serde(rename_all = "camelCase")]
    JoinRoom {
        room_id: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        password: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    LeaveRoom { room_id: String },
    #[serde(rename_all = "camelCase")]
    Ready { ready: bool, room_id: String },
    #[serde(rename_all = "camelCase")]
    StartGame { room_id: String },
    #[serde(rename_all = "camelCase")]
    GameAction {
        action: String,
        data: Value,
        room_id: String,
    },
    #[serde(rename_all = "camelCase")]
    Chat { message: String, room_id: String },
    /// `timestamp` lets the server dedup and order stale info requests.
    #[serde(rename_all = "camelCase")]
    GetRoomInfo { room_id: String, timestamp: i64 },
    /// Liveness reply; echoes the server's `ping.time` untouched.
    #[serde(rename_all = "camelCase")]
    Pong { time: i64 },
}

impl ClientEvent {
    pub fn wire_name(&self) -> &'static str {
        match self {
            ClientEvent::GetRooms { .. } => "getRooms",
            ClientEvent::CreateRoom(_) => "createRoom",
            ClientEvent::JoinRoom { .. } => "joinRoom",
            ClientEvent::LeaveRoom { .. } => "leaveRoom",
            ClientEvent::Ready { .. } => "ready",
            ClientEvent::StartGame { .. } => "startGame",
            ClientEvent::GameAction { .. } => "gameAction",
            ClientEvent::Chat { .. } => "chatMessage",
            ClientEvent::GetRoomInfo { .. } => "get_room_info",
            ClientEvent::Pong { .. } => "pong",
        }
    }

    pub fn encode(&self) -> Result<WireEvent, serde_json::Error> {
        Ok(WireEvent::new(self.wire_name(), serde_json::to_value(self)?))
    }
}

// =============================================================================
// Inbound (server → client)
// =============================================================================

/// Canonical identity of an inbound event, independent of which spelling the
/// server used on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServerEventKind {
    Authenticated,
    Connected,
    Error,
    Ping,
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

/// Wire name → kind. First entry per kind is the canonical spelling; the
/// snake_case rows are the legacy aliases.
const INBOUND_NAMES: &[(&str, ServerEventKind)] = &[
    ("authenticated", ServerEventKind::Authenticated),
    ("connected", ServerEventKind::Connected),
    ("error", ServerEventKind::Error),
    ("ping", ServerEventKind::Ping),
    ("roomCreated", ServerEventKind::RoomCreated),
    ("room_created", ServerEventKind::RoomCreated),
    ("roomJoined", ServerEventKind::RoomJoined),
    ("room_joined", ServerEventKind::RoomJoined),
    ("roomLeft", ServerEventKind::RoomLeft),
    ("room_left", ServerEventKind::RoomLeft),
    ("roomList", ServerEventKind::RoomList),
    ("room_list", ServerEventKind::RoomList),
    ("roomListUpdated", ServerEventKind::RoomListUpdated),
    ("room_list_updated", ServerEventKind::RoomListUpdated),
    ("roomInfo", ServerEventKind::RoomInfo),
    ("room_info", ServerEventKind::RoomInfo),
    ("roomUpdated", ServerEventKind::RoomUpdated),
    ("room_updated", ServerEventKind::RoomUpdated),
    ("gameStarted", ServerEventKind::GameStarted),
    ("game_started", ServerEventKind::GameStarted),
    ("gameEnded", ServerEventKind::GameEnded),
    ("game_ended", ServerEventKind::GameEnded),
    ("gameUpdated", ServerEventKind::GameUpdated),
    ("game_updated", ServerEventKind::GameUpdated),
    ("chatMessage", ServerEventKind::Chat),
    ("chat_message", ServerEventKind::Chat),
];

impl ServerEventKind {
    /// Resolve a wire name, accepting both naming styles.
    pub fn resolve(name: &str) -> Option<Self> {
        INBOUND_NAMES
            .iter()
            .find(|(wire, _)| *wire == name)
            .map(|(_, kind)| *kind)
    }

    /// The canonical (camelCase) spelling for this kind.
    pub fn canonical_name(self) -> &'static str {
        match INBOUND_NAMES.iter().find(|(_, kind)| *kind == self) {
            Some((name, _)) => name,
            // Every kind has a table row; keep the match total anyway.
            None => "unknown",
        }
    }
}

/// A decoded inbound event with its typed payload.
#[derive(Debug, Clone, PartialEq)]
pub enum ServerEvent {
    Authenticated {
        user_id: String,
    },
    /// Server-side connection acknowledgment carrying the table-scoped
    /// player identity. Independent of `Authenticated`; arrival order between
    /// the two is not guaranteed.
    Connected {
        player_id: String,
    },
    Error {
        message: String,
    },
    Ping {
        time: i64,
    },
    RoomCreated {
        room: Room,
    },
    RoomJoined {
        room: Room,
    },
    RoomLeft {
        room_id: String,
        player_id: Option<String>,
    },
    RoomList {
        rooms: Vec<Room>,
    },
    RoomListUpdated {
        rooms: Vec<Room>,
    },
    RoomInfo {
        room: Room,
    },
    RoomUpdated {
        room: Room,
    },
    GameStarted {
        room_id: String,
        game: GameSnapshot,
    },
    GameEnded {
        room_id: String,
        results: Option<Value>,
    },
    GameUpdated {
        game: GameSnapshot,
    },
    Chat(ChatEntry),
}

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("unrecognized event name: {0}")]
    UnknownEvent(String),
    #[error("malformed {event} payload: {source}")]
    Payload {
        event: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RoomPayload {
    room: Room,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RoomsPayload {
    #[serde(default)]
    rooms: Vec<Room>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RoomLeftPayload {
    room_id: String,
    #[serde(default)]
    player_id: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GameStartedPayload {
    room_id: String,
    game: GameSnapshot,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GameEndedPayload {
    room_id: String,
    #[serde(default)]
    results: Option<Value>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GamePayload {
    game: GameSnapshot,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AuthenticatedPayload {
    user_id: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConnectedPayload {
    player_id: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ErrorPayload {
    message: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PingPayload {
    time: i64,
}

fn parse<T: serde::de::DeserializeOwned>(
    kind: ServerEventKind,
    data: &Value,
) -> Result<T, DecodeError> {
    serde_json::from_value(data.clone()).map_err(|source| DecodeError::Payload {
        event: kind.canonical_name(),
        source,
    })
}

impl ServerEvent {
    pub fn kind(&self) -> ServerEventKind {
        match self {
            ServerEvent::Authenticated { .. } => ServerEventKind::Authenticated,
            ServerEvent::Connected { .. } => ServerEventKind::Connected,
            ServerEvent::Error { .. } => ServerEventKind::Error,
            ServerEvent::Ping { .. } => ServerEventKind::Ping,
            ServerEvent::RoomCreated { .. } => ServerEventKind::RoomCreated,
            ServerEvent::RoomJoined { .. } => ServerEventKind::RoomJoined,
            ServerEvent::RoomLeft { .. } => ServerEventKind::RoomLeft,
            ServerEvent::RoomList { .. } => ServerEventKind::RoomList,
            ServerEvent::RoomListUpdated { .. } => ServerEventKind::RoomListUpdated,
            ServerEvent::RoomInfo { .. } => ServerEventKind::RoomInfo,
            ServerEvent::RoomUpdated { .. } => ServerEventKind::RoomUpdated,
            ServerEvent::GameStarted { .. } => ServerEventKind::GameStarted,
            ServerEvent::GameEnded { .. } => ServerEventKind::GameEnded,
            ServerEvent::GameUpdated { .. } => ServerEventKind::GameUpdated,
            ServerEvent::Chat(_) => ServerEventKind::Chat,
        }
    }

    /// Decode an envelope into a typed event, normalizing legacy names.
    ///
    /// Unknown names and malformed payloads are errors, never silently
    /// dropped; the caller decides how loudly to log them.
    pub fn decode(wire: &WireEvent) -> Result<Self, DecodeError> {
        let kind = ServerEventKind::resolve(&wire.name)
            .ok_or_else(|| DecodeError::UnknownEvent(wire.name.clone()))?;

        Ok(match kind {
            ServerEventKind::Authenticated => {
                let p: AuthenticatedPayload = parse(kind, &wire.data)?;
                ServerEvent::Authenticated { user_id: p.user_id }
            }
            ServerEventKind::Connected => {
                let p: ConnectedPayload = parse(kind, &wire.data)?;
                ServerEvent::Connected {
                    player_id: p.player_id,
                }
            }
            ServerEventKind::Error => {
                let p: ErrorPayload = parse(kind, &wire.data)?;
                ServerEvent::Error { message: p.message }
            }
            ServerEventKind::Ping => {
                let p: PingPayload = parse(kind, &wire.data)?;
                ServerEvent::Ping { time: p.time }
            }
            ServerEventKind::RoomCreated => {
                let p: RoomPayload = parse(kind, &wire.data)?;
                ServerEvent::RoomCreated { room: p.room }
            }
            ServerEventKind::RoomJoined => {
                let p: RoomPayload = parse(kind, &wire.data)?;
                ServerEvent::RoomJoined { room: p.room }
            }
            ServerEventKind::RoomLeft => {
                let p: RoomLeftPayload = parse(kind, &wire.data)?;
                ServerEvent::RoomLeft {
                    room_id: p.room_id,
                    player_id: p.player_id,
                }
            }
            ServerEventKind::RoomList => {
                let p: RoomsPayload = parse(kind, &wire.data)?;
                ServerEvent::RoomList { rooms: p.rooms }
            }
            ServerEventKind::RoomListUpdated => {
                let p: RoomsPayload = parse(kind, &wire.data)?;
                ServerEvent::RoomListUpdated { rooms: p.rooms }
            }
            ServerEventKind::RoomInfo => {
                let p: RoomPayload = parse(kind, &wire.data)?;
                ServerEvent::RoomInfo { room: p.room }
            }
            ServerEventKind::RoomUpdated => {
                let p: RoomPayload = parse(kind, &wire.data)?;
                ServerEvent::RoomUpdated { room: p.room }
            }
            ServerEventKind::GameStarted => {
                let p: GameStartedPayload = parse(kind, &wire.data)?;
                ServerEvent::GameStarted {
                    room_id: p.room_id,
                    game: p.game,
                }
            }
            ServerEventKind::GameEnded => {
                let p: GameEndedPayload = parse(kind, &wire.data)?;
                ServerEvent::GameEnded {
                    room_id: p.room_id,
                    results: p.results,
                }
            }
            ServerEventKind::GameUpdated => {
                let p: GamePayload = parse(kind, &wire.data)?;
                ServerEvent::GameUpdated { game: p.game }
            }
            ServerEventKind::Chat => {
                let entry: ChatEntry = parse(kind, &wire.data)?;
                ServerEvent::Chat(entry)
            }
        })
    }
}
