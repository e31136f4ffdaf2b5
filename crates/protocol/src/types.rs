//! Room, player, and game projection DTOs.
//!
//! All of these are cached projections of server-authoritative state. They are
//! refreshed only by inbound events; the client never assumes a local mutation
//! is durable without a server broadcast confirming it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Room lifecycle status as reported by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RoomStatus {
    #[default]
    Waiting,
    InProgress,
    Ended,
}

/// Minimal reference to a user, as embedded in room and chat payloads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRef {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl UserRef {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
        }
    }
}

/// A seated player. Seat order in `Room::players` is join order, which the
/// server uses for turn rotation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerInfo {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub ready: bool,
}

/// Small/big blind sizes for a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Blinds {
    pub small: u64,
    pub big: u64,
}

/// Table options. Opaque to the session layer beyond carrying them on the
/// wire; blinds are derived server-side and absent on `createRoom`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomOptions {
    #[serde(default)]
    pub buy_in: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blinds: Option<Blinds>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<String>,
}

/// Projection of a running game attached to a room. The hand state itself is
/// server-defined; the session layer carries it without interpreting it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameSnapshot {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phase: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_player: Option<String>,
    #[serde(default)]
    pub state: serde_json::Value,
}

/// A multiplayer room as last reported by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    pub id: String,
    pub name: String,
    pub host: UserRef,
    #[serde(default)]
    pub players: Vec<PlayerInfo>,
    pub max_players: u32,
    #[serde(default)]
    pub status: RoomStatus,
    #[serde(default)]
    pub is_private: bool,
    #[serde(default)]
    pub has_password: bool,
    #[serde(default)]
    pub options: RoomOptions,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub game: Option<GameSnapshot>,
}

/// A room payload that breaks the documented invariants. Violations are
/// logged at the inbound boundary; the projection is still accepted because
/// the server owns the state.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InvariantViolation {
    #[error("room {room_id} holds {players} players over capacity {max_players}")]
    OverCapacity {
        room_id: String,
        players: usize,
        max_players: u32,
    },
    #[error("room {room_id} has a password but is not private")]
    PasswordOnPublicRoom { room_id: String },
}

impl Room {
    /// Check the documented projection invariants: seat count within
    /// capacity and `has_password` implying `is_private`.
    pub fn check_consistency(&self) -> Result<(), InvariantViolation> {
        if self.players.len() > self.max_players as usize {
            return Err(InvariantViolation::OverCapacity {
                room_id: self.id.clone(),
                players: self.players.len(),
                max_players: self.max_players,
            });
        }
        if self.has_password && !self.is_private {
            return Err(InvariantViolation::PasswordOnPublicRoom {
                room_id: self.id.clone(),
            });
        }
        Ok(())
    }

    pub fn is_full(&self) -> bool {
        self.players.len() >= self.max_players as usize
    }
}

/// Parameters for the `createRoom` command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRoomParams {
    pub name: String,
    #[serde(default)]
    pub is_private: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    pub max_players: u32,
    #[serde(default)]
    pub options: RoomOptions,
}

/// A chat message broadcast to a room.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatEntry {
    pub room_id: String,
    pub sender: UserRef,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sent_at: Option<DateTime<Utc>>,
}
