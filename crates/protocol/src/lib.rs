//! Cardroom Protocol - shared types for realtime server and client communication
//!
//! This crate contains everything both ends of the realtime connection agree on:
//! - Named wire events (`WireEvent` envelope, `ClientEvent`, `ServerEvent`)
//! - The event-name table, including the legacy snake_case aliases still
//!   emitted by older server builds
//! - Room/player/game projection DTOs
//!
//! # Design Principles
//!
//! 1. **Minimal dependencies** - Only serde, serde_json, chrono, and thiserror
//! 2. **No business logic** - Pure data types and serialization
//! 3. **Server-authoritative** - DTOs are projections of server state; nothing
//!    here mutates them

pub mod events;
pub mod types;

pub use events::{ClientEvent, DecodeError, ServerEvent, ServerEventKind, WireEvent};
pub use types::{
    Blinds, ChatEntry, CreateRoomParams, GameSnapshot, InvariantViolation, PlayerInfo, Room,
    RoomOptions, RoomStatus, UserRef,
};
