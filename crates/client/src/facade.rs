//! Room command facade.
//!
//! [`RoomClient`] is the typed surface UI code talks to. It mirrors the
//! session's domain commands one-for-one, adding argument validation, a
//! last-joined-room default for room-scoped commands, and acknowledgment
//! callbacks for room info requests. Every command either emits exactly one
//! wire event or emits nothing and reports why.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use cardroom_protocol::{CreateRoomParams, Room};

use crate::error::CommandError;
use crate::events::{EventKind, SessionEvent};
use crate::registry::ListenerId;
use crate::session::Session;

/// Acknowledgment for a `get_room_info` request.
#[derive(Debug, Clone)]
pub struct RoomInfoAck {
    pub error: Option<String>,
    pub room: Option<Room>,
}

pub type RoomInfoCallback = Box<dyn FnOnce(RoomInfoAck) + Send + 'static>;

type PendingInfo = Arc<Mutex<HashMap<String, Vec<RoomInfoCallback>>>>;

pub struct RoomClient {
    session: Session,
    current_room: Arc<Mutex<Option<String>>>,
    pending_info: PendingInfo,
}

impl RoomClient {
    pub fn new(session: Session) -> Self {
        let current_room: Arc<Mutex<Option<String>>> = Arc::new(Mutex::new(None));
        let pending_info: PendingInfo = Arc::new(Mutex::new(HashMap::new()));

        // Track the last-joined room so room-scoped commands can default to it.
        let joined = Arc::clone(&current_room);
        session.on(EventKind::RoomJoined, move |event| {
            if let SessionEvent::RoomJoined { room } = event {
                *joined.lock().unwrap_or_else(PoisonError::into_inner) = Some(room.id.clone());
            }
        });
        let updated = Arc::clone(&current_room);
        session.on(EventKind::RoomUpdated, move |event| {
            if let SessionEvent::RoomUpdated { room } = event {
                let mut current = updated.lock().unwrap_or_else(PoisonError::into_inner);
                // Adopt only when nothing is tracked; updates for other
                // rooms must not steal the default.
                if current.is_none() {
                    *current = Some(room.id.clone());
                }
            }
        });
        let left = Arc::clone(&current_room);
        session.on(EventKind::RoomLeft, move |event| {
            if let SessionEvent::RoomLeft { room_id, .. } = event {
                let mut current = left.lock().unwrap_or_else(PoisonError::into_inner);
                if current.as_deref() == Some(room_id.as_str()) {
                    *current = None;
                }
            }
        });

        // Resolve info acknowledgments; fail the rest on connection loss.
        let resolving = Arc::clone(&pending_info);
        session.on(EventKind::RoomInfo, move |event| {
            if let SessionEvent::RoomInfo { room } = event {
                let callbacks = resolving
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .remove(&room.id);
                for callback in callbacks.into_iter().flatten() {
                    callback(RoomInfoAck {
                        error: None,
                        room: Some(room.clone()),
                    });
                }
            }
        });
        let failing = Arc::clone(&pending_info);
        session.on(EventKind::ConnectionChange, move |event| {
            if matches!(event, SessionEvent::ConnectionChange { connected: false }) {
                let drained: Vec<RoomInfoCallback> = failing
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .drain()
                    .flat_map(|(_, callbacks)| callbacks)
                    .collect();
                if !drained.is_empty() {
                    tracing::debug!(count = drained.len(), "failing pending room info requests");
                }
                for callback in drained {
                    callback(RoomInfoAck {
                        error: Some("connection lost".to_string()),
                        room: None,
                    });
                }
            }
        });

        Self {
            session,
            current_room,
            pending_info,
        }
    }

    /// The underlying session, for lifecycle control.
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Register a listener on the canonical event surface.
    pub fn on(
        &self,
        kind: EventKind,
        callback: impl Fn(&SessionEvent) + Send + Sync + 'static,
    ) -> ListenerId {
        self.session.on(kind, callback)
    }

    /// Unregister one listener, or all listeners for the kind.
    pub fn off(&self, kind: EventKind, id: Option<ListenerId>) {
        self.session.off(kind, id);
    }

    /// Room id the facade currently defaults to.
    pub fn current_room(&self) -> Option<String> {
        self.current_room
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    // =========================================================================
    // Commands
    // =========================================================================

    pub fn get_rooms(&self, filter: Option<&str>) -> Result<(), CommandError> {
        self.deliver(self.session.get_rooms(filter.unwrap_or("all")))
    }

    pub fn create_room(&self, params: CreateRoomParams) -> Result<(), CommandError> {
        if params.name.trim().is_empty() {
            return Err(CommandError::validation("room name must not be empty"));
        }
        if params.max_players == 0 {
            return Err(CommandError::validation("room capacity must be positive"));
        }
        let password_missing = params
            .password
            .as_deref()
            .map_or(true, |p| p.trim().is_empty());
        if params.is_private && password_missing {
            return Err(CommandError::validation("private rooms require a password"));
        }
        if !params.is_private && params.password.is_some() {
            return Err(CommandError::validation(
                "password is only allowed on private rooms",
            ));
        }
        self.deliver(self.session.create_room(params))
    }

    pub fn join_room(&self, room_id: &str, password: Option<&str>) -> Result<(), CommandError> {
        if room_id.trim().is_empty() {
            return Err(CommandError::validation("room id must not be empty"));
        }
        // The joined room becomes the default only once the server confirms
        // with roomJoined.
        self.deliver(self.session.join_room(room_id, password))
    }

    pub fn leave_room(&self, room: Option<&str>) -> Result<(), CommandError> {
        let room_id = self.resolve_room(room)?;
        self.deliver(self.session.leave_room(&room_id))
    }

    pub fn ready(&self, room: Option<&str>, ready: bool) -> Result<(), CommandError> {
        let room_id = self.resolve_room(room)?;
        self.deliver(self.session.ready(ready, &room_id))
    }

    pub fn start_game(&self, room: Option<&str>) -> Result<(), CommandError> {
        let room_id = self.resolve_room(room)?;
        self.deliver(self.session.start_game(&room_id))
    }

    pub fn game_action(
        &self,
        room: Option<&str>,
        action: &str,
        data: serde_json::Value,
    ) -> Result<(), CommandError> {
        if action.trim().is_empty() {
            return Err(CommandError::validation("action must not be empty"));
        }
        let room_id = self.resolve_room(room)?;
        self.deliver(self.session.game_action(action, data, &room_id))
    }

    pub fn send_chat(&self, room: Option<&str>, message: &str) -> Result<(), CommandError> {
        if message.trim().is_empty() {
            return Err(CommandError::validation("chat message must not be empty"));
        }
        let room_id = self.resolve_room(room)?;
        self.deliver(self.session.send_chat_message(message, &room_id))
    }

    /// Request fresh room state. When `ack` is given it fires exactly once:
    /// with the room on the next matching `roomInfo`, or with an error if the
    /// connection drops first.
    pub fn get_room_info(
        &self,
        room: Option<&str>,
        ack: Option<RoomInfoCallback>,
    ) -> Result<(), CommandError> {
        let room_id = self.resolve_room(room)?;

        if let Some(ack) = ack {
            self.pending_info
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .entry(room_id.clone())
                .or_default()
                .push(ack);
        }

        let result = self.deliver(self.session.get_room_info(&room_id));
        if result.is_err() {
            // Nothing went out, so the ack must not linger.
            if let Some(callbacks) = self
                .pending_info
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .get_mut(&room_id)
            {
                callbacks.pop();
            }
        }
        result
    }

    fn resolve_room(&self, explicit: Option<&str>) -> Result<String, CommandError> {
        match explicit {
            Some(id) if id.trim().is_empty() => {
                Err(CommandError::validation("room id must not be empty"))
            }
            Some(id) => Ok(id.to_string()),
            None => self
                .current_room
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clone()
                .ok_or(CommandError::NoRoom),
        }
    }

    fn deliver(&self, emitted: bool) -> Result<(), CommandError> {
        if emitted {
            Ok(())
        } else {
            Err(CommandError::NotConnected)
        }
    }
}
