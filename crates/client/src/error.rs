//! Error types for the session layer.
//!
//! Nothing here escalates to process-level failure: transport faults feed the
//! reconnect state machine, command misuse comes back as a value, and server
//! `error` events are forwarded verbatim to listeners.

use thiserror::Error;

/// Faults raised by an [`EventTransport`](crate::transport::EventTransport)
/// implementation.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Dialing the server failed.
    #[error("connection failed: {0}")]
    Connect(String),

    /// Attempted to send without a live connection.
    #[error("transport not connected")]
    NotConnected,

    /// The outbound event could not be turned into a frame.
    #[error("failed to encode outbound frame: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Why a facade command was rejected before anything hit the wire.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// Arguments failed validation (e.g., empty room name).
    #[error("validation failed: {0}")]
    Validation(String),

    /// No explicit room id was given and no room has been joined yet.
    #[error("no room joined and no room id given")]
    NoRoom,

    /// The session is not connected; the command was dropped.
    #[error("not connected")]
    NotConnected,
}

impl CommandError {
    /// Creates a validation error for rejected command arguments.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}
