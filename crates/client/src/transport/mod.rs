//! Transport port for the session layer.
//!
//! The session owns reconnection entirely; a transport implementation must
//! never redial on its own. It reports connection loss through
//! [`TransportSignal::Closed`] and waits to be told to `connect` again.

pub mod ws;

use cardroom_protocol::WireEvent;
use tokio::sync::mpsc;

use crate::error::TransportError;

/// Inbound traffic and lifecycle notifications, in arrival order.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportSignal {
    /// A named event from the server.
    Inbound(WireEvent),
    /// The connection dropped (remote close, I/O error, or local close).
    Closed { reason: String },
}

/// Bidirectional named-event channel to the realtime server.
///
/// Object-safe so the session can hold an `Arc<dyn EventTransport>`; tests
/// substitute an in-memory implementation.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait EventTransport: Send + Sync {
    /// Establish (or re-establish) the connection, presenting `auth` as the
    /// connect-time credential. Resolves once the connection is open.
    async fn connect(&self, auth: Option<String>) -> Result<(), TransportError>;

    /// Queue one event for delivery. Non-blocking; ordering is preserved.
    fn send(&self, event: WireEvent) -> Result<(), TransportError>;

    /// Tear the connection down. No further signals follow.
    fn close(&self);

    /// Hand out the signal stream. Each call supersedes earlier receivers,
    /// so a freshly initialized session never reads a dead channel.
    fn take_signals(&self) -> mpsc::UnboundedReceiver<TransportSignal>;
}
