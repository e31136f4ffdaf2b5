//! Cardroom Client - the realtime room/session layer.
//!
//! Two cooperating pieces, both client-side (the server is an external
//! collaborator):
//!
//! - [`Session`]: owns a single transport connection with an explicit
//!   lifecycle: authentication handshake, disconnect detection, bounded
//!   fixed-delay reconnection, and synchronous event fan-out to registered
//!   listeners.
//! - [`RoomClient`]: the typed command surface (create/join/leave/ready/
//!   start/act/chat) layered on the session, with validation and a
//!   last-joined-room default.
//!
//! Sessions are constructed explicitly by the application composition root
//! and passed where needed; there is no module-level singleton. Transports
//! are injected behind the [`EventTransport`] port: production code uses
//! [`WsTransport`], tests substitute an in-memory fake.
//!
//! ```no_run
//! use std::sync::Arc;
//! use cardroom_client::{ClientConfig, EventKind, RoomClient, Session, WsTransport};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ClientConfig::new("wss://play.example.com/rt")?;
//! let transport = Arc::new(WsTransport::new(config.server_url.clone()));
//! let session = Session::new(config, transport);
//! let rooms = RoomClient::new(session.clone());
//!
//! rooms.on(EventKind::ConnectionChange, |event| {
//!     tracing::info!(?event, "connectivity changed");
//! });
//! session.initialize(Some("bearer-token"));
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod events;
pub mod facade;
pub mod registry;
pub mod session;
pub mod transport;

pub use config::{ClientConfig, ConfigError};
pub use error::{CommandError, TransportError};
pub use events::{EventKind, SessionEvent};
pub use facade::{RoomClient, RoomInfoAck, RoomInfoCallback};
pub use registry::ListenerId;
pub use session::{ConnectionState, Session};
pub use transport::ws::WsTransport;
pub use transport::{EventTransport, TransportSignal};
