//! Minimal hosting-application wiring: connect, watch the lobby, chat.
//!
//! ```sh
//! CARDROOM_WS_URL=ws://localhost:4000/rt CARDROOM_TOKEN=dev cargo run --example lobby
//! ```

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cardroom_client::{ClientConfig, EventKind, RoomClient, Session, SessionEvent, WsTransport};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lobby=info,cardroom_client=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Endpoint and token come from the host environment; the session layer
    // itself never reads env vars.
    let ws_url = std::env::var("CARDROOM_WS_URL")
        .unwrap_or_else(|_| "ws://localhost:4000/rt".to_string());
    let token = std::env::var("CARDROOM_TOKEN").ok();

    let config = ClientConfig::new(&ws_url)?;
    let transport = Arc::new(WsTransport::new(config.server_url.clone()));
    let session = Session::new(config, transport);
    let rooms = RoomClient::new(session.clone());

    rooms.on(EventKind::ConnectionChange, |event| {
        if let SessionEvent::ConnectionChange { connected } = event {
            tracing::info!(connected = *connected, "connectivity changed");
        }
    });
    rooms.on(EventKind::Authenticated, |event| {
        if let SessionEvent::Authenticated { user_id } = event {
            tracing::info!(%user_id, "authenticated");
        }
    });
    rooms.on(EventKind::RoomList, |event| {
        if let SessionEvent::RoomList { rooms } = event {
            for room in rooms {
                tracing::info!(
                    id = %room.id,
                    name = %room.name,
                    seats = %format!("{}/{}", room.players.len(), room.max_players),
                    "room"
                );
            }
        }
    });
    rooms.on(EventKind::Chat, |event| {
        if let SessionEvent::Chat(entry) = event {
            tracing::info!(room = %entry.room_id, from = %entry.sender.id, "{}", entry.message);
        }
    });
    rooms.on(EventKind::Error, |event| {
        if let SessionEvent::Error { message } = event {
            tracing::warn!(%message, "server error");
        }
    });

    session.initialize(token.as_deref());

    // Give the handshake a moment, then ask for the lobby.
    tokio::time::sleep(std::time::Duration::from_secs(1)).await;
    if rooms.get_rooms(None).is_err() {
        tracing::warn!("not connected yet; the room list will arrive after reconnect");
    }

    tokio::signal::ctrl_c().await?;
    session.close();
    Ok(())
}
