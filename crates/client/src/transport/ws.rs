//! WebSocket transport using tokio-tungstenite.
//!
//! Events travel as JSON text frames carrying the `{"event", "data"}`
//! envelope. The auth token rides on the dial URL as a `token` query pair.
//! There is no transport-level auto-reconnect: when the socket dies the
//! reader pushes one `Closed` signal and stops.

use std::sync::{Mutex, PoisonError};

use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tokio_util::sync::CancellationToken;
use url::Url;

use cardroom_protocol::WireEvent;

use crate::error::TransportError;
use crate::transport::{EventTransport, TransportSignal};

pub struct WsTransport {
    url: Url,
    signal_tx: Mutex<mpsc::UnboundedSender<TransportSignal>>,
    outbound: Mutex<Option<mpsc::UnboundedSender<WireEvent>>>,
    live: Mutex<Option<CancellationToken>>,
}

impl WsTransport {
    pub fn new(url: Url) -> Self {
        // Receiver discarded; a real one is installed by take_signals.
        let (signal_tx, _) = mpsc::unbounded_channel();
        Self {
            url,
            signal_tx: Mutex::new(signal_tx),
            outbound: Mutex::new(None),
            live: Mutex::new(None),
        }
    }

    fn dial_url(&self, auth: Option<&str>) -> Url {
        let mut url = self.url.clone();
        if let Some(token) = auth {
            url.query_pairs_mut().append_pair("token", token);
        }
        url
    }

    fn teardown(&self) {
        if let Some(token) = self
            .live
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            token.cancel();
        }
        *self.outbound.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

#[async_trait::async_trait]
impl EventTransport for WsTransport {
    async fn connect(&self, auth: Option<String>) -> Result<(), TransportError> {
        // Drop any previous socket tasks before redialing.
        self.teardown();

        let url = self.dial_url(auth.as_deref());
        let (stream, _) = connect_async(url.as_str())
            .await
            .map_err(|e| TransportError::Connect(e.to_string()))?;
        tracing::info!(url = %self.url, "websocket open");

        let (mut write, mut read) = stream.split();
        let (out_tx, mut out_rx) = mpsc::unbounded_channel::<WireEvent>();
        let cancel = CancellationToken::new();

        *self.outbound.lock().unwrap_or_else(PoisonError::into_inner) = Some(out_tx);
        *self.live.lock().unwrap_or_else(PoisonError::into_inner) = Some(cancel.clone());
        let signal_tx = self
            .signal_tx
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();

        let write_cancel = cancel.clone();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = write_cancel.cancelled() => {
                        let _ = write.send(Message::Close(None)).await;
                        break;
                    }
                    event = out_rx.recv() => {
                        let Some(event) = event else { break };
                        let frame = match event.to_frame() {
                            Ok(frame) => frame,
                            Err(e) => {
                                tracing::error!(error = %e, "failed to serialize outbound frame");
                                continue;
                            }
                        };
                        if let Err(e) = write.send(Message::Text(frame)).await {
                            tracing::error!(error = %e, "websocket send failed");
                            break;
                        }
                    }
                }
            }
        });

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    msg = read.next() => match msg {
                        Some(Ok(Message::Text(text))) => match WireEvent::from_frame(&text) {
                            Ok(event) => {
                                let _ = signal_tx.send(TransportSignal::Inbound(event));
                            }
                            Err(e) => {
                                tracing::warn!(error = %e, "unparseable frame, skipping");
                            }
                        },
                        Some(Ok(Message::Close(frame))) => {
                            let reason = frame
                                .map(|f| f.reason.to_string())
                                .unwrap_or_else(|| "server closed connection".to_string());
                            let _ = signal_tx.send(TransportSignal::Closed { reason });
                            break;
                        }
                        // Protocol ping/pong and binary frames are not part of
                        // the event contract.
                        Some(Ok(_)) => {}
                        Some(Err(e)) => {
                            let _ = signal_tx.send(TransportSignal::Closed {
                                reason: e.to_string(),
                            });
                            break;
                        }
                        None => {
                            let _ = signal_tx.send(TransportSignal::Closed {
                                reason: "stream ended".to_string(),
                            });
                            break;
                        }
                    }
                }
            }
        });

        Ok(())
    }

    fn send(&self, event: WireEvent) -> Result<(), TransportError> {
        let outbound = self.outbound.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(tx) = outbound.as_ref() else {
            return Err(TransportError::NotConnected);
        };
        tx.send(event).map_err(|_| TransportError::NotConnected)
    }

    fn close(&self) {
        self.teardown();
    }

    fn take_signals(&self) -> mpsc::UnboundedReceiver<TransportSignal> {
        let (tx, rx) = mpsc::unbounded_channel();
        *self.signal_tx.lock().unwrap_or_else(PoisonError::into_inner) = tx;
        rx
    }
}
