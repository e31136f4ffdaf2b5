//! In-memory transport for driving the session state machine in tests.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use serde_json::Value;
use tokio::sync::mpsc;

use cardroom_client::{ClientConfig, EventTransport, TransportError, TransportSignal};
use cardroom_protocol::WireEvent;

pub fn config() -> ClientConfig {
    ClientConfig::new("ws://localhost:4000/rt").unwrap()
}

/// A room payload the decoder accepts, with everything defaultable omitted.
pub fn room_json(id: &str) -> Value {
    serde_json::json!({
        "id": id,
        "name": format!("table {id}"),
        "host": {"id": "u-host"},
        "maxPlayers": 6,
    })
}

/// Let the driver task catch up with everything already runnable.
pub async fn settle() {
    for _ in 0..8 {
        tokio::task::yield_now().await;
    }
}

/// Scripted transport: connects succeed or fail on demand, outbound events
/// are recorded, and tests inject inbound traffic directly.
pub struct FakeTransport {
    fail_connects: AtomicBool,
    connect_calls: AtomicU32,
    connect_times: Mutex<Vec<tokio::time::Instant>>,
    auths: Mutex<Vec<Option<String>>>,
    sent: Mutex<Vec<WireEvent>>,
    closed: AtomicBool,
    signal_tx: Mutex<mpsc::UnboundedSender<TransportSignal>>,
}

impl FakeTransport {
    pub fn new() -> Arc<Self> {
        let (signal_tx, _) = mpsc::unbounded_channel();
        Arc::new(Self {
            fail_connects: AtomicBool::new(false),
            connect_calls: AtomicU32::new(0),
            connect_times: Mutex::new(Vec::new()),
            auths: Mutex::new(Vec::new()),
            sent: Mutex::new(Vec::new()),
            closed: AtomicBool::new(false),
            signal_tx: Mutex::new(signal_tx),
        })
    }

    pub fn failing() -> Arc<Self> {
        let transport = Self::new();
        transport.set_failing(true);
        transport
    }

    pub fn set_failing(&self, fail: bool) {
        self.fail_connects.store(fail, Ordering::SeqCst);
    }

    pub fn connect_calls(&self) -> u32 {
        self.connect_calls.load(Ordering::SeqCst)
    }

    pub fn connect_times(&self) -> Vec<tokio::time::Instant> {
        self.connect_times.lock().unwrap().clone()
    }

    pub fn auth_tokens(&self) -> Vec<Option<String>> {
        self.auths.lock().unwrap().clone()
    }

    pub fn sent(&self) -> Vec<WireEvent> {
        self.sent.lock().unwrap().clone()
    }

    pub fn was_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Inject one inbound wire event.
    pub fn push_inbound(&self, name: &str, data: Value) {
        let _ = self
            .signal_tx
            .lock()
            .unwrap()
            .send(TransportSignal::Inbound(WireEvent::new(name, data)));
    }

    /// Simulate the server (or network) dropping the connection.
    pub fn drop_connection(&self, reason: &str) {
        let _ = self.signal_tx.lock().unwrap().send(TransportSignal::Closed {
            reason: reason.to_string(),
        });
    }
}

#[async_trait::async_trait]
impl EventTransport for FakeTransport {
    async fn connect(&self, auth: Option<String>) -> Result<(), TransportError> {
        self.connect_calls.fetch_add(1, Ordering::SeqCst);
        self.connect_times
            .lock()
            .unwrap()
            .push(tokio::time::Instant::now());
        self.auths.lock().unwrap().push(auth);
        if self.fail_connects.load(Ordering::SeqCst) {
            Err(TransportError::Connect("connection refused".to_string()))
        } else {
            Ok(())
        }
    }

    fn send(&self, event: WireEvent) -> Result<(), TransportError> {
        self.sent.lock().unwrap().push(event);
        Ok(())
    }

    fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }

    fn take_signals(&self) -> mpsc::UnboundedReceiver<TransportSignal> {
        let (tx, rx) = mpsc::unbounded_channel();
        *self.signal_tx.lock().unwrap() = tx;
        rx
    }
}
