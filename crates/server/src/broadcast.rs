//! Push-notification hub backing the WebSocket channel.
//!
//! The hub is the boundary between the order machinery and the push
//! transport: handlers hand it fully-formed event payloads and never see
//! sockets. Delivery is fire-and-forget - a dropped frame leaves a stale
//! client-side mirror until the next read, never an inconsistent store.

use serde_json::{Value, json};
use tokio::sync::broadcast;

/// Frames buffered per subscriber before slow sockets start lagging.
const CHANNEL_CAPACITY: usize = 256;

/// A single push event. `target` of `None` fans out to every socket.
#[derive(Debug, Clone)]
pub struct Envelope {
    pub target: Option<String>,
    pub event: &'static str,
    pub data: Value,
}

impl Envelope {
    /// Wire frame sent down the socket.
    #[must_use]
    pub fn frame(&self) -> String {
        json!({"event": self.event, "data": self.data}).to_string()
    }
}

/// Fan-out hub for push events.
#[derive(Debug, Clone)]
pub struct Hub {
    tx: broadcast::Sender<Envelope>,
}

impl Hub {
    #[must_use]
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { tx }
    }

    /// Subscribe a socket to the event stream.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<Envelope> {
        self.tx.subscribe()
    }

    /// Emit to one client's sockets; an empty client id broadcasts to
    /// everyone (anonymous mutations are visible to all mirrors).
    pub fn emit_to(&self, client_id: &str, event: &'static str, data: Value) {
        let target = if client_id.is_empty() {
            None
        } else {
            Some(client_id.to_owned())
        };
        // No connected sockets is not an error.
        let _ = self.tx.send(Envelope {
            target,
            event,
            data,
        });
    }

    /// Emit to every connected socket.
    pub fn emit_all(&self, event: &'static str, data: Value) {
        let _ = self.tx.send(Envelope {
            target: None,
            event,
            data,
        });
    }
}

impl Default for Hub {
    fn default() -> Self {
        Self::new()
    }
}
