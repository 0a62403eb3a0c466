//! Message streams to the embedding page
//!
//! The transport is abstract: a named, bidirectional, JSON-valued stream.
//! Two streams are opened per session, one for wallet RPC traffic and one
//! for general communication, and handed to the engine together with the
//! origin; trust decisions based on that origin belong to the engine.

use std::collections::HashMap;
use std::sync::Mutex;

use serde_json::Value;
use tokio::sync::mpsc;

pub const WALLET_STREAM: &str = "iframe_wallet";
pub const WALLET_STREAM_TARGET: &str = "embed_wallet";
pub const COMMUNICATION_STREAM: &str = "iframe_communication";
pub const COMMUNICATION_STREAM_TARGET: &str = "embed_communication";

/// One end of a bidirectional post-message stream.
pub struct MessageStream {
    pub name: String,
    pub target: String,
    tx: mpsc::UnboundedSender<Value>,
    rx: mpsc::UnboundedReceiver<Value>,
}

impl MessageStream {
    pub fn send(&self, message: Value) -> bool {
        self.tx.send(message).is_ok()
    }

    pub async fn recv(&mut self) -> Option<Value> {
        self.rx.recv().await
    }
}

/// Create both ends of a stream: the local end named `name` addressing
/// `target`, and the remote end named the other way around.
pub fn stream_pair(name: &str, target: &str) -> (MessageStream, MessageStream) {
    let (tx_a, rx_b) = mpsc::unbounded_channel();
    let (tx_b, rx_a) = mpsc::unbounded_channel();
    (
        MessageStream {
            name: name.to_string(),
            target: target.to_string(),
            tx: tx_a,
            rx: rx_a,
        },
        MessageStream {
            name: target.to_string(),
            target: name.to_string(),
            tx: tx_b,
            rx: rx_b,
        },
    )
}

/// Creates the streams a controller hands to its engine. Injected so tests
/// and hosts can decide what the far end is wired to.
pub trait StreamFactory: Send + Sync {
    fn connect(&self, name: &str, target: &str) -> MessageStream;
}

/// Keeps the far end of every created stream so a test (standing in for the
/// embedding page) can pick it up by its target name.
#[derive(Default)]
pub struct LoopbackStreamFactory {
    remote_ends: Mutex<HashMap<String, MessageStream>>,
}

impl LoopbackStreamFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the embedding-page end of a stream created earlier.
    pub fn take_remote(&self, name: &str) -> Option<MessageStream> {
        self.remote_ends
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(name)
    }
}

impl StreamFactory for LoopbackStreamFactory {
    fn connect(&self, name: &str, target: &str) -> MessageStream {
        let (local, remote) = stream_pair(name, target);
        self.remote_ends
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(remote.name.clone(), remote);
        local
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_stream_pair_is_bidirectional() {
        let (local, mut remote) = stream_pair(WALLET_STREAM, WALLET_STREAM_TARGET);
        assert!(local.send(json!({"method": "ping"})));
        assert_eq!(remote.recv().await.unwrap()["method"], "ping");
        assert!(remote.send(json!({"result": "pong"})));
    }

    #[tokio::test]
    async fn test_loopback_factory_keeps_remote_end() {
        let factory = LoopbackStreamFactory::new();
        let local = factory.connect(WALLET_STREAM, WALLET_STREAM_TARGET);
        let mut remote = factory.take_remote(WALLET_STREAM_TARGET).unwrap();
        local.send(json!(1));
        assert_eq!(remote.recv().await.unwrap(), json!(1));
        assert!(factory.take_remote(WALLET_STREAM_TARGET).is_none());
    }
}
