//! In-process broadcast bus
//!
//! Stand-in for the browser's named BroadcastChannel: a process-wide
//! registry of named channels shared by every context of a test or embedded
//! runtime. Matching browser semantics, a publisher never observes its own
//! message; delivery order is guaranteed only within one channel.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::broadcast;

use crate::broadcast::ChannelEnvelope;

const CHANNEL_CAPACITY: usize = 32;

#[derive(Clone, Debug)]
struct Delivery {
    source: u64,
    envelope: ChannelEnvelope,
}

#[derive(Default)]
pub struct BroadcastBus {
    channels: Mutex<HashMap<String, broadcast::Sender<Delivery>>>,
    next_source: AtomicU64,
}

impl BroadcastBus {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Mint a handle for one context. Each handle carries a source token so
    /// its own publications are filtered out of its subscriptions.
    pub fn handle(self: &Arc<Self>) -> BusHandle {
        BusHandle {
            bus: Arc::clone(self),
            source: self.next_source.fetch_add(1, Ordering::Relaxed),
        }
    }

    fn sender(&self, channel: &str) -> broadcast::Sender<Delivery> {
        let mut channels = self.channels.lock().unwrap_or_else(|e| e.into_inner());
        channels
            .entry(channel.to_string())
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0)
            .clone()
    }
}

/// A context's connection to the bus.
#[derive(Clone)]
pub struct BusHandle {
    bus: Arc<BroadcastBus>,
    source: u64,
}

impl BusHandle {
    /// Ephemeral publish: open the channel, send one message, close. The
    /// sender is dropped immediately after the send; nothing is kept open.
    /// Sends with no subscribers are fine (fire-and-forget).
    pub fn publish(&self, channel: &str, envelope: ChannelEnvelope) {
        let sender = self.bus.sender(channel);
        let _ = sender.send(Delivery {
            source: self.source,
            envelope,
        });
    }

    pub fn subscribe(&self, channel: &str) -> BusSubscription {
        BusSubscription {
            rx: self.bus.sender(channel).subscribe(),
            source: self.source,
        }
    }
}

pub struct BusSubscription {
    rx: broadcast::Receiver<Delivery>,
    source: u64,
}

impl BusSubscription {
    /// Next message published by a *different* context, or `None` once the
    /// channel is gone. Messages missed while lagging are skipped.
    pub async fn recv(&mut self) -> Option<ChannelEnvelope> {
        loop {
            match self.rx.recv().await {
                Ok(delivery) if delivery.source == self.source => continue,
                Ok(delivery) => return Some(delivery.envelope),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    log::warn!("broadcast subscriber lagged, skipped {} messages", skipped);
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::broadcast::{channel_name, channels, ChannelMessage};

    #[tokio::test]
    async fn test_publish_reaches_sibling_not_self() {
        let bus = BroadcastBus::new();
        let a = bus.handle();
        let b = bus.handle();

        let channel = channel_name(channels::LOGOUT, "inst1");
        let mut sub_a = a.subscribe(&channel);
        let mut sub_b = b.subscribe(&channel);

        a.publish(&channel, ChannelEnvelope::new(ChannelMessage::Logout));

        let got = sub_b.recv().await.unwrap();
        assert_eq!(got.data, ChannelMessage::Logout);

        // The publisher's own subscription sees nothing.
        let own = tokio::time::timeout(std::time::Duration::from_millis(50), sub_a.recv()).await;
        assert!(own.is_err());
    }

    #[tokio::test]
    async fn test_channels_are_scoped_by_name() {
        let bus = BroadcastBus::new();
        let a = bus.handle();
        let b = bus.handle();

        let mut other = b.subscribe(&channel_name(channels::LOGOUT, "other-instance"));
        a.publish(
            &channel_name(channels::LOGOUT, "inst1"),
            ChannelEnvelope::new(ChannelMessage::Logout),
        );

        let got = tokio::time::timeout(std::time::Duration::from_millis(50), other.recv()).await;
        assert!(got.is_err());
    }

    #[tokio::test]
    async fn test_publish_without_subscribers_is_noop() {
        let bus = BroadcastBus::new();
        let a = bus.handle();
        a.publish(
            &channel_name(channels::THEME_CHANGE, "inst1"),
            ChannelEnvelope::new(ChannelMessage::Logout),
        );
    }
}
