// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! In-process transport.
//!
//! Used by `busprobe local` and by the driver tests.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::mpsc;

use super::{Subscription, Transport};
use crate::error::TransportError;

/// In-memory fan-out bus. Clones share the same topic table.
#[derive(Debug, Clone, Default)]
pub struct MemoryBus {
    topics: Arc<DashMap<String, Vec<mpsc::UnboundedSender<Vec<u8>>>>>,
}

impl MemoryBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a bus wrapped in an Arc for sharing across tasks.
    pub fn new_shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Number of live subscriptions on `topic`.
    #[cfg(test)]
    fn subscriber_count(&self, topic: &str) -> usize {
        self.topics
            .get(topic)
            .map(|subs| subs.iter().filter(|tx| !tx.is_closed()).count())
            .unwrap_or(0)
    }
}

#[async_trait]
impl Transport for MemoryBus {
    async fn publish(&self, topic: &str, payload: Vec<u8>) -> Result<(), TransportError> {
        if let Some(mut subs) = self.topics.get_mut(topic) {
            subs.retain(|tx| tx.send(payload.clone()).is_ok());
        }
        Ok(())
    }

    async fn subscribe(&self, topic: &str) -> Result<Subscription, TransportError> {
        let (tx, subscription) = Subscription::channel();
        self.topics.entry(topic.to_string()).or_default().push(tx);
        tracing::debug!(topic = %topic, "Memory subscription registered");
        Ok(subscription)
    }

    async fn flush(&self) -> Result<(), TransportError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fan_out_to_all_subscribers() {
        let bus = MemoryBus::new();
        let mut a = bus.subscribe("probe.data").await.unwrap();
        let mut b = bus.subscribe("probe.data").await.unwrap();
        let mut other = bus.subscribe("probe.metric").await.unwrap();

        bus.publish("probe.data", b"hello".to_vec()).await.unwrap();

        assert_eq!(a.next().await.unwrap(), b"hello");
        assert_eq!(b.next().await.unwrap(), b"hello");
        assert!(other.rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_publish_without_subscribers() {
        let bus = MemoryBus::new();
        assert!(bus.publish("nobody", vec![1, 2, 3]).await.is_ok());
        assert!(bus.flush().await.is_ok());
    }

    #[tokio::test]
    async fn test_dropped_subscription_is_pruned() {
        let bus = MemoryBus::new();
        let keep = bus.subscribe("t").await.unwrap();
        let gone = bus.subscribe("t").await.unwrap();
        drop(gone);

        bus.publish("t", vec![0]).await.unwrap();
        assert_eq!(bus.topics.get("t").unwrap().len(), 1);
        assert_eq!(bus.subscriber_count("t"), 1);
        drop(keep);
    }
}
