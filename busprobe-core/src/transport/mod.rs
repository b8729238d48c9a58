// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Publish/subscribe transport.
//!
//! The drivers only see [`Transport`]: opaque byte messages, topic fan-out,
//! and delivery to every local subscription of a topic. No ordering is
//! assumed.

mod frame;
mod memory;
mod tcp;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::error::TransportError;

pub use frame::{Frame, Op, MAX_FRAME_PAYLOAD};
pub use memory::MemoryBus;
pub use tcp::{TcpBroker, TcpTransport};

/// Topic-based byte-message transport.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Publish `payload` on `topic` without waiting for delivery.
    async fn publish(&self, topic: &str, payload: Vec<u8>) -> Result<(), TransportError>;

    /// Register a new subscription on `topic`.
    async fn subscribe(&self, topic: &str) -> Result<Subscription, TransportError>;

    /// Push out anything still buffered on the connection.
    async fn flush(&self) -> Result<(), TransportError>;
}

/// Stream of messages delivered on one topic.
#[derive(Debug)]
pub struct Subscription {
    rx: mpsc::UnboundedReceiver<Vec<u8>>,
}

impl Subscription {
    /// Create a subscription and the sender that feeds it.
    pub fn channel() -> (mpsc::UnboundedSender<Vec<u8>>, Self) {
        let (tx, rx) = mpsc::unbounded_channel();
        (tx, Self { rx })
    }

    /// Next delivered message, or `None` once the transport drops the feed.
    pub async fn next(&mut self) -> Option<Vec<u8>> {
        self.rx.recv().await
    }
}
