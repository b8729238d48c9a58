// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! TCP broker and client transport.
//!
//! The broker keeps one reader task and one writer task per connection.
//! A PUB frame is fanned out as MSG frames to every connection subscribed
//! to the topic, the publisher included.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::io::{AsyncWriteExt, BufReader, BufWriter};
use tokio::net::tcp::OwnedWriteHalf;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;

use super::frame::{Frame, Op};
use super::{Subscription, Transport};
use crate::error::TransportError;

type ConnectionId = u64;

/// Topic table of the broker.
#[derive(Debug, Default)]
struct Routes {
    topics: DashMap<String, Vec<(ConnectionId, mpsc::UnboundedSender<Frame>)>>,
}

impl Routes {
    fn subscribe(&self, topic: String, id: ConnectionId, tx: &mpsc::UnboundedSender<Frame>) {
        let mut subs = self.topics.entry(topic).or_default();
        if !subs.iter().any(|(sub_id, _)| *sub_id == id) {
            subs.push((id, tx.clone()));
        }
    }

    fn publish(&self, topic: &str, payload: Vec<u8>) {
        if let Some(mut subs) = self.topics.get_mut(topic) {
            subs.retain(|(_, tx)| tx.send(Frame::new(Op::Msg, topic, payload.clone())).is_ok());
        }
    }

    fn remove_connection(&self, id: ConnectionId) {
        for mut entry in self.topics.iter_mut() {
            entry.value_mut().retain(|(sub_id, _)| *sub_id != id);
        }
        self.topics.retain(|_, subs| !subs.is_empty());
    }
}

/// Minimal publish/subscribe broker.
pub struct TcpBroker {
    listener: TcpListener,
    routes: Arc<Routes>,
}

impl TcpBroker {
    /// Bind the broker listener.
    pub async fn bind(address: &str) -> Result<Self, TransportError> {
        let listener =
            TcpListener::bind(address)
                .await
                .map_err(|source| TransportError::Connect {
                    address: address.to_string(),
                    source,
                })?;
        Ok(Self {
            listener,
            routes: Arc::new(Routes::default()),
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, TransportError> {
        self.listener
            .local_addr()
            .map_err(|source| TransportError::Io {
                context: "reading broker address",
                source,
            })
    }

    /// Accept connections until the listener fails.
    pub async fn run(self) -> Result<(), TransportError> {
        let next_id = AtomicU64::new(1);
        tracing::info!(address = ?self.listener.local_addr().ok(), "Broker listening");

        loop {
            let (stream, peer) =
                self.listener
                    .accept()
                    .await
                    .map_err(|source| TransportError::Io {
                        context: "accepting connection",
                        source,
                    })?;
            let id = next_id.fetch_add(1, Ordering::Relaxed);
            let routes = Arc::clone(&self.routes);

            tracing::debug!(connection = id, peer = %peer, "Client connected");
            tokio::spawn(serve_connection(stream, id, routes));
        }
    }
}

async fn serve_connection(stream: TcpStream, id: ConnectionId, routes: Arc<Routes>) {
    let _ = stream.set_nodelay(true);
    let (read_half, write_half) = stream.into_split();
    // unbounded: a slow client buffers its whole backlog here
    let (tx, mut rx) = mpsc::unbounded_channel::<Frame>();

    let writer = tokio::spawn(async move {
        let mut writer = BufWriter::new(write_half);
        while let Some(frame) = rx.recv().await {
            if let Err(e) = frame.write_to(&mut writer).await {
                tracing::warn!(connection = id, error = %e, "Dropping client writer");
                return;
            }
            if rx.is_empty() && writer.flush().await.is_err() {
                return;
            }
        }
        let _ = writer.flush().await;
    });

    let mut reader = BufReader::new(read_half);
    loop {
        match Frame::read_from(&mut reader).await {
            Ok(Some(frame)) => match frame.op {
                Op::Sub => {
                    tracing::debug!(connection = id, topic = %frame.topic, "Subscribe");
                    routes.subscribe(frame.topic, id, &tx);
                }
                Op::Pub => routes.publish(&frame.topic, frame.payload),
                Op::Msg => {
                    tracing::warn!(connection = id, "Ignoring MSG frame sent by a client");
                }
            },
            Ok(None) => break,
            Err(e) => {
                tracing::warn!(connection = id, error = %e, "Closing client connection");
                break;
            }
        }
    }

    routes.remove_connection(id);
    drop(tx);
    let _ = writer.await;
    tracing::debug!(connection = id, "Client disconnected");
}

/// Client side of the broker protocol.
pub struct TcpTransport {
    writer: Mutex<BufWriter<OwnedWriteHalf>>,
    subscriptions: Arc<DashMap<String, Vec<mpsc::UnboundedSender<Vec<u8>>>>>,
    reader: JoinHandle<()>,
}

impl TcpTransport {
    /// Connect to a broker at `address` (`host:port`).
    pub async fn connect(address: &str) -> Result<Self, TransportError> {
        let stream = TcpStream::connect(address)
            .await
            .map_err(|source| TransportError::Connect {
                address: address.to_string(),
                source,
            })?;
        let _ = stream.set_nodelay(true);
        let (read_half, write_half) = stream.into_split();

        let subscriptions: Arc<DashMap<String, Vec<mpsc::UnboundedSender<Vec<u8>>>>> =
            Arc::new(DashMap::new());
        let dispatch = Arc::clone(&subscriptions);

        let reader = tokio::spawn(async move {
            let mut reader = BufReader::new(read_half);
            loop {
                match Frame::read_from(&mut reader).await {
                    Ok(Some(Frame {
                        op: Op::Msg,
                        topic,
                        payload,
                    })) => {
                        if let Some(mut subs) = dispatch.get_mut(&topic) {
                            subs.retain(|tx| tx.send(payload.clone()).is_ok());
                        }
                    }
                    Ok(Some(frame)) => {
                        tracing::warn!(op = ?frame.op, "Unexpected frame from broker");
                    }
                    Ok(None) => break,
                    Err(e) => {
                        tracing::warn!(error = %e, "Broker connection failed");
                        break;
                    }
                }
            }
            // closes every local subscription
            dispatch.clear();
        });

        tracing::info!(address = %address, "Connected to broker");

        Ok(Self {
            writer: Mutex::new(BufWriter::new(write_half)),
            subscriptions,
            reader,
        })
    }

    async fn send(&self, frame: Frame, flush: bool) -> Result<(), TransportError> {
        let mut writer = self.writer.lock().await;
        frame.write_to(&mut *writer).await?;
        if flush {
            writer.flush().await.map_err(|source| TransportError::Io {
                context: "flushing connection",
                source,
            })?;
        }
        Ok(())
    }
}

#[async_trait]
impl Transport for TcpTransport {
    async fn publish(&self, topic: &str, payload: Vec<u8>) -> Result<(), TransportError> {
        if self.reader.is_finished() {
            return Err(TransportError::Closed);
        }
        self.send(Frame::new(Op::Pub, topic, payload), false).await
    }

    async fn subscribe(&self, topic: &str) -> Result<Subscription, TransportError> {
        if self.reader.is_finished() {
            return Err(TransportError::Closed);
        }
        let (tx, subscription) = Subscription::channel();
        self.subscriptions
            .entry(topic.to_string())
            .or_default()
            .push(tx);
        self.send(Frame::new(Op::Sub, topic, Vec::new()), true)
            .await?;
        Ok(subscription)
    }

    async fn flush(&self) -> Result<(), TransportError> {
        let mut writer = self.writer.lock().await;
        writer.flush().await.map_err(|source| TransportError::Io {
            context: "flushing connection",
            source,
        })
    }
}

impl Drop for TcpTransport {
    fn drop(&mut self) {
        self.reader.abort();
    }
}
