// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Consumer side of the probe protocol.
//!
//! Every delivery on the data topic bumps the `received` counter exactly
//! once, whether or not it decodes. A job completes when the message
//! numbered `total - 1` arrives and `total - 1` deliveries were observed
//! before it since the last `count == 0` message.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::codec::{self, Tag};
use crate::config::Config;
use crate::crypto::Cipher;
use crate::error::{CodecError, CryptoError, ProbeResult};
use crate::message::Message;
use crate::metric::Metric;
use crate::transport::{Subscription, Transport};
use crate::types::{EncryptionKey, Subject};

/// Why a delivery was dropped.
#[derive(Debug)]
pub enum DiscardReason {
    Malformed(CodecError),
    Decrypt(CryptoError),
}

/// Result of folding one delivery into the job state.
#[derive(Debug)]
pub enum Observation {
    /// Could not be decrypted or decoded.
    Discarded(DiscardReason),
    /// `total == 0`, not a real job message.
    Sentinel,
    /// First message of a new job.
    Started { total: u64 },
    /// A job message that neither started nor completed a job.
    Progress,
    /// The consistency check passed for a job of `total` messages.
    Completed { total: u64 },
}

/// Increments the delivery counter when dropped, on every exit path.
struct Delivery<'a> {
    received: &'a mut u64,
}

impl<'a> Delivery<'a> {
    fn begin(received: &'a mut u64) -> Self {
        Self { received }
    }

    /// Deliveries observed before this one since the last reset.
    fn observed(&self) -> u64 {
        *self.received
    }

    fn reset(&mut self) {
        *self.received = 0;
    }
}

impl Drop for Delivery<'_> {
    fn drop(&mut self) {
        *self.received += 1;
    }
}

/// Job-progress state of one consumer.
#[derive(Debug)]
pub struct JobTracker {
    cipher: Option<Cipher>,
    received: u64,
}

impl JobTracker {
    /// Tracker that can open `"encr"` payloads with `key`.
    pub fn new(key: &EncryptionKey) -> ProbeResult<Self> {
        Ok(Self {
            cipher: Some(Cipher::new(key.as_bytes())?),
            received: 0,
        })
    }

    /// Tracker without a key; every `"encr"` delivery is discarded.
    pub fn plaintext_only() -> Self {
        Self {
            cipher: None,
            received: 0,
        }
    }

    /// Deliveries observed since the last reset.
    pub fn received(&self) -> u64 {
        self.received
    }

    /// Fold one delivery into the job state.
    pub fn observe(&mut self, raw: &[u8]) -> Observation {
        let cipher = self.cipher.as_ref();
        let mut delivery = Delivery::begin(&mut self.received);

        let (kind, format, payload) = match (
            codec::decode_kind(raw),
            codec::decode_format(raw),
            codec::decode_payload(raw),
        ) {
            (Ok(kind), Ok(format), Ok(payload)) => (kind, format, payload),
            (Err(e), _, _) | (_, Err(e), _) | (_, _, Err(e)) => {
                return Observation::Discarded(DiscardReason::Malformed(e));
            }
        };

        let plaintext;
        let payload = match format {
            Tag::ENCR => {
                let opened = match cipher {
                    Some(cipher) => cipher.decrypt(payload),
                    None => Err(CryptoError::Decrypt),
                };
                match opened {
                    Ok(bytes) => {
                        plaintext = bytes;
                        plaintext.as_slice()
                    }
                    Err(e) => return Observation::Discarded(DiscardReason::Decrypt(e)),
                }
            }
            _ => payload,
        };

        let message = match Message::decode(kind, payload) {
            Ok(message) => message,
            Err(e) => return Observation::Discarded(DiscardReason::Malformed(e)),
        };

        let total = message.total();
        if total == 0 {
            return Observation::Sentinel;
        }

        let mut observation = Observation::Progress;
        if message.count() == 0 {
            delivery.reset();
            tracing::info!(total, "Accepted a new job");
            observation = Observation::Started { total };
        }

        if message.count() == total - 1 && delivery.observed() == total - 1 {
            tracing::info!(total, "Completed a job");
            observation = Observation::Completed { total };
        }

        observation
    }
}

/// Drives a [`JobTracker`] from the data topic and answers on the metric topic.
pub struct ConsumerDriver {
    transport: Arc<dyn Transport>,
    subject: Subject,
    tracker: Mutex<JobTracker>,
}

impl ConsumerDriver {
    pub fn new(transport: Arc<dyn Transport>, subject: Subject, tracker: JobTracker) -> Self {
        Self {
            transport,
            subject,
            tracker: Mutex::new(tracker),
        }
    }

    pub fn from_config(transport: Arc<dyn Transport>, config: &Config) -> ProbeResult<Self> {
        let tracker = JobTracker::new(&config.encryption_key)?;
        Ok(Self::new(transport, config.subject.clone(), tracker))
    }

    /// Subscribe to the data topic.
    pub async fn subscribe(&self) -> ProbeResult<Subscription> {
        let topic = self.subject.data_topic();
        let subscription = self.transport.subscribe(&topic).await?;
        tracing::info!(topic = %topic, "Listening for job messages");
        Ok(subscription)
    }

    /// Handle one delivery. Per-message failures are swallowed.
    pub async fn handle(&self, raw: &[u8]) -> Observation {
        // counter update and completion decision happen under one lock
        let observation = self.tracker.lock().await.observe(raw);

        match &observation {
            Observation::Completed { total } => self.report_completion(*total).await,
            Observation::Discarded(reason) => {
                tracing::debug!(reason = ?reason, "Discarded delivery");
            }
            _ => {}
        }

        observation
    }

    async fn report_completion(&self, total: u64) {
        let topic = self.subject.metric_topic();
        let payload = match Metric::received(total).to_json() {
            Ok(payload) => payload,
            Err(e) => {
                tracing::error!(error = %e, "Failed to encode completion metric");
                return;
            }
        };

        if let Err(e) = self.transport.publish(&topic, payload).await {
            tracing::error!(topic = %topic, error = %e, "Failed to publish completion metric");
            return;
        }
        if let Err(e) = self.transport.flush().await {
            tracing::warn!(error = %e, "Failed to flush completion metric");
        }
    }

    /// Process deliveries one at a time until the feed closes or `shutdown` resolves.
    pub async fn run<F>(&self, mut subscription: Subscription, shutdown: F) -> ProbeResult<()>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                delivery = subscription.next() => match delivery {
                    Some(raw) => {
                        self.handle(&raw).await;
                    }
                    None => {
                        tracing::info!("Data subscription closed");
                        break;
                    }
                },
                _ = &mut shutdown => {
                    tracing::info!("Consumer shutting down");
                    break;
                }
            }
        }

        if let Err(e) = self.transport.flush().await {
            tracing::warn!(error = %e, "Flush on shutdown failed");
        }
        Ok(())
    }
}
