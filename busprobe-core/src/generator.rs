// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Message generator pipeline.
//!
//! Generators are composed by construction: a base payload generator,
//! optionally wrapped in [`Encrypted`], finally wrapped in [`Framed`].
//! Every stage returns a buffer with the 8-byte header region reserved;
//! only [`Framed`] writes it.

use std::sync::Arc;

use serde::Serialize;

use crate::codec::{self, RawMessage, Tag, COUNTERS_LEN, HEADER_LEN};
use crate::crypto::Cipher;
use crate::error::{CodecError, ProbeResult};
use crate::message::StructMessageRef;

/// Produces the message for position `count` of a job of `total` messages.
pub trait Generator: Send + Sync {
    fn generate(&self, count: u64, total: u64) -> ProbeResult<RawMessage>;
}

impl<G: Generator + ?Sized> Generator for Arc<G> {
    fn generate(&self, count: u64, total: u64) -> ProbeResult<RawMessage> {
        (**self).generate(count, total)
    }
}

impl<G: Generator + ?Sized> Generator for Box<G> {
    fn generate(&self, count: u64, total: u64) -> ProbeResult<RawMessage> {
        (**self).generate(count, total)
    }
}

/// Byte payload: counters followed by the same data on every call.
#[derive(Debug, Clone)]
pub struct BaseBytes {
    data: Arc<[u8]>,
}

impl BaseBytes {
    pub fn new(data: impl Into<Arc<[u8]>>) -> Self {
        Self { data: data.into() }
    }
}

impl Generator for BaseBytes {
    fn generate(&self, count: u64, total: u64) -> ProbeResult<RawMessage> {
        let mut msg = RawMessage::with_payload_len(COUNTERS_LEN + self.data.len());
        let buf = msg.as_bytes_mut();
        buf[HEADER_LEN..HEADER_LEN + COUNTERS_LEN]
            .copy_from_slice(&codec::encode_counters(count, total)?);
        buf[HEADER_LEN + COUNTERS_LEN..].copy_from_slice(&self.data);
        Ok(msg)
    }
}

/// JSON payload `{"Count", "Total", "Data"}` around a shared value.
pub struct BaseStruct<T> {
    value: Arc<T>,
}

impl<T> BaseStruct<T> {
    pub fn new(value: T) -> Self {
        Self::from_shared(Arc::new(value))
    }

    /// Reuse a value that is already shared; it must not change during a run.
    pub fn from_shared(value: Arc<T>) -> Self {
        Self { value }
    }
}

impl<T: Serialize + Send + Sync> Generator for BaseStruct<T> {
    fn generate(&self, count: u64, total: u64) -> ProbeResult<RawMessage> {
        let body = serde_json::to_vec(&StructMessageRef {
            count,
            total,
            data: self.value.as_ref(),
        })
        .map_err(|e| CodecError::Serialize {
            message: e.to_string(),
        })?;
        Ok(RawMessage::from_payload(&body))
    }
}

/// Seals the inner payload with AES-256-GCM.
pub struct Encrypted<G> {
    inner: G,
    cipher: Cipher,
}

impl<G: Generator> Encrypted<G> {
    /// Fails unless `key` is exactly 32 bytes.
    pub fn new(inner: G, key: &[u8]) -> ProbeResult<Self> {
        let cipher = Cipher::new(key)?;
        Ok(Self { inner, cipher })
    }
}

impl<G: Generator> Generator for Encrypted<G> {
    fn generate(&self, count: u64, total: u64) -> ProbeResult<RawMessage> {
        let plain = self.inner.generate(count, total)?;
        let sealed = self.cipher.encrypt(plain.payload()?)?;
        Ok(RawMessage::from_payload(&sealed))
    }
}

/// Stamps the final kind and format tags.
pub struct Framed<G> {
    kind: Tag,
    format: Tag,
    inner: G,
}

impl<G: Generator> Framed<G> {
    pub fn new(kind: Tag, format: Tag, inner: G) -> Self {
        Self {
            kind,
            format,
            inner,
        }
    }

    pub fn kind(&self) -> Tag {
        self.kind
    }

    pub fn format(&self) -> Tag {
        self.format
    }
}

impl<G: Generator> Generator for Framed<G> {
    fn generate(&self, count: u64, total: u64) -> ProbeResult<RawMessage> {
        let mut msg = self.inner.generate(count, total)?;
        msg.stamp(self.kind, self.format)?;
        Ok(msg)
    }
}
