// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Wire layout of probe messages.
//!
//! ```text
//! RawMessage ::= kind[4] format[4] payload
//! payload(kind=byte) ::= count[8] total[8] data[...]
//! ```
//!
//! Counters are unsigned LEB128 varints, zero padded to their 8-byte slot.
//! Unknown tags are not an error here; classification belongs to the consumer.

use std::borrow::Cow;
use std::fmt;

use crate::error::CodecError;

/// Size of the kind + format header.
pub const HEADER_LEN: usize = 8;

/// Size of one varint counter slot.
pub const COUNTER_SLOT_LEN: usize = 8;

/// Size of the count + total region of a byte payload.
pub const COUNTERS_LEN: usize = 2 * COUNTER_SLOT_LEN;

/// Largest counter value whose varint fits in one slot (7 bits per byte).
pub const MAX_COUNTER: u64 = (1 << (7 * COUNTER_SLOT_LEN)) - 1;

/// Four-byte message-kind or payload-format tag.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Tag([u8; 4]);

impl Tag {
    /// Plain bytes: `"byte"` as kind, plaintext as format.
    pub const BYTE: Tag = Tag(*b"byte");
    /// Structured JSON payload.
    pub const JSON: Tag = Tag(*b"json");
    /// AES-256-GCM encrypted payload.
    pub const ENCR: Tag = Tag(*b"encr");

    pub const fn new(bytes: [u8; 4]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 4] {
        &self.0
    }

    /// Lossy text form for logs and reports.
    pub fn as_str(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.0)
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_str())
    }
}

impl fmt::Debug for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Tag({:?})", self.as_str())
    }
}

/// A framed message as exchanged over the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawMessage(Vec<u8>);

impl RawMessage {
    /// Allocate a zeroed buffer with the header region reserved.
    pub fn with_payload_len(payload_len: usize) -> Self {
        Self(vec![0u8; HEADER_LEN + payload_len])
    }

    /// Reserve a zeroed header in front of `payload`.
    pub fn from_payload(payload: &[u8]) -> Self {
        let mut buf = Vec::with_capacity(HEADER_LEN + payload.len());
        buf.extend_from_slice(&[0u8; HEADER_LEN]);
        buf.extend_from_slice(payload);
        Self(buf)
    }

    pub fn kind(&self) -> Result<Tag, CodecError> {
        decode_kind(&self.0)
    }

    pub fn format(&self) -> Result<Tag, CodecError> {
        decode_format(&self.0)
    }

    pub fn payload(&self) -> Result<&[u8], CodecError> {
        decode_payload(&self.0)
    }

    /// Overwrite the header region with `kind || format`.
    pub fn stamp(&mut self, kind: Tag, format: Tag) -> Result<(), CodecError> {
        ensure_header(&self.0)?;
        self.0[..HEADER_LEN].copy_from_slice(&encode_header(kind, format));
        Ok(())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }
}

impl From<Vec<u8>> for RawMessage {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

/// Encode the 8-byte header.
pub fn encode_header(kind: Tag, format: Tag) -> [u8; HEADER_LEN] {
    let mut header = [0u8; HEADER_LEN];
    header[..4].copy_from_slice(kind.as_bytes());
    header[4..].copy_from_slice(format.as_bytes());
    header
}

fn ensure_header(raw: &[u8]) -> Result<(), CodecError> {
    if raw.len() < HEADER_LEN {
        return Err(CodecError::Malformed {
            reason: format!(
                "message is {} bytes, header needs {}",
                raw.len(),
                HEADER_LEN
            ),
        });
    }
    Ok(())
}

fn tag_at(raw: &[u8], offset: usize) -> Result<Tag, CodecError> {
    ensure_header(raw)?;
    let mut tag = [0u8; 4];
    tag.copy_from_slice(&raw[offset..offset + 4]);
    Ok(Tag(tag))
}

pub fn decode_kind(raw: &[u8]) -> Result<Tag, CodecError> {
    tag_at(raw, 0)
}

pub fn decode_format(raw: &[u8]) -> Result<Tag, CodecError> {
    tag_at(raw, 4)
}

pub fn decode_payload(raw: &[u8]) -> Result<&[u8], CodecError> {
    ensure_header(raw)?;
    Ok(&raw[HEADER_LEN..])
}

/// Write `value` as a varint into an 8-byte slot.
fn put_uvarint(slot: &mut [u8], field: &'static str, value: u64) -> Result<(), CodecError> {
    if value > MAX_COUNTER {
        return Err(CodecError::CounterOverflow { field, value });
    }

    let mut v = value;
    let mut i = 0;
    while v >= 0x80 {
        slot[i] = (v as u8) | 0x80;
        v >>= 7;
        i += 1;
    }
    slot[i] = v as u8;
    Ok(())
}

/// Read a varint from an 8-byte slot.
fn uvarint(slot: &[u8], field: &'static str) -> Result<u64, CodecError> {
    let mut value = 0u64;
    for (i, byte) in slot.iter().enumerate() {
        value |= u64::from(byte & 0x7f) << (7 * i);
        if byte & 0x80 == 0 {
            return Ok(value);
        }
    }
    Err(CodecError::Malformed {
        reason: format!("{} varint does not terminate within its slot", field),
    })
}

/// Encode the count + total region of a byte payload.
pub fn encode_counters(count: u64, total: u64) -> Result<[u8; COUNTERS_LEN], CodecError> {
    let mut counters = [0u8; COUNTERS_LEN];
    put_uvarint(&mut counters[..COUNTER_SLOT_LEN], "count", count)?;
    put_uvarint(&mut counters[COUNTER_SLOT_LEN..], "total", total)?;
    Ok(counters)
}

/// Decode `(count, total)` from the front of a byte payload.
pub fn decode_counters(payload: &[u8]) -> Result<(u64, u64), CodecError> {
    if payload.len() < COUNTERS_LEN {
        return Err(CodecError::Malformed {
            reason: format!(
                "byte payload is {} bytes, counters need {}",
                payload.len(),
                COUNTERS_LEN
            ),
        });
    }
    let count = uvarint(&payload[..COUNTER_SLOT_LEN], "count")?;
    let total = uvarint(&payload[COUNTER_SLOT_LEN..COUNTERS_LEN], "total")?;
    Ok((count, total))
}
