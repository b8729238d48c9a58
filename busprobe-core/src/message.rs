// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Decoded message payloads.
//!
//! `Message` is the only view the drivers see. Each payload encoding is
//! one variant; an unrecognized kind tag decodes as a byte message.

use serde::{Deserialize, Serialize};

use crate::codec::{self, Tag, COUNTERS_LEN};
use crate::error::CodecError;

/// Payload of a `"byte"` message, borrowed from the delivered buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteMessage<'a> {
    count: u64,
    total: u64,
    data: &'a [u8],
}

impl<'a> ByteMessage<'a> {
    pub fn decode(payload: &'a [u8]) -> Result<Self, CodecError> {
        let (count, total) = codec::decode_counters(payload)?;
        Ok(Self {
            count,
            total,
            data: &payload[COUNTERS_LEN..],
        })
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn data(&self) -> &'a [u8] {
        self.data
    }
}

/// Payload of a `"json"` message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructMessage {
    #[serde(rename = "Count")]
    pub count: u64,
    #[serde(rename = "Total")]
    pub total: u64,
    #[serde(rename = "Data", default)]
    pub data: serde_json::Value,
}

impl StructMessage {
    pub fn decode(payload: &[u8]) -> Result<Self, CodecError> {
        serde_json::from_slice(payload).map_err(|e| CodecError::Deserialize {
            message: e.to_string(),
        })
    }
}

/// Borrowed counterpart of [`StructMessage`] used when generating, so the
/// shared `Data` value is serialized without being cloned.
#[derive(Serialize)]
pub(crate) struct StructMessageRef<'a, T: Serialize + ?Sized> {
    #[serde(rename = "Count")]
    pub count: u64,
    #[serde(rename = "Total")]
    pub total: u64,
    #[serde(rename = "Data")]
    pub data: &'a T,
}

/// A decoded job message of any supported encoding.
#[derive(Debug, Clone, PartialEq)]
pub enum Message<'a> {
    Byte(ByteMessage<'a>),
    Struct(StructMessage),
}

impl<'a> Message<'a> {
    /// Decode a plaintext payload according to its kind tag.
    pub fn decode(kind: Tag, payload: &'a [u8]) -> Result<Self, CodecError> {
        match kind {
            Tag::JSON => StructMessage::decode(payload).map(Message::Struct),
            // "byte" and anything unrecognized
            _ => ByteMessage::decode(payload).map(Message::Byte),
        }
    }

    pub fn count(&self) -> u64 {
        match self {
            Message::Byte(msg) => msg.count(),
            Message::Struct(msg) => msg.count,
        }
    }

    pub fn total(&self) -> u64 {
        match self {
            Message::Byte(msg) => msg.total(),
            Message::Struct(msg) => msg.total,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::encode_counters;

    fn byte_payload(count: u64, total: u64, data: &[u8]) -> Vec<u8> {
        let mut payload = encode_counters(count, total).unwrap().to_vec();
        payload.extend_from_slice(data);
        payload
    }

    #[test]
    fn test_byte_message_decode() {
        let payload = byte_payload(3, 10, b"hello");
        let msg = ByteMessage::decode(&payload).unwrap();
        assert_eq!(msg.count(), 3);
        assert_eq!(msg.total(), 10);
        assert_eq!(msg.data(), b"hello");
    }

    #[test]
    fn test_struct_message_field_names() {
        let msg = StructMessage::decode(br#"{"Count":4,"Total":9,"Data":{"MyData":"x"}}"#).unwrap();
        assert_eq!(msg.count, 4);
        assert_eq!(msg.total, 9);
        assert_eq!(msg.data["MyData"], "x");

        let lowercase = StructMessage::decode(br#"{"count":4,"total":9}"#);
        assert!(matches!(lowercase, Err(CodecError::Deserialize { .. })));
    }

    #[test]
    fn test_unknown_kind_falls_back_to_bytes() {
        let payload = byte_payload(1, 2, b"");
        let msg = Message::decode(Tag::new(*b"????"), &payload).unwrap();
        assert!(matches!(msg, Message::Byte(_)));
        assert_eq!(msg.count(), 1);
        assert_eq!(msg.total(), 2);
    }

    #[test]
    fn test_json_kind_rejects_garbage() {
        assert!(Message::decode(Tag::JSON, b"\x00\x01not json").is_err());
    }
}
