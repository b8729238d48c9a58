// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Length-prefixed frames for the TCP broker protocol.
//!
//! ```text
//! frame ::= op[1] topic_len[2, BE] topic[topic_len] payload_len[4, BE] payload[payload_len]
//! ```

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::TransportError;

/// Maximum payload size (16 MB).
pub const MAX_FRAME_PAYLOAD: usize = 16 * 1024 * 1024;

/// Frame operation codes.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    /// Client to broker: publish on a topic.
    Pub = 1,
    /// Client to broker: subscribe to a topic.
    Sub = 2,
    /// Broker to client: delivery on a subscribed topic.
    Msg = 3,
}

impl TryFrom<u8> for Op {
    type Error = TransportError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::Pub),
            2 => Ok(Self::Sub),
            3 => Ok(Self::Msg),
            _ => Err(TransportError::InvalidFrame {
                reason: format!("Unknown op code: {}", value),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub op: Op,
    pub topic: String,
    pub payload: Vec<u8>,
}

impl Frame {
    pub fn new(op: Op, topic: impl Into<String>, payload: Vec<u8>) -> Self {
        Self {
            op,
            topic: topic.into(),
            payload,
        }
    }

    /// Validate sizes before writing.
    fn validate(&self) -> Result<(), TransportError> {
        if self.topic.len() > u16::MAX as usize {
            return Err(TransportError::InvalidFrame {
                reason: format!("Topic too long: {} bytes", self.topic.len()),
            });
        }
        if self.payload.len() > MAX_FRAME_PAYLOAD {
            return Err(TransportError::FrameTooLarge {
                size: self.payload.len(),
                max: MAX_FRAME_PAYLOAD,
            });
        }
        Ok(())
    }

    /// Write the frame. Does not flush.
    pub async fn write_to<W>(&self, writer: &mut W) -> Result<(), TransportError>
    where
        W: AsyncWrite + Unpin,
    {
        self.validate()?;

        let io = |source| TransportError::Io {
            context: "writing frame",
            source,
        };
        writer.write_u8(self.op as u8).await.map_err(io)?;
        writer
            .write_u16(self.topic.len() as u16)
            .await
            .map_err(io)?;
        writer.write_all(self.topic.as_bytes()).await.map_err(io)?;
        writer
            .write_u32(self.payload.len() as u32)
            .await
            .map_err(io)?;
        writer.write_all(&self.payload).await.map_err(io)?;
        Ok(())
    }

    /// Read one frame. Returns `None` on a clean end of stream.
    pub async fn read_from<R>(reader: &mut R) -> Result<Option<Self>, TransportError>
    where
        R: AsyncRead + Unpin,
    {
        let io = |source| TransportError::Io {
            context: "reading frame",
            source,
        };

        let op = match reader.read_u8().await {
            Ok(op) => Op::try_from(op)?,
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
            Err(e) => return Err(io(e)),
        };

        let topic_len = reader.read_u16().await.map_err(io)? as usize;
        let mut topic = vec![0u8; topic_len];
        reader.read_exact(&mut topic).await.map_err(io)?;
        let topic = String::from_utf8(topic).map_err(|_| TransportError::InvalidFrame {
            reason: "Topic is not valid UTF-8".to_string(),
        })?;

        let payload_len = reader.read_u32().await.map_err(io)? as usize;
        if payload_len > MAX_FRAME_PAYLOAD {
            return Err(TransportError::FrameTooLarge {
                size: payload_len,
                max: MAX_FRAME_PAYLOAD,
            });
        }
        let mut payload = vec![0u8; payload_len];
        reader.read_exact(&mut payload).await.map_err(io)?;

        Ok(Some(Self { op, topic, payload }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_frame_layout() {
        let frame = Frame::new(Op::Pub, "ab", vec![9, 8, 7]);
        let mut buf = Vec::new();
        frame.write_to(&mut buf).await.unwrap();
        assert_eq!(buf, vec![1, 0, 2, b'a', b'b', 0, 0, 0, 3, 9, 8, 7]);

        let mut reader = buf.as_slice();
        assert_eq!(Frame::read_from(&mut reader).await.unwrap(), Some(frame));
        assert_eq!(Frame::read_from(&mut reader).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_unknown_op_rejected() {
        let mut reader: &[u8] = &[42, 0, 0, 0, 0, 0, 0];
        assert!(matches!(
            Frame::read_from(&mut reader).await,
            Err(TransportError::InvalidFrame { .. })
        ));
    }

    #[tokio::test]
    async fn test_oversized_payload_rejected() {
        let mut header = vec![3, 0, 1, b't'];
        header.extend_from_slice(&((MAX_FRAME_PAYLOAD as u32) + 1).to_be_bytes());
        let mut reader = header.as_slice();
        assert!(matches!(
            Frame::read_from(&mut reader).await,
            Err(TransportError::FrameTooLarge { .. })
        ));
    }

    #[tokio::test]
    async fn test_truncated_frame_is_error() {
        let mut reader: &[u8] = &[1, 0, 5, b'a'];
        assert!(matches!(
            Frame::read_from(&mut reader).await,
            Err(TransportError::Io { .. })
        ));
    }
}
