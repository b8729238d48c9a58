// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Newtype wrappers for validated inputs.
//!
//! Following the "Newtype" pattern in Rust to ensure valid state by construction.
//! All types validate their invariants at creation time.

use std::fmt;


use crate::codec::MAX_COUNTER;
use crate::error::HardValidationError;

/// AES-256-GCM key length in bytes.
pub const KEY_LEN: usize = 32;

/// Validated subject name.
/// Must be non-empty and free of whitespace; topics are derived from it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Subject(String);

impl Subject {
    /// Create a new Subject with validation.
    pub fn new(subject: impl Into<String>) -> Result<Self, HardValidationError> {
        let subject = subject.into();

        if subject.is_empty() {
            return Err(HardValidationError::InvalidFieldValue {
                field: "subject",
                value: subject,
                reason: "Subject cannot be empty".to_string(),
            });
        }

        if subject.chars().any(char::is_whitespace) {
            return Err(HardValidationError::InvalidFieldValue {
                field: "subject",
                value: subject,
                reason: "Subject must not contain whitespace".to_string(),
            });
        }

        Ok(Self(subject))
    }

    /// Get the inner string value.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Topic carrying job messages, producer to consumer.
    pub fn data_topic(&self) -> String {
        format!("{}.data", self.0)
    }

    /// Topic carrying control metrics, consumer to producer.
    pub fn metric_topic(&self) -> String {
        format!("{}.metric", self.0)
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Validated job size.
/// Must be non-zero (zero is the sentinel total) and fit a varint slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct JobTotal(u64);

impl JobTotal {
    /// Create a new JobTotal with bounds validation.
    pub fn new(total: u64) -> Result<Self, HardValidationError> {
        if total == 0 {
            return Err(HardValidationError::InvalidFieldValue {
                field: "total",
                value: "0".to_string(),
                reason: "Total 0 is reserved for sentinel messages".to_string(),
            });
        }

        if total > MAX_COUNTER {
            return Err(HardValidationError::InvalidFieldValue {
                field: "total",
                value: total.to_string(),
                reason: format!("Total must not exceed {}", MAX_COUNTER),
            });
        }

        Ok(Self(total))
    }

    /// Get the inner value.
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for JobTotal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Validated shared secret for AES-256-GCM.
/// Exactly 32 bytes, known identically to both roles.
#[derive(Clone, PartialEq, Eq)]
pub struct EncryptionKey([u8; KEY_LEN]);

impl EncryptionKey {
    /// Create a key from raw bytes, rejecting any length other than 32.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, HardValidationError> {
        let key: [u8; KEY_LEN] =
            bytes
                .try_into()
                .map_err(|_| HardValidationError::InvalidKeyLength {
                    expected: KEY_LEN,
                    actual: bytes.len(),
                })?;
        Ok(Self(key))
    }

    /// Get the raw key bytes.
    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }
}

impl fmt::Debug for EncryptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("EncryptionKey(<redacted>)")
    }
}

impl TryFrom<&str> for EncryptionKey {
    type Error = HardValidationError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::from_bytes(value.as_bytes())
    }
}
