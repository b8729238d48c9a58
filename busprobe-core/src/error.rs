//! Custom error types for busprobe.
//!
//! This module defines explicit enum error types as per coding guidelines.
//! No `Box<dyn Error>`, no `anyhow::Result` - all errors are strongly typed.

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type for busprobe.
/// All errors are explicit variants - no catch-all or generic handling.
#[derive(Debug, Error)]
pub enum ProbeError {
    // =========================================================================
    // Configuration Errors - Fail-Fast on Invalid Config
    // =========================================================================
    #[error("Hard validation error: {0}")]
    HardValidation(#[from] HardValidationError),

    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: PathBuf },

    #[error("Configuration parse error: {message}")]
    ConfigParse { message: String },

    // =========================================================================
    // Message Errors - Recovered Locally by the Consumer
    // =========================================================================
    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),

    #[error("Crypto error: {0}")]
    Crypto(#[from] CryptoError),

    // =========================================================================
    // Driver Errors
    // =========================================================================
    #[error("Invalid state transition: {0}")]
    InvalidStateTransition(#[from] StateTransitionError),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    // =========================================================================
    // System Errors
    // =========================================================================
    #[error("IO error: {context} - {source}")]
    Io {
        context: &'static str,
        #[source]
        source: std::io::Error,
    },
}

/// Hard validation errors cause immediate process termination.
/// Used when configuration is invalid and no message may be sent.
#[derive(Debug, Error)]
pub enum HardValidationError {
    #[error("Missing required field: {field} in {context}")]
    MissingRequiredField {
        field: &'static str,
        context: String,
    },

    #[error("Invalid field value: {field} = {value} - {reason}")]
    InvalidFieldValue {
        field: &'static str,
        value: String,
        reason: String,
    },

    #[error("Invalid encryption key length: {actual} bytes (expected {expected})")]
    InvalidKeyLength { expected: usize, actual: usize },
}

/// Errors raised while encoding or decoding wire messages.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("Malformed message: {reason}")]
    Malformed { reason: String },

    #[error("Counter {field} = {value} does not fit an 8-byte varint slot")]
    CounterOverflow { field: &'static str, value: u64 },

    #[error("Failed to deserialize structured payload: {message}")]
    Deserialize { message: String },

    #[error("Failed to serialize structured payload: {message}")]
    Serialize { message: String },
}

/// AEAD errors.
#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("Invalid key length: expected {expected} bytes, got {actual}")]
    InvalidKeyLength { expected: usize, actual: usize },

    #[error("Ciphertext truncated: {len} bytes (min {min})")]
    Truncated { len: usize, min: usize },

    #[error("AES-GCM seal failed")]
    Encrypt,

    #[error("AES-GCM open failed: authentication tag mismatch")]
    Decrypt,
}

/// State transition errors for the producer state machine.
#[derive(Debug, Error)]
pub enum StateTransitionError {
    #[error("Cannot transition producer from {from} to {to}")]
    InvalidTransition {
        from: &'static str,
        to: &'static str,
    },

    #[error("Producer is in terminal state: {state}")]
    TerminalState { state: &'static str },
}

/// Publish/subscribe transport errors.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Failed to connect to {address}: {source}")]
    Connect {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Transport IO error: {context} - {source}")]
    Io {
        context: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("Frame size exceeds maximum: {size} > {max}")]
    FrameTooLarge { size: usize, max: usize },

    #[error("Invalid frame: {reason}")]
    InvalidFrame { reason: String },

    #[error("Transport connection closed")]
    Closed,
}

/// Result type alias using ProbeError.
pub type ProbeResult<T> = Result<T, ProbeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hard_validation_error_display() {
        let err = HardValidationError::MissingRequiredField {
            field: "filename",
            context: "scenario 'file'".to_string(),
        };
        assert!(err.to_string().contains("filename"));
        assert!(err.to_string().contains("file"));
    }

    #[test]
    fn test_error_chain() {
        let crypto_err = CryptoError::InvalidKeyLength {
            expected: 32,
            actual: 16,
        };
        let probe_err: ProbeError = crypto_err.into();
        assert!(matches!(probe_err, ProbeError::Crypto(_)));
        assert!(probe_err.to_string().contains("16"));
    }
}
