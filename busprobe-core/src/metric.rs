// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Control-plane timestamp records exchanged between producer and consumer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CodecError;

/// Label of a metric event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Job {
    /// Producer start marker. Kept locally, never transmitted.
    #[serde(rename = "base")]
    Base,
    /// Consumer completion signal.
    #[serde(rename = "received")]
    Received,
}

/// `{"Job", "Time", "Count"}` control message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metric {
    #[serde(rename = "Job")]
    pub job: Job,
    #[serde(rename = "Time")]
    pub time: DateTime<Utc>,
    #[serde(rename = "Count")]
    pub count: u64,
}

impl Metric {
    /// Producer start marker for a job of `total` messages.
    pub fn base(total: u64) -> Self {
        Self {
            job: Job::Base,
            time: Utc::now(),
            count: total,
        }
    }

    /// Completion signal for a job of `total` messages.
    pub fn received(total: u64) -> Self {
        Self {
            job: Job::Received,
            time: Utc::now(),
            count: total,
        }
    }

    /// True if this is the completion signal for a job of `total` messages.
    pub fn completes(&self, total: u64) -> bool {
        self.job == Job::Received && self.count == total
    }

    pub fn to_json(&self) -> Result<Vec<u8>, CodecError> {
        serde_json::to_vec(self).map_err(|e| CodecError::Serialize {
            message: e.to_string(),
        })
    }

    pub fn from_json(bytes: &[u8]) -> Result<Self, CodecError> {
        serde_json::from_slice(bytes).map_err(|e| CodecError::Deserialize {
            message: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_field_names() {
        let metric = Metric::received(1000);
        let json: serde_json::Value = serde_json::from_slice(&metric.to_json().unwrap()).unwrap();
        assert_eq!(json["Job"], "received");
        assert_eq!(json["Count"], 1000);
        assert!(json["Time"].is_string());
    }

    #[test]
    fn test_parse_rfc3339_time() {
        let metric =
            Metric::from_json(br#"{"Job":"received","Time":"2024-03-01T12:00:00.123456789Z","Count":5}"#)
                .unwrap();
        assert!(metric.completes(5));
        assert!(!metric.completes(6));
        assert_eq!(metric.time.timestamp_subsec_nanos(), 123_456_789);
    }

    #[test]
    fn test_base_never_completes() {
        assert!(!Metric::base(5).completes(5));
    }

    #[test]
    fn test_rejects_unknown_job() {
        assert!(Metric::from_json(br#"{"Job":"other","Time":"2024-03-01T12:00:00Z","Count":5}"#).is_err());
        assert!(Metric::from_json(b"garbage").is_err());
    }
}
