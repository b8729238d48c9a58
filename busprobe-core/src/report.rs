// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Run summary for a completed job.
//!
//! Durations are stored in nanoseconds. The end-to-end duration is signed:
//! it is the difference of two wall clocks and may go negative under skew.

use std::time::Instant;

use chrono::TimeDelta;
use serde::Serialize;

use crate::error::ProbeResult;
use crate::generator::Generator;

/// Observational figures for one `Done` run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    /// Start marker to completion metric, in nanoseconds
    pub total_duration_ns: i64,
    /// Number of messages in the job
    pub messages: u64,
    /// `total_duration_ns / messages`
    pub per_message_ns: f64,
    /// Time to generate one representative message
    pub generation_cost_ns: u64,
    /// Byte length of the representative message, header included
    pub message_size: usize,
    /// Kind tag of the representative message
    pub kind: String,
    /// Format tag of the representative message
    pub format: String,
}

impl RunSummary {
    /// Build the summary, generating one message with `generate(1, 1)`
    /// outside of the timed window.
    pub fn measure(
        generator: &dyn Generator,
        duration: TimeDelta,
        messages: u64,
    ) -> ProbeResult<Self> {
        let start = Instant::now();
        let sample = generator.generate(1, 1)?;
        let generation_cost_ns = start.elapsed().as_nanos() as u64;

        Ok(Self::new(
            duration,
            messages,
            generation_cost_ns,
            sample.len(),
            sample.kind()?.as_str().into_owned(),
            sample.format()?.as_str().into_owned(),
        ))
    }

    pub fn new(
        duration: TimeDelta,
        messages: u64,
        generation_cost_ns: u64,
        message_size: usize,
        kind: String,
        format: String,
    ) -> Self {
        let total_duration_ns = duration.num_nanoseconds().unwrap_or(i64::MAX);
        let per_message_ns = if messages == 0 {
            0.0
        } else {
            total_duration_ns as f64 / messages as f64
        };

        Self {
            total_duration_ns,
            messages,
            per_message_ns,
            generation_cost_ns,
            message_size,
            kind,
            format,
        }
    }

    /// Human-readable form of a nanosecond count (auto-selects ns/μs/ms/s).
    pub fn format_nanos(ns: f64) -> String {
        let abs = ns.abs();
        if abs < 1_000.0 {
            format!("{:.0}ns", ns)
        } else if abs < 1_000_000.0 {
            format!("{:.2}μs", ns / 1_000.0)
        } else if abs < 1_000_000_000.0 {
            format!("{:.2}ms", ns / 1_000_000.0)
        } else {
            format!("{:.2}s", ns / 1_000_000_000.0)
        }
    }

    /// Emit the summary through `tracing`.
    pub fn log(&self) {
        tracing::info!(kind = %self.kind, format = %self.format, "Mode");
        tracing::info!(bytes = self.message_size, "Message size");
        tracing::info!(
            "Message generation: {}",
            Self::format_nanos(self.generation_cost_ns as f64)
        );
        tracing::info!(
            "Total duration: {}",
            Self::format_nanos(self.total_duration_ns as f64)
        );
        tracing::info!(messages = self.messages, "Total messages");
        tracing::info!(
            "Duration/message: {}",
            Self::format_nanos(self.per_message_ns)
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::Tag;
    use crate::generator::{BaseBytes, Framed};

    #[test]
    fn test_measure_reads_representative_message() {
        let generator = Framed::new(Tag::BYTE, Tag::BYTE, BaseBytes::new(vec![0u8; 100]));
        let summary =
            RunSummary::measure(&generator, TimeDelta::milliseconds(10), 1000).unwrap();

        assert_eq!(summary.messages, 1000);
        assert_eq!(summary.total_duration_ns, 10_000_000);
        assert_eq!(summary.per_message_ns, 10_000.0);
        // header + counters + data
        assert_eq!(summary.message_size, 8 + 16 + 100);
        assert_eq!(summary.kind, "byte");
        assert_eq!(summary.format, "byte");
    }

    #[test]
    fn test_negative_duration_is_kept() {
        let summary = RunSummary::new(
            TimeDelta::microseconds(-5),
            5,
            0,
            24,
            "byte".to_string(),
            "byte".to_string(),
        );
        assert_eq!(summary.total_duration_ns, -5_000);
        assert_eq!(summary.per_message_ns, -1_000.0);
    }

    #[test]
    fn test_format_nanos() {
        assert_eq!(RunSummary::format_nanos(500.0), "500ns");
        assert_eq!(RunSummary::format_nanos(1_500.0), "1.50μs");
        assert_eq!(RunSummary::format_nanos(2_500_000.0), "2.50ms");
        assert_eq!(RunSummary::format_nanos(3_000_000_000.0), "3.00s");
    }

    #[test]
    fn test_serializes_to_json() {
        let summary = RunSummary::new(
            TimeDelta::seconds(1),
            2,
            7,
            24,
            "json".to_string(),
            "encr".to_string(),
        );
        let value = serde_json::to_value(&summary).unwrap();
        assert_eq!(value["total_duration_ns"], 1_000_000_000i64);
        assert_eq!(value["messages"], 2);
        assert_eq!(value["kind"], "json");
        assert_eq!(value["format"], "encr");
    }
}
