// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! CLI command modules.

pub mod broker;
pub mod consume;
pub mod local;
pub mod produce;
pub mod validate;

use busprobe_core::{ProducerOutcome, RunSummary};

/// Resolves on Ctrl-C. Never resolves if the handler cannot be installed.
pub(crate) async fn interrupt() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
}

/// Print the outcome of a producer run and exit non-zero unless it completed.
pub(crate) fn report_outcome(
    outcome: ProducerOutcome,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    match outcome {
        ProducerOutcome::Done(summary) => {
            if json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                print_summary(&summary);
            }
            Ok(())
        }
        ProducerOutcome::TimedOut => {
            eprintln!("✗ Timed out before the consumer confirmed the job");
            std::process::exit(1);
        }
        ProducerOutcome::Aborted => {
            eprintln!("✗ Aborted");
            std::process::exit(130);
        }
    }
}

fn print_summary(summary: &RunSummary) {
    println!();
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║                     BUSPROBE RUN SUMMARY                     ║");
    println!("╚══════════════════════════════════════════════════════════════╝");
    println!("  Mode:               {}/{}", summary.kind, summary.format);
    println!("  Message size:       {} bytes", summary.message_size);
    println!(
        "  Message generation: {}",
        RunSummary::format_nanos(summary.generation_cost_ns as f64)
    );
    println!(
        "  Total duration:     {}",
        RunSummary::format_nanos(summary.total_duration_ns as f64)
    );
    println!("  Total messages:     {}", summary.messages);
    println!(
        "  Duration/message:   {}",
        RunSummary::format_nanos(summary.per_message_ns)
    );
}
