// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Busprobe CLI
//!
//! Command-line interface for the busprobe latency probe.

use clap::{Parser, Subcommand};

mod commands;

/// Busprobe - End-to-end latency probe for publish/subscribe transports
#[derive(Parser)]
#[command(name = "busprobe")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "busprobe.yaml")]
    pub config: String,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Publish one job and wait for the consumer's completion metric
    Produce {
        /// Print the run summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// Count job messages and report completed jobs
    Consume,

    /// Run the TCP broker on the configured server address
    Broker,

    /// Run producer and consumer in one process over an in-memory bus
    Local {
        /// Print the run summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// Validate the configuration file
    Validate,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt().with_env_filter(log_level).init();

    // Dispatch to command handlers
    match cli.command {
        Commands::Produce { json } => commands::produce::execute(&cli.config, json).await,
        Commands::Consume => commands::consume::execute(&cli.config).await,
        Commands::Broker => commands::broker::execute(&cli.config).await,
        Commands::Local { json } => commands::local::execute(&cli.config, json).await,
        Commands::Validate => commands::validate::execute(&cli.config).await,
    }
}
