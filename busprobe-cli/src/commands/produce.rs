// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! `busprobe produce` command - Publish one job over the TCP broker.

use std::sync::Arc;

use busprobe_core::{ConfigLoader, ProducerDriver, TcpTransport, Transport};

pub async fn execute(config_path: &str, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    // fail fast on invalid config
    let config = ConfigLoader::load_file(config_path)?;
    tracing::info!(
        scenario = %config.scenario,
        total = %config.total,
        "Configuration validated successfully"
    );

    let transport: Arc<dyn Transport> = Arc::new(TcpTransport::connect(&config.server_url).await?);
    let producer = ProducerDriver::from_config(transport, &config)?;

    let outcome = producer.run(super::interrupt()).await?;
    super::report_outcome(outcome, json)
}
