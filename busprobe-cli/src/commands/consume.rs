// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! `busprobe consume` command - Count job messages until interrupted.

use std::sync::Arc;

use busprobe_core::{ConfigLoader, ConsumerDriver, TcpTransport, Transport};

pub async fn execute(config_path: &str) -> Result<(), Box<dyn std::error::Error>> {
    let config = ConfigLoader::load_file(config_path)?;

    let transport: Arc<dyn Transport> = Arc::new(TcpTransport::connect(&config.server_url).await?);
    let consumer = ConsumerDriver::from_config(transport, &config)?;
    let subscription = consumer.subscribe().await?;

    println!("▶ Consuming on {} (Ctrl-C to stop)", config.subject.data_topic());
    consumer.run(subscription, super::interrupt()).await?;
    println!("✓ Consumer stopped");
    Ok(())
}
