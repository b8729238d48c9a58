// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! `busprobe broker` command - Run the TCP broker.

use busprobe_core::{ConfigLoader, TcpBroker};

pub async fn execute(config_path: &str) -> Result<(), Box<dyn std::error::Error>> {
    let config = ConfigLoader::load_file(config_path)?;

    let broker = TcpBroker::bind(&config.server_url).await?;
    println!("▶ Broker listening on {}", broker.local_addr()?);

    tokio::select! {
        result = broker.run() => result?,
        _ = super::interrupt() => {
            tracing::info!("Broker shutting down");
        }
    }

    println!("✓ Broker stopped");
    Ok(())
}
