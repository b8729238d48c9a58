// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! `busprobe local` command - Both roles in one process over an in-memory bus.

use std::sync::Arc;

use busprobe_core::{ConfigLoader, ConsumerDriver, MemoryBus, ProducerDriver, Transport};

pub async fn execute(config_path: &str, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let config = ConfigLoader::load_file(config_path)?;
    let bus: Arc<dyn Transport> = MemoryBus::new_shared();

    // the consumer must be subscribed before the first job message
    let consumer = Arc::new(ConsumerDriver::from_config(Arc::clone(&bus), &config)?);
    let subscription = consumer.subscribe().await?;
    let consumer_task = {
        let consumer = Arc::clone(&consumer);
        tokio::spawn(async move {
            if let Err(e) = consumer
                .run(subscription, std::future::pending::<()>())
                .await
            {
                tracing::error!(error = %e, "Consumer failed");
            }
        })
    };

    let producer = ProducerDriver::from_config(bus, &config)?;
    let outcome = producer.run(super::interrupt()).await;
    consumer_task.abort();

    super::report_outcome(outcome?, json)
}
