// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! `busprobe validate` command - Validate configuration file.

use busprobe_core::ConfigLoader;

pub async fn execute(file: &str) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!(file = %file, "Validating configuration");

    match ConfigLoader::load_file(file) {
        Ok(config) => {
            println!("✓ Configuration is valid");
            println!();
            println!("  Subject:        {}", config.subject);
            println!("    data topic:   {}", config.subject.data_topic());
            println!("    metric topic: {}", config.subject.metric_topic());
            println!("  Total:          {}", config.total);
            println!("  Server:         {}", config.server_url);
            println!("  Timeout:        {}ms", config.timeout.as_millis());
            println!("  Scenario:       {}", config.scenario);
            if let Some(filename) = &config.filename {
                println!("  File:           {}", filename.display());
            } else {
                println!("  Num bytes:      {}", config.num_bytes);
            }
            Ok(())
        }
        Err(e) => {
            eprintln!("✗ Configuration validation failed:");
            eprintln!("  {}", e);
            std::process::exit(1);
        }
    }
}
