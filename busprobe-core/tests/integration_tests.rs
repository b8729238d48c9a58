// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! End-to-end integration tests for busprobe.
//!
//! These tests run a producer and a consumer against each other, from
//! configuration to the final run summary.

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use busprobe_core::{
    Config, ConfigLoader, ConsumerDriver, MemoryBus, ProducerDriver, ProducerOutcome, ProbeError,
    RunSummary, Scenario, TcpBroker, TcpTransport, Transport,
};
use tempfile::NamedTempFile;
use tokio::task::JoinHandle;

const KEY: &str = "0123456789abcdef0123456789abcdef";

fn config(yaml: &str) -> Config {
    ConfigLoader::load_string(yaml).expect("config should validate")
}

/// Subscribe a consumer on `transport` and run it in the background.
async fn spawn_consumer(transport: Arc<dyn Transport>, config: &Config) -> JoinHandle<()> {
    let consumer = Arc::new(ConsumerDriver::from_config(transport, config).unwrap());
    let subscription = consumer.subscribe().await.unwrap();
    tokio::spawn(async move {
        consumer
            .run(subscription, std::future::pending::<()>())
            .await
            .unwrap();
    })
}

fn expect_done(outcome: ProducerOutcome) -> RunSummary {
    match outcome {
        ProducerOutcome::Done(summary) => summary,
        other => panic!("expected Done, got {:?}", other),
    }
}

#[tokio::test]
async fn test_emptybytes_job_over_memory_bus() {
    let config = config(&format!(
        "total: 1000\nscenario: emptybytes\nnum_bytes: 16000\ntimeout_ms: 30000\nencryption_key: \"{}\"\n",
        KEY
    ));
    let bus: Arc<dyn Transport> = MemoryBus::new_shared();

    let consumer = spawn_consumer(Arc::clone(&bus), &config).await;
    let producer = ProducerDriver::from_config(Arc::clone(&bus), &config).unwrap();
    let summary = expect_done(producer.run(std::future::pending::<()>()).await.unwrap());

    assert_eq!(summary.messages, 1000);
    assert!(summary.total_duration_ns >= 0);
    assert_eq!(
        summary.per_message_ns,
        summary.total_duration_ns as f64 / 1000.0
    );
    assert_eq!(summary.message_size, 8 + 16 + 16000);
    assert_eq!(summary.kind, "byte");
    assert_eq!(summary.format, "byte");

    consumer.abort();
}

#[tokio::test]
async fn test_encrypted_json_job_over_memory_bus() {
    let config = config(&format!(
        "total: 200\nscenario: json.encrypted\nencryption_key: \"{}\"\n",
        KEY
    ));
    let bus: Arc<dyn Transport> = MemoryBus::new_shared();

    let consumer = spawn_consumer(Arc::clone(&bus), &config).await;
    let producer = ProducerDriver::from_config(Arc::clone(&bus), &config).unwrap();
    let summary = expect_done(producer.run(std::future::pending::<()>()).await.unwrap());

    assert_eq!(summary.messages, 200);
    assert_eq!(summary.kind, "json");
    assert_eq!(summary.format, "encr");

    consumer.abort();
}

#[tokio::test]
async fn test_consumer_with_other_key_never_completes() {
    let producer_config = config(&format!(
        "total: 50\nscenario: json.encrypted\ntimeout_ms: 300\nencryption_key: \"{}\"\n",
        KEY
    ));
    let consumer_config = config(
        "total: 50\nscenario: json.encrypted\nencryption_key: \"ffffffffffffffffffffffffffffffff\"\n",
    );
    let bus: Arc<dyn Transport> = MemoryBus::new_shared();

    let consumer = spawn_consumer(Arc::clone(&bus), &consumer_config).await;
    let producer = ProducerDriver::from_config(Arc::clone(&bus), &producer_config).unwrap();
    let outcome = producer.run(std::future::pending::<()>()).await.unwrap();

    assert!(matches!(outcome, ProducerOutcome::TimedOut));
    consumer.abort();
}

#[tokio::test]
async fn test_file_job_over_tcp_broker() {
    let mut payload = NamedTempFile::new().unwrap();
    payload.write_all(&[7u8; 4096]).unwrap();

    let broker = TcpBroker::bind("127.0.0.1:0").await.unwrap();
    let address = broker.local_addr().unwrap().to_string();
    let broker = tokio::spawn(broker.run());

    let config = config(&format!(
        "subject: tcp-probe\ntotal: 500\nserver_url: \"{}\"\nscenario: file.encrypted\nfilename: {}\ntimeout_ms: 10000\nencryption_key: \"{}\"\n",
        address,
        payload.path().display(),
        KEY
    ));

    let consumer_side: Arc<dyn Transport> =
        Arc::new(TcpTransport::connect(&config.server_url).await.unwrap());
    let consumer = spawn_consumer(consumer_side, &config).await;
    // let the broker register the consumer's subscription
    tokio::time::sleep(Duration::from_millis(100)).await;

    let producer_side: Arc<dyn Transport> =
        Arc::new(TcpTransport::connect(&config.server_url).await.unwrap());
    let producer = ProducerDriver::from_config(producer_side, &config).unwrap();
    let summary = expect_done(producer.run(std::future::pending::<()>()).await.unwrap());

    assert_eq!(summary.messages, 500);
    assert_eq!(summary.kind, "byte");
    assert_eq!(summary.format, "encr");

    consumer.abort();
    broker.abort();
}

#[tokio::test]
async fn test_interrupt_aborts_run() {
    let config = config(&format!("total: 10\nencryption_key: \"{}\"\n", KEY));
    let bus: Arc<dyn Transport> = MemoryBus::new_shared();

    let producer = ProducerDriver::from_config(bus, &config).unwrap();
    let outcome = producer.run(std::future::ready(())).await.unwrap();
    assert!(matches!(outcome, ProducerOutcome::Aborted));
}

#[test]
fn test_config_file_loading() {
    let mut file = NamedTempFile::new().unwrap();
    write!(
        file,
        "subject: filetest\ntotal: 42\nscenario: json\nencryption_key: \"{}\"\n",
        KEY
    )
    .unwrap();

    let config = ConfigLoader::load_file(file.path()).unwrap();
    assert_eq!(config.subject.as_str(), "filetest");
    assert_eq!(config.total.value(), 42);
    assert_eq!(config.scenario, Scenario::Json);
}

#[test]
fn test_config_file_missing() {
    let dir = tempfile::tempdir().unwrap();
    let result = ConfigLoader::load_file(dir.path().join("busprobe.yaml"));
    assert!(matches!(result, Err(ProbeError::ConfigNotFound { .. })));
}
