//! Busprobe Core Library
//!
//! End-to-end latency probe for publish/subscribe transports.
//! Provides the wire codec, message generators, AES-GCM sealing,
//! producer and consumer drivers, and the transports they run over.

pub mod codec;
pub mod config;
pub mod consumer;
pub mod crypto;
pub mod error;
pub mod generator;
pub mod message;
pub mod metric;
pub mod producer;
pub mod report;
pub mod scenario;
pub mod transport;
pub mod types;

// Re-export commonly used types
pub use codec::{RawMessage, Tag};
pub use config::{Config, ConfigLoader};
pub use consumer::{ConsumerDriver, JobTracker, Observation};
pub use error::{
    CodecError, CryptoError, HardValidationError, ProbeError, ProbeResult, TransportError,
};
pub use generator::Generator;
pub use metric::{Job, Metric};
pub use producer::{ProducerDriver, ProducerOutcome, ProducerState};
pub use report::RunSummary;
pub use scenario::Scenario;
pub use transport::{MemoryBus, Subscription, TcpBroker, TcpTransport, Transport};
pub use types::{EncryptionKey, JobTotal, Subject};
