//! Kafka adapters for `lead-verifier`.
//!
//! Features:
//!
//! - Record Source: a consumer-group member that yields owned [`Record`]s and
//!   stores offsets only once a record has been acknowledged
//! - Record Sink: a producer bound to one topic that forwards records with
//!   payload, key and headers untouched
//! - Traits: [`RecordSource`] and [`RecordSink`] decouple the pipeline from
//!   rdkafka so it can run against in-memory doubles

/// Consumer side, wraps an rdkafka `StreamConsumer`
pub mod consumer;
pub mod error;
pub mod message;

/// Producer side, wraps an rdkafka `FutureProducer`
pub mod producer;
pub mod traits;

// Re-export main types for easy access
pub use consumer::{ConsumerConfig, KafkaSource};
pub use error::{Error, Result};
pub use message::{Header, Record};
pub use producer::{KafkaSink, ProducerConfig};
pub use traits::{RecordSink, RecordSource};
