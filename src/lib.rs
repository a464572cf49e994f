//! Lead Verifier Library
//!
//! A single-stage Kafka stream processor that checks the `email` field of
//! each lead and routes the record, unmodified, to a verified topic or to
//! the dead-letter topic.
//!
//! # Features
//!
//! - Validation: syntactic `local@domain.tld` check, no network lookups
//! - Routing: verified leads go to the verified topic, invalid or undecodable
//!   ones to `lead.dlq`
//! - Metrics: `verifier_verified_total` and `verifier_invalid_total` served
//!   at `/metrics` in Prometheus text format
//! - Tracing: every routed lead is logged at trace level with its
//!   correlation id
//!
//! # CLI Usage
//!
//! ```bash
//! # Defaults match a docker-compose setup with a broker named "kafka"
//! RUST_LOG=lead_verifier=trace lead-verifier
//!
//! # Explicit settings
//! lead-verifier --brokers localhost:9092 --raw-topic lead.raw \
//!   --verified-topic lead.verified --metrics-addr 127.0.0.1:9090
//! ```

pub mod config;
pub mod lead;
pub mod metrics;
pub mod pipeline;
pub mod router;
pub mod validate;

pub use config::{Config, DLQ_TOPIC};
pub use lead::{correlation_id, DecodeError, Lead, CORRELATION_ID_HEADER};
pub use metrics::{LeadMetrics, MetricsSink};
pub use pipeline::{Backoff, Pipeline, PipelineStats};
pub use router::{Destination, RecordRouter, RouteOutcome};
pub use validate::{validate_email, Validation};

// Re-export the broker adapter crate for convenience
pub use lead_verifier_kafka as kafka;
