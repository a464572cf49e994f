//! Process configuration.
//!
//! Every setting can be passed as a flag or through its environment variable.
//! The dead-letter topic is fixed and not configurable.

pub mod duration;

use clap::Parser;
use lead_verifier_kafka::{ConsumerConfig, ProducerConfig};
use std::net::SocketAddr;
use std::time::Duration;

pub use duration::parse_duration;

use crate::pipeline::Backoff;

/// Topic receiving records that fail validation or decoding.
pub const DLQ_TOPIC: &str = "lead.dlq";

/// Configuration for the verifier stage.
#[derive(Debug, Clone, Parser)]
#[command(name = "lead-verifier")]
#[command(about = "Validate lead emails and route records to the verified or dead-letter topic")]
pub struct Config {
    /// Kafka brokers (comma-separated or multiple --brokers)
    #[clap(long, env = "KAFKA_BROKER", value_delimiter = ',', default_value = "kafka:9092")]
    pub brokers: Vec<String>,
    /// Topic to consume raw leads from
    #[clap(long, env = "KAFKA_RAW_TOPIC", default_value = "lead.raw")]
    pub raw_topic: String,
    /// Consumer group ID
    #[clap(long, env = "KAFKA_GROUP_ID", default_value = "verifier-group")]
    pub group_id: String,
    /// Topic receiving verified leads
    #[clap(long, env = "KAFKA_VERIFIED_TOPIC", default_value = "lead.verified")]
    pub verified_topic: String,
    /// Address the metrics endpoint listens on
    #[clap(long, env = "METRICS_ADDR", default_value = "0.0.0.0:9090")]
    pub metrics_addr: SocketAddr,
    /// Session timeout in milliseconds
    #[clap(long, env = "KAFKA_SESSION_TIMEOUT_MS", default_value = "6000")]
    pub session_timeout_ms: String,
    /// Where to start when the group has no committed offset ("earliest" or "latest")
    #[clap(long, env = "KAFKA_AUTO_OFFSET_RESET", default_value = "earliest")]
    pub auto_offset_reset: String,
    /// Upper bound for a single outbound send
    #[clap(long, env = "KAFKA_SEND_TIMEOUT", default_value = "5s", value_parser = parse_duration)]
    pub send_timeout: Duration,
    /// Delay after the first consecutive receive error
    #[clap(long, env = "RECEIVE_BACKOFF_INITIAL", default_value = "100ms", value_parser = parse_duration)]
    pub receive_backoff_initial: Duration,
    /// Cap for the receive error delay
    #[clap(long, env = "RECEIVE_BACKOFF_MAX", default_value = "5s", value_parser = parse_duration)]
    pub receive_backoff_max: Duration,
    /// How long to wait for outbound writers to drain on shutdown
    #[clap(long, env = "SHUTDOWN_FLUSH_TIMEOUT", default_value = "10s", value_parser = parse_duration)]
    pub shutdown_flush_timeout: Duration,
}

impl Config {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.brokers.iter().all(|b| b.trim().is_empty()) {
            anyhow::bail!("At least one broker must be configured");
        }
        if self.raw_topic.is_empty() {
            anyhow::bail!("Raw topic must not be empty");
        }
        if self.verified_topic.is_empty() {
            anyhow::bail!("Verified topic must not be empty");
        }
        if self.group_id.is_empty() {
            anyhow::bail!("Consumer group ID must not be empty");
        }
        if self.raw_topic == DLQ_TOPIC || self.verified_topic == DLQ_TOPIC {
            anyhow::bail!("Topic {DLQ_TOPIC} is reserved for dead letters");
        }
        if self.raw_topic == self.verified_topic {
            anyhow::bail!(
                "Raw and verified topics must differ (both are {})",
                self.raw_topic
            );
        }
        if self.send_timeout.is_zero() {
            anyhow::bail!("Send timeout must be greater than zero");
        }
        if self.receive_backoff_initial.is_zero() {
            anyhow::bail!("Receive backoff must be greater than zero");
        }
        if self.receive_backoff_max < self.receive_backoff_initial {
            anyhow::bail!(
                "Receive backoff cap ({:?}) is below the initial delay ({:?})",
                self.receive_backoff_max,
                self.receive_backoff_initial
            );
        }
        Ok(())
    }

    fn broker_list(&self) -> String {
        self.brokers
            .iter()
            .map(|b| b.trim())
            .filter(|b| !b.is_empty())
            .collect::<Vec<_>>()
            .join(",")
    }

    pub fn consumer_config(&self) -> ConsumerConfig {
        ConsumerConfig {
            brokers: self.broker_list(),
            group_id: self.group_id.clone(),
            topic: self.raw_topic.clone(),
            auto_offset_reset: self.auto_offset_reset.clone(),
            session_timeout_ms: self.session_timeout_ms.clone(),
        }
    }

    pub fn verified_producer_config(&self) -> ProducerConfig {
        ProducerConfig {
            brokers: self.broker_list(),
            topic: self.verified_topic.clone(),
            send_timeout: self.send_timeout,
        }
    }

    pub fn dlq_producer_config(&self) -> ProducerConfig {
        ProducerConfig {
            brokers: self.broker_list(),
            topic: DLQ_TOPIC.to_string(),
            send_timeout: self.send_timeout,
        }
    }

    pub fn backoff(&self) -> Backoff {
        Backoff::new(self.receive_backoff_initial, self.receive_backoff_max)
    }
}
