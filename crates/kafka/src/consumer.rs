use crate::error::{Error, Result};
use crate::message::Record;
use crate::traits::RecordSource;
use rdkafka::config::ClientConfig;
use rdkafka::consumer::{Consumer as RdkafkaConsumer, StreamConsumer as RdkafkaStreamConsumer};

/// Configuration for the Kafka record source
#[derive(Debug, Clone)]
pub struct ConsumerConfig {
    /// Kafka brokers (comma-separated list)
    pub brokers: String,
    /// Consumer group ID
    pub group_id: String,
    /// Topic to consume from
    pub topic: String,
    /// Auto offset reset strategy ("earliest" or "latest")
    ///
    /// Only applies when the consumer group has no committed offset yet.
    pub auto_offset_reset: String,
    /// Session timeout in milliseconds
    pub session_timeout_ms: String,
}

impl Default for ConsumerConfig {
    fn default() -> Self {
        Self {
            brokers: "localhost:9092".to_string(),
            group_id: "verifier-group".to_string(),
            topic: "".to_string(),
            auto_offset_reset: "earliest".to_string(),
            session_timeout_ms: "6000".to_string(),
        }
    }
}

impl ConsumerConfig {
    fn validate(&self) -> Result<()> {
        if self.brokers.trim().is_empty() {
            return Err(Error::InvalidConfig("brokers must not be empty".to_string()));
        }
        if self.topic.is_empty() {
            return Err(Error::InvalidConfig("topic must not be empty".to_string()));
        }
        if self.group_id.is_empty() {
            return Err(Error::InvalidConfig("group_id must not be empty".to_string()));
        }
        Ok(())
    }
}

/// Kafka-backed [`RecordSource`].
///
/// Offsets are committed by librdkafka's auto-commit timer, but only for
/// positions explicitly stored through [`RecordSource::acknowledge`]. A
/// record that was received but never acknowledged is redelivered after a
/// rebalance or restart.
pub struct KafkaSource {
    consumer: RdkafkaStreamConsumer,
}

impl KafkaSource {
    /// Create a consumer and subscribe it to the configured topic
    pub fn new(config: ConsumerConfig) -> Result<Self> {
        config.validate()?;

        let consumer: RdkafkaStreamConsumer = ClientConfig::new()
            .set("bootstrap.servers", &config.brokers)
            .set("group.id", &config.group_id)
            .set("enable.auto.commit", "true")
            .set("enable.auto.offset.store", "false")
            .set("auto.offset.reset", &config.auto_offset_reset)
            .set("session.timeout.ms", &config.session_timeout_ms)
            .set("enable.partition.eof", "false")
            .create()
            .map_err(|e| Error::Consumer(format!("Failed to create consumer: {e}")))?;

        consumer
            .subscribe(&[&config.topic])
            .map_err(|e| Error::Consumer(format!("Failed to subscribe to topic: {e}")))?;

        tracing::debug!(
            "Subscribed to topic {} as group {}",
            config.topic,
            config.group_id
        );

        Ok(Self { consumer })
    }
}

#[async_trait::async_trait]
impl RecordSource for KafkaSource {
    async fn receive(&self) -> Result<Record> {
        let msg = self
            .consumer
            .recv()
            .await
            .map_err(|e| Error::Consumer(format!("Error receiving message: {e}")))?;
        Ok(Record::from_kafka(&msg))
    }

    fn acknowledge(&self, record: &Record) -> Result<()> {
        // The stored offset is the next one to read, hence the +1.
        self.consumer
            .store_offset(&record.topic, record.partition, record.offset + 1)
            .map_err(|e| Error::Consumer(format!("Failed to store offset: {e}")))
    }
}
