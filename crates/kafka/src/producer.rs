use crate::error::{Error, Result};
use crate::message::Record;
use crate::traits::RecordSink;
use rdkafka::message::{Header as RdkafkaHeader, OwnedHeaders};
use rdkafka::producer::{FutureProducer, FutureRecord, Producer};
use rdkafka::ClientConfig;
use std::time::Duration;

/// Configuration for a Kafka record sink
#[derive(Debug, Clone)]
pub struct ProducerConfig {
    /// Kafka brokers (comma-separated list)
    pub brokers: String,
    /// Destination topic
    pub topic: String,
    /// Upper bound on how long a single send may take, queueing included
    pub send_timeout: Duration,
}

impl Default for ProducerConfig {
    fn default() -> Self {
        Self {
            brokers: "localhost:9092".to_string(),
            topic: "".to_string(),
            send_timeout: Duration::from_secs(5),
        }
    }
}

/// Kafka-backed [`RecordSink`] writing to a single topic.
#[derive(Clone)]
pub struct KafkaSink {
    producer: FutureProducer,
    topic: String,
    send_timeout: Duration,
}

impl KafkaSink {
    pub fn new(config: ProducerConfig) -> Result<Self> {
        if config.topic.is_empty() {
            return Err(Error::InvalidConfig("topic must not be empty".to_string()));
        }
        // librdkafka reads a zero message timeout as "never expire".
        if config.send_timeout.is_zero() {
            return Err(Error::InvalidConfig(
                "send_timeout must be greater than zero".to_string(),
            ));
        }

        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", &config.brokers)
            .set(
                "message.timeout.ms",
                config.send_timeout.as_millis().to_string(),
            )
            .create()
            .map_err(|e| Error::Producer(format!("Failed to create producer: {e}")))?;

        Ok(Self {
            producer,
            topic: config.topic,
            send_timeout: config.send_timeout,
        })
    }
}

/// Rebuild the record's headers in wire order.
fn owned_headers(record: &Record) -> OwnedHeaders {
    record.headers.iter().fold(
        OwnedHeaders::new_with_capacity(record.headers.len()),
        |headers, h| {
            headers.insert(RdkafkaHeader {
                key: h.key.as_str(),
                value: h.value.as_deref(),
            })
        },
    )
}

#[async_trait::async_trait]
impl RecordSink for KafkaSink {
    fn topic(&self) -> &str {
        &self.topic
    }

    async fn send(&self, record: &Record) -> Result<()> {
        let mut out: FutureRecord<'_, [u8], [u8]> = FutureRecord::to(&self.topic);
        if !record.headers.is_empty() {
            out = out.headers(owned_headers(record));
        }
        if let Some(payload) = record.payload.as_deref() {
            out = out.payload(payload);
        }
        if let Some(key) = record.key.as_deref() {
            out = out.key(key);
        }
        if let Some(timestamp) = record.timestamp {
            out = out.timestamp(timestamp);
        }

        let (partition, offset) = self
            .producer
            .send(out, self.send_timeout)
            .await
            .map_err(|(err, _)| Error::Producer(format!("Failed to send to {}: {err}", self.topic)))?;

        tracing::debug!(
            "Forwarded record {}/{}@{} to {} ({partition}@{offset})",
            record.topic,
            record.partition,
            record.offset,
            self.topic
        );
        Ok(())
    }

    async fn flush(&self, timeout: Duration) -> Result<()> {
        let producer = self.producer.clone();
        tokio::task::spawn_blocking(move || producer.flush(timeout))
            .await
            .map_err(|e| Error::Producer(format!("Flush task failed: {e}")))?
            .map_err(Error::Kafka)
    }
}
