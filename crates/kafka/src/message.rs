//! Owned record types.
//!
//! A [`Record`] is the unit handed between the source, the router and the
//! sinks. It carries the payload, key and headers exactly as they were read
//! from the broker, plus the positional metadata needed to acknowledge it.

use rdkafka::message::{Headers, Message as RdkafkaMessage};

/// A single message header. Keys may repeat within a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub key: String,
    /// `None` when the producer set the key without a value.
    pub value: Option<Vec<u8>>,
}

/// A Kafka record with its broker-assigned position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// Kafka topic the record was read from
    pub topic: String,
    /// Kafka partition
    pub partition: i32,
    /// Kafka offset within the partition
    pub offset: i64,
    /// Message key (if any)
    pub key: Option<Vec<u8>>,
    /// Raw payload bytes, `None` for tombstones
    pub payload: Option<Vec<u8>>,
    /// Headers in wire order
    pub headers: Vec<Header>,
    /// Message timestamp (milliseconds since epoch)
    pub timestamp: Option<i64>,
}

impl Record {
    /// Build a record that has not been read from a broker yet.
    ///
    /// Position fields are zeroed; mostly useful for producers and tests.
    pub fn new(payload: impl Into<Vec<u8>>) -> Self {
        Self {
            topic: String::new(),
            partition: 0,
            offset: 0,
            key: None,
            payload: Some(payload.into()),
            headers: Vec::new(),
            timestamp: None,
        }
    }

    pub fn with_key(mut self, key: impl Into<Vec<u8>>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<Vec<u8>>) -> Self {
        self.headers.push(Header {
            key: key.into(),
            value: Some(value.into()),
        });
        self
    }

    pub fn with_position(mut self, topic: impl Into<String>, partition: i32, offset: i64) -> Self {
        self.topic = topic.into();
        self.partition = partition;
        self.offset = offset;
        self
    }

    /// Copy an rdkafka message into an owned record.
    pub fn from_kafka<M: RdkafkaMessage>(msg: &M) -> Self {
        let headers: Vec<Header> = msg
            .headers()
            .map(|headers| {
                headers
                    .iter()
                    .map(|h| Header {
                        key: h.key.to_string(),
                        value: h.value.map(|v| v.to_vec()),
                    })
                    .collect()
            })
            .unwrap_or_default();

        Self {
            topic: msg.topic().to_string(),
            partition: msg.partition(),
            offset: msg.offset(),
            key: msg.key().map(|k| k.to_vec()),
            payload: msg.payload().map(|p| p.to_vec()),
            headers,
            timestamp: msg.timestamp().to_millis(),
        }
    }
}
