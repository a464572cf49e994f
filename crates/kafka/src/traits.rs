//! Source and sink trait definitions.
//!
//! The pipeline only talks to the broker through these traits, so it can be
//! driven by the rdkafka adapters in production and by in-memory doubles in
//! tests.

use std::time::Duration;

use crate::error::Result;
use crate::message::Record;

/// Inbound side of the pipeline.
#[async_trait::async_trait]
pub trait RecordSource: Send + Sync {
    /// Wait for the next record.
    ///
    /// Implementations must be cancel-safe: dropping the returned future
    /// before it completes must not lose a record.
    async fn receive(&self) -> Result<Record>;

    /// Mark the record as processed so its position is committed.
    fn acknowledge(&self, record: &Record) -> Result<()>;
}

/// Outbound side of the pipeline, bound to a single destination topic.
#[async_trait::async_trait]
pub trait RecordSink: Send + Sync {
    /// Destination topic name, used for logging.
    fn topic(&self) -> &str;

    /// Forward the record unmodified.
    async fn send(&self, record: &Record) -> Result<()>;

    /// Wait for in-flight sends to complete.
    async fn flush(&self, _timeout: Duration) -> Result<()> {
        Ok(())
    }
}
