//! Per-record routing decision.

use lead_verifier_kafka::{Record, RecordSink};
use std::time::Duration;
use tracing::{error, trace, warn};

use crate::lead::{DecodeError, Lead};
use crate::metrics::MetricsSink;
use crate::validate::Validation;

/// Outbound destination of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Destination {
    Verified,
    DeadLetter,
}

/// What happened to a routed record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteOutcome {
    /// The sink accepted the record and the matching counter was incremented.
    Delivered(Destination),
    /// The send failed; the record is gone and no counter changed.
    Dropped(Destination),
}

impl RouteOutcome {
    pub fn destination(&self) -> Destination {
        match self {
            RouteOutcome::Delivered(d) | RouteOutcome::Dropped(d) => *d,
        }
    }

    pub fn is_delivered(&self) -> bool {
        matches!(self, RouteOutcome::Delivered(_))
    }
}

/// Sends each record to the verified or dead-letter sink and keeps the
/// counters in step with successful deliveries.
///
/// Records are forwarded as received. Send failures are logged and the
/// record is dropped; nothing is retried.
pub struct RecordRouter<S, M> {
    verified: S,
    dead_letter: S,
    metrics: M,
}

impl<S: RecordSink, M: MetricsSink> RecordRouter<S, M> {
    pub fn new(verified: S, dead_letter: S, metrics: M) -> Self {
        Self {
            verified,
            dead_letter,
            metrics,
        }
    }

    pub async fn route(&self, lead: &Lead, record: &Record, correlation_id: &str) -> RouteOutcome {
        match Validation::of(lead.email()) {
            Validation::Verified => match self.verified.send(record).await {
                Ok(()) => {
                    self.metrics.increment_verified();
                    trace!("Verified lead: {lead}, correlationId: {correlation_id}");
                    RouteOutcome::Delivered(Destination::Verified)
                }
                Err(e) => {
                    error!(
                        "Error writing message to {}: {e}, correlationId: {correlation_id}",
                        self.verified.topic()
                    );
                    RouteOutcome::Dropped(Destination::Verified)
                }
            },
            Validation::Invalid => {
                trace!("Invalid lead: {lead}, correlationId: {correlation_id}");
                self.dead_letter(record, correlation_id).await
            }
        }
    }

    /// Route a record whose payload could not be decoded into a lead.
    pub async fn dead_letter_malformed(
        &self,
        record: &Record,
        err: &DecodeError,
        correlation_id: &str,
    ) -> RouteOutcome {
        warn!(
            "Malformed lead at {}/{}@{}: {err}, correlationId: {correlation_id}",
            record.topic, record.partition, record.offset
        );
        self.dead_letter(record, correlation_id).await
    }

    async fn dead_letter(&self, record: &Record, correlation_id: &str) -> RouteOutcome {
        match self.dead_letter.send(record).await {
            Ok(()) => {
                self.metrics.increment_invalid();
                RouteOutcome::Delivered(Destination::DeadLetter)
            }
            Err(e) => {
                error!(
                    "Error writing to DLQ {}: {e}, correlationId: {correlation_id}",
                    self.dead_letter.topic()
                );
                RouteOutcome::Dropped(Destination::DeadLetter)
            }
        }
    }

    /// Best-effort drain of both sinks. They drain concurrently, so the whole
    /// call is bounded by `timeout`. Errors are logged.
    pub async fn flush(&self, timeout: Duration) {
        let (verified, dead_letter) = tokio::join!(
            self.verified.flush(timeout),
            self.dead_letter.flush(timeout)
        );
        for (sink, result) in [(&self.verified, verified), (&self.dead_letter, dead_letter)] {
            if let Err(e) = result {
                error!("Failed to flush {}: {e}", sink.topic());
            }
        }
    }

    pub fn metrics(&self) -> &M {
        &self.metrics
    }
}
