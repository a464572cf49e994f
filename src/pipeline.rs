//! The consume → validate → route loop.
//!
//! Records are processed one at a time in arrival order. Each record is
//! acknowledged once the router is done with it, whether it was delivered
//! or dropped, so a failed send is never redelivered.

use lead_verifier_kafka::{Record, RecordSink, RecordSource};
use std::fmt;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::lead::{correlation_id, Lead};
use crate::metrics::MetricsSink;
use crate::router::{Destination, RecordRouter, RouteOutcome};

/// Exponential delay between consecutive receive errors.
#[derive(Debug, Clone)]
pub struct Backoff {
    initial: Duration,
    max: Duration,
    current: Duration,
}

impl Backoff {
    pub fn new(initial: Duration, max: Duration) -> Self {
        let max = max.max(initial);
        Self {
            initial,
            max,
            current: initial,
        }
    }

    /// Delay to wait now; doubles the following one up to the cap.
    pub fn next_delay(&mut self) -> Duration {
        let delay = self.current;
        self.current = self.current.saturating_mul(2).min(self.max);
        delay
    }

    pub fn reset(&mut self) {
        self.current = self.initial;
    }
}

impl Default for Backoff {
    fn default() -> Self {
        Self::new(Duration::from_millis(100), Duration::from_secs(5))
    }
}

/// Totals for one run of the pipeline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineStats {
    pub received: u64,
    pub verified: u64,
    pub dead_lettered: u64,
    pub dropped: u64,
    pub malformed: u64,
    pub receive_errors: u64,
}

impl PipelineStats {
    fn record(&mut self, outcome: RouteOutcome) {
        match outcome {
            RouteOutcome::Delivered(Destination::Verified) => self.verified += 1,
            RouteOutcome::Delivered(Destination::DeadLetter) => self.dead_lettered += 1,
            RouteOutcome::Dropped(_) => self.dropped += 1,
        }
    }
}

impl fmt::Display for PipelineStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "received={} verified={} dead_lettered={} dropped={} malformed={} receive_errors={}",
            self.received,
            self.verified,
            self.dead_lettered,
            self.dropped,
            self.malformed,
            self.receive_errors
        )
    }
}

pub struct Pipeline<R, S, M> {
    source: R,
    router: RecordRouter<S, M>,
    backoff: Backoff,
}

impl<R, S, M> Pipeline<R, S, M>
where
    R: RecordSource,
    S: RecordSink,
    M: MetricsSink,
{
    pub fn new(source: R, router: RecordRouter<S, M>, backoff: Backoff) -> Self {
        Self {
            source,
            router,
            backoff,
        }
    }

    /// Run until `shutdown` is cancelled.
    ///
    /// Cancellation interrupts a pending receive or backoff sleep. A record
    /// already received is routed and acknowledged before the loop exits.
    pub async fn run(&mut self, shutdown: CancellationToken) -> PipelineStats {
        let mut stats = PipelineStats::default();
        info!("Pipeline started");

        loop {
            let received = tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                received = self.source.receive() => received,
            };

            match received {
                Ok(record) => {
                    self.backoff.reset();
                    stats.received += 1;
                    self.process(&record, &mut stats).await;
                }
                Err(e) => {
                    stats.receive_errors += 1;
                    let delay = self.backoff.next_delay();
                    error!("Error reading message: {e}; retrying in {delay:?}");
                    tokio::select! {
                        biased;
                        _ = shutdown.cancelled() => break,
                        _ = tokio::time::sleep(delay) => {}
                    }
                }
            }
        }

        info!("Pipeline stopped: {stats}");
        stats
    }

    async fn process(&self, record: &Record, stats: &mut PipelineStats) {
        let correlation_id = correlation_id(&record.headers);

        let outcome = match Lead::from_record(record) {
            Ok(lead) => self.router.route(&lead, record, &correlation_id).await,
            Err(e) => {
                stats.malformed += 1;
                self.router
                    .dead_letter_malformed(record, &e, &correlation_id)
                    .await
            }
        };
        stats.record(outcome);

        if let Err(e) = self.source.acknowledge(record) {
            error!(
                "Failed to acknowledge {}/{}@{}: {e}",
                record.topic, record.partition, record.offset
            );
        }
    }

    pub fn router(&self) -> &RecordRouter<S, M> {
        &self.router
    }
}
