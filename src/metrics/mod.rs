//! Routing counters.
//!
//! The router only sees the [`MetricsSink`] trait. In production it gets a
//! [`LeadMetrics`], whose counters live in a Prometheus recorder owned by
//! the process and rendered by the [`server`] endpoint. The recorder is
//! never installed as the global `metrics` recorder.

pub mod server;

use metrics::{counter, describe_counter, Counter};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

pub const VERIFIED_TOTAL: &str = "verifier_verified_total";
pub const INVALID_TOTAL: &str = "verifier_invalid_total";

/// Destination for routing counters.
///
/// Implementations must tolerate concurrent increments and reads.
pub trait MetricsSink: Send + Sync {
    fn increment_verified(&self);
    fn increment_invalid(&self);
}

/// Prometheus-backed counters for the verifier.
#[derive(Clone)]
pub struct LeadMetrics {
    verified: Counter,
    invalid: Counter,
    handle: PrometheusHandle,
}

impl LeadMetrics {
    /// Build a fresh recorder and register both counters in it.
    pub fn new() -> Self {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();

        let (verified, invalid) = metrics::with_local_recorder(&recorder, || {
            describe_counter!(VERIFIED_TOTAL, "Total number of verified leads");
            describe_counter!(INVALID_TOTAL, "Total number of invalid leads");
            (counter!(VERIFIED_TOTAL), counter!(INVALID_TOTAL))
        });

        Self {
            verified,
            invalid,
            handle,
        }
    }

    /// Handle used by the exposition endpoint.
    pub fn handle(&self) -> PrometheusHandle {
        self.handle.clone()
    }

    /// Current values in Prometheus text format.
    pub fn render(&self) -> String {
        self.handle.render()
    }
}

impl Default for LeadMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsSink for LeadMetrics {
    fn increment_verified(&self) {
        self.verified.increment(1);
    }

    fn increment_invalid(&self) {
        self.invalid.increment(1);
    }
}
