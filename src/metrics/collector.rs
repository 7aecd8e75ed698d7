//! Metrics collector using prometheus-client.
//!
//! Counts relay requests by outcome and records their latency.

use crate::relay::OutcomeKind;
use prometheus_client::encoding::{EncodeLabelSet, EncodeLabelValue};
use prometheus_client::metrics::counter::Counter;
use prometheus_client::metrics::family::Family;
use prometheus_client::metrics::gauge::Gauge;
use prometheus_client::metrics::histogram::{exponential_buckets, Histogram};
use prometheus_client::registry::Registry;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Outcome label value.
#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelValue)]
pub enum Outcome {
    Success,
    ConnectionFailure,
    BadStatus,
    BadPayload,
}

impl From<OutcomeKind> for Outcome {
    fn from(kind: OutcomeKind) -> Self {
        match kind {
            OutcomeKind::Success => Outcome::Success,
            OutcomeKind::ConnectionFailure => Outcome::ConnectionFailure,
            OutcomeKind::BadStatus => Outcome::BadStatus,
            OutcomeKind::BadPayload => Outcome::BadPayload,
        }
    }
}

/// Labels for request metrics.
#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct RequestLabels {
    pub outcome: Outcome,
    pub status: String,
}

/// Labels for latency metrics.
#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct DurationLabels {
    pub outcome: Outcome,
}

/// Collects and stores all metrics.
#[derive(Clone)]
pub struct MetricsCollector {
    inner: Arc<MetricsCollectorInner>,
}

struct MetricsCollectorInner {
    /// Total relay requests, by outcome and returned status.
    requests_total: Family<RequestLabels, Counter>,
    /// Relay request duration histogram (in seconds).
    request_duration_seconds: Family<DurationLabels, Histogram>,
    /// Requests currently waiting on the outbound call.
    in_flight: Gauge,
    /// Inbound connections accepted.
    connections_total: Counter,
    registry: Registry,
}

impl MetricsCollector {
    /// Create a new metrics collector.
    pub fn new() -> Self {
        let mut registry = Registry::default();

        let requests_total = Family::<RequestLabels, Counter>::default();
        let request_duration_seconds =
            Family::<DurationLabels, Histogram>::new_with_constructor(|| {
                // Buckets: 1ms up to ~24s, covering the longest preset timeout
                Histogram::new(exponential_buckets(0.001, 2.5, 12))
            });
        let in_flight = Gauge::default();
        let connections_total = Counter::default();

        registry.register(
            "healthrelay_requests",
            "Total number of relay requests handled",
            requests_total.clone(),
        );
        registry.register(
            "healthrelay_request_duration_seconds",
            "Relay request duration in seconds",
            request_duration_seconds.clone(),
        );
        registry.register(
            "healthrelay_in_flight_requests",
            "Relay requests awaiting the outbound call",
            in_flight.clone(),
        );
        registry.register(
            "healthrelay_connections",
            "Total number of inbound connections",
            connections_total.clone(),
        );

        Self {
            inner: Arc::new(MetricsCollectorInner {
                requests_total,
                request_duration_seconds,
                in_flight,
                connections_total,
                registry,
            }),
        }
    }

    /// Get the prometheus registry for encoding.
    pub fn registry(&self) -> &Registry {
        &self.inner.registry
    }

    /// Record a completed relay request.
    pub fn record_request(&self, outcome: OutcomeKind, status: u16, duration: Duration) {
        let labels = RequestLabels {
            outcome: outcome.into(),
            status: status.to_string(),
        };
        self.inner.requests_total.get_or_create(&labels).inc();

        self.inner
            .request_duration_seconds
            .get_or_create(&DurationLabels {
                outcome: outcome.into(),
            })
            .observe(duration.as_secs_f64());
    }

    pub fn connection_accepted(&self) {
        self.inner.connections_total.inc();
    }

    /// Start timing a request. Counts it as in flight until recorded or dropped.
    pub fn start_request_timer(&self) -> RequestTimer {
        self.inner.in_flight.inc();
        RequestTimer {
            collector: self.clone(),
            start: Instant::now(),
        }
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

/// Timer guard for one relay request.
pub struct RequestTimer {
    collector: MetricsCollector,
    start: Instant,
}

impl RequestTimer {
    /// Get the elapsed duration.
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Record the outcome and consume the timer.
    pub fn record(self, outcome: OutcomeKind, status: u16) {
        let duration = self.start.elapsed();
        self.collector.record_request(outcome, status, duration);
    }
}

impl Drop for RequestTimer {
    fn drop(&mut self) {
        self.collector.inner.in_flight.dec();
    }
}
