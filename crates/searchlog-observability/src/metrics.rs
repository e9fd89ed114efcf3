//! Metrics collection with Prometheus
//!
//! - Submission counts by result (accepted, rejected, failed)
//! - Deferred decision counts by outcome
//! - Request latency by route
//! - Decisions currently in flight

use prometheus::{CounterVec, HistogramOpts, HistogramVec, IntGauge, Opts, Registry};
use searchlog_core::{DecisionObserver, DecisionOutcome};
use std::sync::Arc;

/// Metrics collector for SearchLog
#[derive(Clone)]
pub struct Metrics {
    registry: Arc<Registry>,

    /// Submissions by result
    pub submissions_total: CounterVec,

    /// Finished deferred decisions by outcome
    pub decisions_total: CounterVec,

    /// HTTP handler duration by route
    pub request_duration_seconds: HistogramVec,

    /// Scheduled decisions that have not finished
    pub decisions_in_flight: IntGauge,
}

impl Metrics {
    /// Create a new metrics collector with its own registry
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let submissions_total = CounterVec::new(
            Opts::new(
                "searchlog_submissions_total",
                "Total number of search submissions",
            ),
            &["result"],
        )?;

        let decisions_total = CounterVec::new(
            Opts::new(
                "searchlog_decisions_total",
                "Total number of finished persistence decisions",
            ),
            &["outcome"],
        )?;

        let request_duration_seconds = HistogramVec::new(
            HistogramOpts::new(
                "searchlog_request_duration_seconds",
                "HTTP request handling duration in seconds",
            )
            .buckets(vec![
                0.0005, 0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0,
            ]),
            &["route"],
        )?;

        let decisions_in_flight = IntGauge::new(
            "searchlog_decisions_in_flight",
            "Number of scheduled persistence decisions not yet finished",
        )?;

        registry.register(Box::new(submissions_total.clone()))?;
        registry.register(Box::new(decisions_total.clone()))?;
        registry.register(Box::new(request_duration_seconds.clone()))?;
        registry.register(Box::new(decisions_in_flight.clone()))?;

        Ok(Self {
            registry: Arc::new(registry),
            submissions_total,
            decisions_total,
            request_duration_seconds,
            decisions_in_flight,
        })
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Record a submission result (`accepted`, `rejected` or `failed`)
    pub fn record_submission(&self, result: &str) {
        self.submissions_total.with_label_values(&[result]).inc();
    }

    pub fn record_decision(&self, outcome: DecisionOutcome) {
        self.decisions_total
            .with_label_values(&[outcome.as_str()])
            .inc();
    }

    pub fn record_request_duration(&self, route: &str, duration_secs: f64) {
        self.request_duration_seconds
            .with_label_values(&[route])
            .observe(duration_secs);
    }

    pub fn set_decisions_in_flight(&self, in_flight: usize) {
        self.decisions_in_flight
            .set(i64::try_from(in_flight).unwrap_or(i64::MAX));
    }
}

impl DecisionObserver for Metrics {
    fn on_decision(&self, outcome: DecisionOutcome) {
        self.record_decision(outcome);
    }
}
