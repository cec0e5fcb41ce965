//! # Pipeline Metrics
//!
//! Operational counters for the finalization pipeline. Worker invocations
//! are the expensive part of every request, so they get the most detail:
//! counts and failures per operation, timeouts, and a latency histogram.
//!
//! All metrics are registered in a dedicated [`prometheus::Registry`] so they
//! do not collide with any default global registry consumers. The web tier
//! serves [`PipelineMetrics::encode`] wherever it exposes `/metrics`.

use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};

/// Holds all Prometheus metric handles for the pipeline.
///
/// Clone-friendly (prometheus handles are `Arc`s internally) so it can be
/// shared between the dispatcher and the orchestrator.
#[derive(Clone)]
pub struct PipelineMetrics {
    /// Prometheus registry that owns all metrics below.
    registry: Registry,
    /// Worker invocations, labelled by operation (`burn_build`, `mint_merge_submit`, ...).
    pub worker_invocations_total: IntCounterVec,
    /// Invocations whose result status was not 200, by operation.
    pub worker_failures_total: IntCounterVec,
    /// Invocations killed for exceeding the time budget.
    pub worker_timeouts_total: IntCounter,
    /// Wall-clock duration of each worker invocation in seconds.
    pub worker_latency_seconds: Histogram,
    /// Requests rejected before or after the worker, by reason.
    pub requests_rejected_total: IntCounterVec,
    /// Transactions accepted by the network.
    pub transactions_submitted_total: IntCounter,
}

impl PipelineMetrics {
    /// Creates and registers all metrics. Call once at startup.
    pub fn new() -> Self {
        let registry = Registry::new_custom(Some("littercoin".into()), None)
            .expect("failed to create prometheus registry");

        let worker_invocations_total = IntCounterVec::new(
            Opts::new(
                "worker_invocations_total",
                "Total number of chain worker invocations",
            ),
            &["operation"],
        )
        .expect("metric creation");
        registry
            .register(Box::new(worker_invocations_total.clone()))
            .expect("metric registration");

        let worker_failures_total = IntCounterVec::new(
            Opts::new(
                "worker_failures_total",
                "Worker invocations that did not return status 200",
            ),
            &["operation"],
        )
        .expect("metric creation");
        registry
            .register(Box::new(worker_failures_total.clone()))
            .expect("metric registration");

        let worker_timeouts_total = IntCounter::new(
            "worker_timeouts_total",
            "Worker invocations killed after exceeding the timeout",
        )
        .expect("metric creation");
        registry
            .register(Box::new(worker_timeouts_total.clone()))
            .expect("metric registration");

        let worker_latency_seconds = Histogram::with_opts(
            HistogramOpts::new(
                "worker_latency_seconds",
                "Wall-clock duration of chain worker invocations in seconds",
            )
            .buckets(vec![0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0, 120.0]),
        )
        .expect("metric creation");
        registry
            .register(Box::new(worker_latency_seconds.clone()))
            .expect("metric registration");

        let requests_rejected_total = IntCounterVec::new(
            Opts::new(
                "requests_rejected_total",
                "Requests that ended in a client-facing failure",
            ),
            &["reason"],
        )
        .expect("metric creation");
        registry
            .register(Box::new(requests_rejected_total.clone()))
            .expect("metric registration");

        let transactions_submitted_total = IntCounter::new(
            "transactions_submitted_total",
            "Transactions accepted by the network",
        )
        .expect("metric creation");
        registry
            .register(Box::new(transactions_submitted_total.clone()))
            .expect("metric registration");

        Self {
            registry,
            worker_invocations_total,
            worker_failures_total,
            worker_timeouts_total,
            worker_latency_seconds,
            requests_rejected_total,
            transactions_submitted_total,
        }
    }

    pub fn record_invocation(&self, operation: &str) {
        self.worker_invocations_total
            .with_label_values(&[operation])
            .inc();
    }

    pub fn record_worker_failure(&self, operation: &str) {
        self.worker_failures_total
            .with_label_values(&[operation])
            .inc();
    }

    pub fn record_rejection(&self, reason: &str) {
        self.requests_rejected_total
            .with_label_values(&[reason])
            .inc();
    }

    /// Encodes all registered metrics into the Prometheus text exposition format.
    pub fn encode(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

impl Default for PipelineMetrics {
    fn default() -> Self {
        Self::new()
    }
}
