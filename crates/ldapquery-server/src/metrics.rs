//! Request metrics.
//!
//! Handlers write into a [`MetricsSink`] handed to them through [`AppState`](crate::AppState).
//! The production sink is [`PrometheusMetrics`], which owns its own registry so that tests can
//! build isolated instances.

use axum::http::StatusCode;
use ldapquery_core::error::{Error, Result};
use prometheus::{Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder};
use std::time::Duration;

/// Name of the request duration histogram.
pub const REQUEST_DURATION_METRIC: &str = "ldapquery_request_duration_seconds";
/// Name of the error counter.
pub const ERRORS_METRIC: &str = "ldapquery_errors_total";

/// Destination for request metrics.
///
/// Implementations must tolerate concurrent, uncoordinated calls.
pub trait MetricsSink: Send + Sync {
    /// Records the duration of a successful search, keyed by resulting status.
    fn observe_duration(&self, status: StatusCode, elapsed: Duration);

    /// Counts a rejected or failed request.
    fn record_error(&self, operation: &str, status: StatusCode, client: &str);

    /// Renders the current values in the text exposition format.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InternalError`] if the values cannot be encoded.
    fn encode(&self) -> Result<String>;
}

/// Prometheus-backed metrics sink.
pub struct PrometheusMetrics {
    registry: Registry,
    request_duration: HistogramVec,
    errors: IntCounterVec,
}

impl PrometheusMetrics {
    /// Creates the metric families in a fresh registry.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InternalError`] if a metric cannot be registered.
    pub fn new() -> Result<Self> {
        let registry = Registry::new();

        let request_duration = HistogramVec::new(
            HistogramOpts::new(
                REQUEST_DURATION_METRIC,
                "Time taken to query directory, partitioned by status code",
            ),
            &["status_code"],
        )
        .map_err(metrics_error)?;

        let errors = IntCounterVec::new(
            Opts::new(
                ERRORS_METRIC,
                "Count of errors when querying directory, partitioned by operation, status code and client IP",
            ),
            &["operation", "status_code", "client"],
        )
        .map_err(metrics_error)?;

        registry
            .register(Box::new(request_duration.clone()))
            .map_err(metrics_error)?;
        registry
            .register(Box::new(errors.clone()))
            .map_err(metrics_error)?;

        Ok(Self {
            registry,
            request_duration,
            errors,
        })
    }

    /// Current error count for a label set.
    #[must_use]
    pub fn error_count(&self, operation: &str, status: StatusCode, client: &str) -> u64 {
        self.errors
            .with_label_values(&[operation, status.as_str(), client])
            .get()
    }

    /// Number of duration samples observed for a status.
    #[must_use]
    pub fn duration_samples(&self, status: StatusCode) -> u64 {
        self.request_duration
            .with_label_values(&[status.as_str()])
            .get_sample_count()
    }
}

impl MetricsSink for PrometheusMetrics {
    fn observe_duration(&self, status: StatusCode, elapsed: Duration) {
        self.request_duration
            .with_label_values(&[status.as_str()])
            .observe(elapsed.as_secs_f64());
    }

    fn record_error(&self, operation: &str, status: StatusCode, client: &str) {
        self.errors
            .with_label_values(&[operation, status.as_str(), client])
            .inc();
    }

    fn encode(&self) -> Result<String> {
        let mut buffer = Vec::new();
        TextEncoder::new()
            .encode(&self.registry.gather(), &mut buffer)
            .map_err(metrics_error)?;
        String::from_utf8(buffer).map_err(|err| Error::InternalError(err.to_string()))
    }
}

fn metrics_error(err: prometheus::Error) -> Error {
    Error::InternalError(format!("metrics: {err}"))
}
