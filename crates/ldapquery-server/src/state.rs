//! Shared handler state.

use ldapquery_core::trace::{RandomTraceIds, TraceIdSource};
use ldapquery_directory::DirectoryClient;
use std::sync::Arc;

use crate::metrics::MetricsSink;

/// State shared by every request.
///
/// Everything in here is read-only after startup.
#[derive(Clone)]
pub struct AppState {
    /// Directory client
    pub directory: Arc<DirectoryClient>,
    /// Client IPs allowed to query
    pub allowed_sources: Arc<[String]>,
    /// Metrics sink
    pub metrics: Arc<dyn MetricsSink>,
    /// Trace ID source
    pub trace_ids: Arc<dyn TraceIdSource>,
}

impl AppState {
    /// Creates state issuing random trace IDs.
    pub fn new(
        directory: DirectoryClient,
        allowed_sources: Vec<String>,
        metrics: Arc<dyn MetricsSink>,
    ) -> Self {
        Self {
            directory: Arc::new(directory),
            allowed_sources: allowed_sources.into(),
            metrics,
            trace_ids: Arc::new(RandomTraceIds),
        }
    }

    /// Replaces the trace ID source.
    #[must_use]
    pub fn with_trace_ids(mut self, trace_ids: Arc<dyn TraceIdSource>) -> Self {
        self.trace_ids = trace_ids;
        self
    }

    /// Whether `client_ip` is in the allow-list.
    ///
    /// Matching is exact string comparison.
    #[must_use]
    pub fn is_allowed(&self, client_ip: &str) -> bool {
        self.allowed_sources.iter().any(|source| source == client_ip)
    }
}
