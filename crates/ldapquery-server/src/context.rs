//! Per-request context built by the pipeline.

use ldapquery_core::trace::TraceId;

/// Client IP resolved by the pipeline, before a trace ID exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientIp(pub String);

/// Identity of one request, created once the trace ID is issued.
///
/// Read by every downstream stage; never shared across requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    /// Resolved client IP
    pub client_ip: String,
    /// Trace ID issued to the request
    pub trace_id: TraceId,
}

impl RequestContext {
    /// Creates a context.
    #[must_use]
    pub fn new(client_ip: impl Into<String>, trace_id: TraceId) -> Self {
        Self {
            client_ip: client_ip.into(),
            trace_id,
        }
    }
}
