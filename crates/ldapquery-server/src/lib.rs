//! HTTP front end of the LDAP query gateway.
//!
//! Requests to `POST /` pass through a fixed pipeline (method gate, client-IP resolution,
//! allow-list, trace-ID issuance) before the search handler opens a directory connection,
//! validates the body, searches and writes the response envelope.
//!
//! ## Modules
//!
//! - [`pipeline`] - Ordered request gates
//! - [`handler`] - Search handler
//! - [`response`] - Response writing
//! - [`metrics`] - Metrics sink and Prometheus exposition
//! - [`router`] - Route table
//! - [`state`] - Shared handler state
//! - [`cli`] - Command-line and config file loading
//! - [`logging`] - Subscriber setup

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod cli;
pub mod context;
pub mod handler;
pub mod logging;
pub mod metrics;
pub mod pipeline;
pub mod response;
pub mod router;
pub mod state;
pub mod status;

pub use context::RequestContext;
pub use metrics::{MetricsSink, PrometheusMetrics};
pub use router::create_router;
pub use state::AppState;
