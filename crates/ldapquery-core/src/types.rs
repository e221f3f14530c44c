//! Result and response shapes returned to callers.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::Error;
use crate::trace::TraceId;

/// One directory entry, flattened for JSON.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultEntry {
    /// Distinguished name of the entry, present only when it was requested
    #[serde(
        rename = "distinguishedName",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub distinguished_name: Option<String>,

    /// Requested attributes mapped to their first value
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, String>,
}

/// Uniform JSON body written on every path except validation failure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    /// Summary of the outcome
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub message: String,

    /// Raw error text, if the request failed
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub error: String,

    /// Trace ID issued to the request
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace_id: Option<TraceId>,

    /// Entries found by the search
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub result: Vec<ResultEntry>,
}

impl ResponseEnvelope {
    /// Creates an empty envelope.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an envelope carrying only a message.
    #[must_use]
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Self::default()
        }
    }

    /// Creates an envelope describing `error`.
    #[must_use]
    pub fn from_error(error: &Error) -> Self {
        Self {
            message: error.summary(),
            error: error.detail().unwrap_or_default(),
            ..Self::default()
        }
    }

    /// Attaches the request's trace ID.
    #[must_use]
    pub fn with_trace_id(mut self, trace_id: Option<TraceId>) -> Self {
        self.trace_id = trace_id;
        self
    }

    /// Attaches search results.
    #[must_use]
    pub fn with_result(mut self, result: Vec<ResultEntry>) -> Self {
        self.result = result;
        self
    }
}
