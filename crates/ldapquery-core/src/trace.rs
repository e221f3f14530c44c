//! Per-request trace identifiers.
//!
//! Every request that passes the allow-list is given a random v4 UUID. The identifier is attached
//! to every log line emitted for the request and echoed back in the response envelope.

use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::{Builder, Uuid};

use crate::error::{Error, Result};

/// Unique identifier for a single request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TraceId(Uuid);

impl TraceId {
    /// Generates a random (v4) trace ID from the operating system's entropy source.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TraceGenerationFailed`] if the entropy source cannot be read.
    pub fn generate() -> Result<Self> {
        let mut bytes = [0u8; 16];
        OsRng
            .try_fill_bytes(&mut bytes)
            .map_err(|err| Error::TraceGenerationFailed(err.to_string()))?;
        Ok(Self(Builder::from_random_bytes(bytes).into_uuid()))
    }

    /// Returns the inner [`Uuid`].
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl FromStr for TraceId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|err| Error::InternalError(format!("invalid trace ID `{s}`: {err}")))
    }
}

impl fmt::Display for TraceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Source of trace identifiers.
pub trait TraceIdSource: Send + Sync {
    /// Issues a new identifier.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TraceGenerationFailed`] when no identifier can be produced.
    fn issue(&self) -> Result<TraceId>;
}

/// Issues random v4 trace IDs.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomTraceIds;

impl TraceIdSource for RandomTraceIds {
    fn issue(&self) -> Result<TraceId> {
        TraceId::generate()
    }
}
