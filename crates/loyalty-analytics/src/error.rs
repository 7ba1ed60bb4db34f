//! Error types for the report pipeline.
//!
//! Only the fetch and write boundaries can fail a run. Resolution and
//! aggregation are total; assembly problems are recorded, not returned.

use std::fmt;

use thiserror::Error;

use crate::constants;

/// The upstream collections a run depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collection {
    Members,
    Agents,
    TierPrices,
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Members => write!(f, "members"),
            Self::Agents => write!(f, "agents"),
            Self::TierPrices => write!(f, "tier prices"),
        }
    }
}

/// One of the three upstream retrievals failed.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Transport-level failure (connect, timeout, TLS).
    #[error("request for {collection} failed: {source}")]
    Request {
        collection: Collection,
        #[source]
        source: reqwest::Error,
    },

    /// The service answered with a non-success status.
    #[error("{collection} endpoint returned status {status}")]
    Status { collection: Collection, status: u16 },

    /// The body was not a record list.
    #[error("could not decode {collection} response: {source}")]
    Decode {
        collection: Collection,
        #[source]
        source: serde_json::Error,
    },

    /// The source could not serve the collection at all.
    #[error("{collection} unavailable: {message}")]
    Unavailable { collection: Collection, message: String },
}

impl FetchError {
    /// Which collection failed.
    pub fn collection(&self) -> Collection {
        match self {
            Self::Request { collection, .. }
            | Self::Status { collection, .. }
            | Self::Decode { collection, .. }
            | Self::Unavailable { collection, .. } => *collection,
        }
    }
}

/// Serializing or delivering the finished document failed.
#[derive(Debug, Error)]
pub enum WriteError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV encoding error: {0}")]
    Csv(#[from] csv::Error),

    #[error("serialization failed: {0}")]
    Serialize(String),
}

impl From<fmt::Error> for WriteError {
    fn from(e: fmt::Error) -> Self {
        Self::Serialize(e.to_string())
    }
}

/// A record could not fill a cell; the cell was replaced with "N/A".
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssemblyError {
    #[error("{sheet}: record {record_id} has no usable timestamp")]
    MissingTimestamp { sheet: String, record_id: String },
}

/// Failure of a whole run. No artifact is delivered when this is returned.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Write(#[from] WriteError),
}

impl ReportError {
    /// Text suitable for showing to the person who triggered the run.
    pub fn user_message(&self) -> &'static str {
        constants::USER_FACING_FAILURE
    }
}
