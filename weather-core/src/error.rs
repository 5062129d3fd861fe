//! Typed errors for the gateway and snapshot store.
//!
//! Both kinds stop at the orchestrator: they are logged there and turned into
//! an outcome, never shown to the user as-is.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("invalid request URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("request to {endpoint} failed: {source}")]
    Transport {
        endpoint: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{endpoint} request failed with status {status}: {body}")]
    Status {
        endpoint: &'static str,
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("failed to decode {endpoint} response: {source}")]
    Decode {
        endpoint: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

impl GatewayError {
    /// Decode failures mean the upstream changed shape, everything else is
    /// plausibly transient.
    pub fn is_decode(&self) -> bool {
        matches!(self, GatewayError::Decode { .. })
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to open snapshot database: {0}")]
    Open(#[source] rusqlite::Error),

    #[error("failed to write snapshot: {0}")]
    Write(#[source] rusqlite::Error),

    #[error("failed to read snapshot: {0}")]
    Read(#[source] rusqlite::Error),

    #[error("failed to create snapshot directory: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum LocationError {
    #[error("coordinates out of range: {}, {}", .0.latitude, .0.longitude)]
    OutOfRange(crate::model::Coordinates),
}
