use crate::types::location::{DateRange, LatLon};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Cloneable so one failed fetch can be reported to every caller that waited on it.
#[derive(Debug, Clone, Error)]
pub enum FetchError {
    #[error("Failed to build HTTP client")]
    ClientBuild(#[source] Arc<reqwest::Error>),

    #[error("Network request failed for {0}")]
    NetworkRequest(String, #[source] Arc<reqwest::Error>),

    #[error("Request to {url} timed out after {timeout:?}")]
    Timeout {
        url: String,
        timeout: Duration,
        #[source]
        source: Arc<reqwest::Error>,
    },

    #[error("HTTP request failed for {url} with status {status}")]
    HttpStatus {
        url: String,
        status: reqwest::StatusCode,
    },

    // Open-Meteo reports bad parameters as `{"error": true, "reason": "..."}`
    #[error("Archive rejected request to {url}: {reason}")]
    Api { url: String, reason: String },

    #[error("Failed to decode archive response from {url}")]
    Decode {
        url: String,
        #[source]
        source: Arc<serde_json::Error>,
    },

    #[error("Archive returned no usable observations for {location} over {range}")]
    EmptyPayload { location: LatLon, range: DateRange },
}
