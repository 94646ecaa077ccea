//! Errors for the seismic event recorder.
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RecorderError {
    #[error("configuration error")]
    Config(#[from] config::ConfigError),

    #[error("invalid configuration: {message}")]
    InvalidConfig { message: String },

    #[error("upstream unreachable: {message}")]
    UpstreamUnreachable { message: String },

    #[error("upstream returned status {status}")]
    UpstreamUnavailable { status: u16 },

    #[error("upstream body malformed: {message}")]
    UpstreamMalformed { message: String },

    #[error("upstream returned no data")]
    UpstreamNoData,

    #[error("store scan failed: {message}")]
    StoreScan { message: String },

    #[error("store delete failed: {message}")]
    StoreDelete { message: String },

    #[error("store write failed: {message}")]
    StoreWrite { message: String },

    #[error("store read failed: {message}")]
    StoreRead { message: String },

    #[error("serialization error")]
    Serde(#[from] serde_json::Error),
}

impl RecorderError {
    /// Status code reported in the invocation response.
    ///
    /// Upstream non-success statuses are propagated as-is; a page without
    /// any data resolves to 404; everything else is an internal 500.
    pub fn status_code(&self) -> u16 {
        match self {
            RecorderError::UpstreamUnavailable { status } => *status,
            RecorderError::UpstreamNoData => 404,
            _ => 500,
        }
    }
}
