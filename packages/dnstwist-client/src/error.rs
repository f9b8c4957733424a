//! Error types for the dnstwist client.

use thiserror::Error;

/// Result type for dnstwist client operations.
pub type Result<T> = std::result::Result<T, ScanError>;

/// dnstwist client errors.
#[derive(Debug, Error)]
pub enum ScanError {
    /// Bad domain string or empty scan handle
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Network error (connection failed, per-call timeout)
    #[error("transport error: {0}")]
    Transport(#[source] reqwest::Error),

    /// The service answered with a status code >= 400
    #[error("scan service returned status {status}")]
    Remote { status: u16, body: String },

    /// Response body could not be decoded or is missing required data
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Decoded response carries a semantically impossible value
    #[error("invalid data: {0}")]
    InvalidData(String),

    /// Scan did not finish before the wait deadline
    #[error("timed out after {0:?} waiting for scan completion")]
    Timeout(std::time::Duration),

    /// Wait was cancelled by the caller
    #[error("wait cancelled")]
    Cancelled,
}

impl From<reqwest::Error> for ScanError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ScanError::Protocol(err.to_string())
        } else {
            ScanError::Transport(err)
        }
    }
}
