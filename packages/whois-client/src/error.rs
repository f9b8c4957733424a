//! Error types for the WHOIS client.

use thiserror::Error;

/// Result type for WHOIS operations.
pub type Result<T> = std::result::Result<T, WhoisError>;

#[derive(Debug, Error)]
pub enum WhoisError {
    /// Domain cannot be converted to an ASCII query
    #[error("invalid domain: {0}")]
    InvalidDomain(String),

    /// Connection or socket failure talking to a WHOIS server
    #[error("whois server {server} failed: {source}")]
    Io {
        server: String,
        #[source]
        source: std::io::Error,
    },

    /// WHOIS server did not answer within the per-call timeout
    #[error("whois server {0} timed out")]
    Timeout(String),

    /// Server answered with nothing
    #[error("whois server {0} returned an empty response")]
    EmptyResponse(String),

    /// Domain is unregistered or no registry serves its TLD
    #[error("domain is not registered")]
    NotFound,

    /// Response could not be interpreted
    #[error("could not parse whois response: {0}")]
    Parse(String),
}
