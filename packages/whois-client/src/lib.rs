//! Port-43 WHOIS client.
//!
//! Queries IANA first and follows the referral to the registry's WHOIS server,
//! then to the registrar's server when a thin registry points there.

pub mod error;
pub mod parser;

pub use error::{Result, WhoisError};
pub use parser::{parse, WhoisRecord};

use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;

pub const IANA_WHOIS_SERVER: &str = "whois.iana.org";
pub const WHOIS_PORT: u16 = 43;
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// Responses larger than this are truncated.
const MAX_RESPONSE_BYTES: u64 = 1024 * 1024;

#[derive(Debug, Clone)]
pub struct WhoisOptions {
    /// Root server asked first, normally IANA.
    pub server: String,
    pub port: u16,
    /// Per-connection timeout covering connect, write and read.
    pub timeout: Duration,
    pub max_attempts: u32,
}

impl Default for WhoisOptions {
    fn default() -> Self {
        Self {
            server: IANA_WHOIS_SERVER.to_string(),
            port: WHOIS_PORT,
            timeout: Duration::from_secs(10),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

#[derive(Debug, Clone)]
pub struct WhoisClient {
    options: WhoisOptions,
}

impl Default for WhoisClient {
    fn default() -> Self {
        Self::new(WhoisOptions::default())
    }
}

impl WhoisClient {
    pub fn new(options: WhoisOptions) -> Self {
        Self { options }
    }

    /// Raw WHOIS text for `domain`, following registry and registrar referrals.
    ///
    /// The root answer only describes the TLD, so a root server that names no
    /// registry gives [`WhoisError::NotFound`].
    pub async fn lookup(&self, domain: &str) -> Result<String> {
        let root = self.query(&self.options.server, domain).await?;
        if root.trim().is_empty() {
            return Err(WhoisError::EmptyResponse(self.options.server.clone()));
        }

        let Some(registry) = referral_server(&root) else {
            tracing::debug!(domain, server = %self.options.server, "No registry referral");
            return Err(WhoisError::NotFound);
        };

        let mut raw = self.query(&registry, domain).await?;

        if let Some(registrar) = registrar_server(&raw) {
            if !registrar.eq_ignore_ascii_case(&registry) {
                match self.query(&registrar, domain).await {
                    Ok(more) if !more.trim().is_empty() => {
                        raw.push('\n');
                        raw.push_str(&more);
                    }
                    Ok(_) => {}
                    Err(e) => {
                        tracing::debug!(
                            server = %registrar,
                            error = %e,
                            "Registrar whois query failed"
                        );
                    }
                }
            }
        }

        non_empty(raw, &registry)
    }

    /// [`lookup`](Self::lookup) retried up to `max_attempts` times.
    pub async fn lookup_with_retry(&self, domain: &str) -> Result<String> {
        let attempts = self.options.max_attempts.max(1);
        let mut last_error = None;

        for attempt in 1..=attempts {
            tracing::debug!(
                domain,
                attempt = %format!("{}/{}", attempt, attempts),
                "Retrieving whois"
            );

            match self.lookup(domain).await {
                Ok(raw) => return Ok(raw),
                Err(WhoisError::NotFound) => return Err(WhoisError::NotFound),
                Err(e) => {
                    tracing::debug!(domain, error = %e, "Could not retrieve whois");
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| WhoisError::EmptyResponse(self.options.server.clone())))
    }

    async fn query(&self, server: &str, domain: &str) -> Result<String> {
        let exchange = async {
            let mut stream = TcpStream::connect((server, self.options.port)).await?;
            stream.write_all(format!("{}\r\n", domain).as_bytes()).await?;

            let mut buf = Vec::new();
            stream.take(MAX_RESPONSE_BYTES).read_to_end(&mut buf).await?;
            Ok::<_, std::io::Error>(buf)
        };

        let bytes = timeout(self.options.timeout, exchange)
            .await
            .map_err(|_| WhoisError::Timeout(server.to_string()))?
            .map_err(|source| WhoisError::Io {
                server: server.to_string(),
                source,
            })?;

        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

fn non_empty(raw: String, server: &str) -> Result<String> {
    if raw.trim().is_empty() {
        return Err(WhoisError::EmptyResponse(server.to_string()));
    }
    Ok(raw)
}

/// Registry server named by an IANA `refer:` or `whois:` line.
pub fn referral_server(raw: &str) -> Option<String> {
    field_value(raw, &["refer", "whois"])
}

/// Registrar server named by a thin registry.
pub fn registrar_server(raw: &str) -> Option<String> {
    field_value(raw, &["registrar whois server"]).map(|server| {
        server
            .trim_start_matches("whois://")
            .trim_end_matches('/')
            .to_string()
    })
}

fn field_value(raw: &str, keys: &[&str]) -> Option<String> {
    raw.lines()
        .filter_map(|line| line.trim().split_once(':'))
        .find(|(key, _)| keys.contains(&key.trim().to_lowercase().as_str()))
        .map(|(_, value)| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// IDNA (punycode) form of `domain`.
pub fn to_ascii(domain: &str) -> Result<String> {
    url::Url::parse(&format!("http://{}/", domain.trim_end_matches('.')))
        .ok()
        .and_then(|url| url.host_str().map(str::to_string))
        .ok_or_else(|| WhoisError::InvalidDomain(domain.to_string()))
}

/// The name sent to WHOIS: the last two labels of `domain`.
pub fn registrable_name(domain: &str) -> &str {
    let domain = domain.trim_end_matches('.');
    let mut dots = domain.rmatch_indices('.');

    match (dots.next(), dots.next()) {
        (Some(_), Some((second, _))) => &domain[second + 1..],
        _ => domain,
    }
}
