//! Pure dnstwist scan API client.
//!
//! A minimal client for the dnstwist permutation-scanning service. Supports
//! submitting a domain for scanning, polling the scan until it completes, and
//! fetching the discovered look-alike domains.
//!
//! # Example
//!
//! ```rust,ignore
//! use dnstwist_client::{DnstwistClient, WaitOptions};
//! use tokio_util::sync::CancellationToken;
//!
//! let client = DnstwistClient::new(dnstwist_client::DEFAULT_BASE_URL)?;
//!
//! let handle = client.submit("example.com").await?;
//! client.wait(&handle, &WaitOptions::default(), &CancellationToken::new()).await?;
//! for candidate in client.fetch_results(&handle).await? {
//!     println!("{} ({})", candidate.domain, candidate.fuzzer);
//! }
//! ```

pub mod error;
pub mod service;
pub mod types;
pub mod wait;

pub use error::{Result, ScanError};
pub use service::ScanService;
pub use types::{CandidateDomain, ScanHandle, ScanProgress, ScanRequest, ScanResponse};
pub use wait::{wait_for_scan, WaitOptions};

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;

pub const DEFAULT_BASE_URL: &str = "https://dnstwist.it";

/// Per-request timeout, independent from the overall scan deadline.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

const SCAN_URI: &str = "/api/scans";

#[derive(Debug, Clone)]
pub struct DnstwistClient {
    client: reqwest::Client,
    base_url: String,
}

impl DnstwistClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        Self::with_timeout(base_url, DEFAULT_REQUEST_TIMEOUT)
    }

    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(ScanError::Transport)?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Submit a domain for permutation scanning. Returns immediately with the scan handle.
    pub async fn submit(&self, domain: &str) -> Result<ScanHandle> {
        if domain.is_empty() || !domain.contains('.') {
            return Err(ScanError::InvalidInput(format!("invalid domain: {:?}", domain)));
        }

        let payload = ScanRequest {
            url: domain.to_string(),
        };
        let url = format!("{}{}", self.base_url, SCAN_URI);
        tracing::debug!(domain, url = %url, "Submitting scan request");

        let resp = self.client.post(&url).json(&payload).send().await?;
        let scan: ScanResponse = decode(resp).await?;

        let handle = ScanHandle::new(scan.id);
        if handle.is_empty() {
            return Err(ScanError::Protocol(format!("empty scan id returned for {}", domain)));
        }

        tracing::debug!(domain, handle = %handle, total = scan.total, "Scan accepted");
        Ok(handle)
    }

    /// Fetch the current progress counters of a scan.
    pub async fn get_progress(&self, handle: &ScanHandle) -> Result<ScanProgress> {
        ensure_handle(handle)?;

        let url = format!("{}{}/{}", self.base_url, SCAN_URI, handle);
        tracing::debug!(url = %url, "Fetching scan progress");

        let resp = self.client.get(&url).send().await?;
        let scan: ScanResponse = decode(resp).await?;

        ScanProgress::try_from(&scan)
    }

    /// Fetch the candidate domains of a finished scan.
    pub async fn fetch_results(&self, handle: &ScanHandle) -> Result<Vec<CandidateDomain>> {
        ensure_handle(handle)?;

        let url = format!("{}{}/{}/domains", self.base_url, SCAN_URI, handle);
        tracing::debug!(url = %url, "Fetching scan results");

        let resp = self.client.get(&url).send().await?;
        let candidates: Option<Vec<CandidateDomain>> = decode(resp).await?;

        Ok(candidates.unwrap_or_default())
    }

    /// Block until the scan reports no remaining permutations, the deadline
    /// elapses or `cancel` fires.
    pub async fn wait(
        &self,
        handle: &ScanHandle,
        options: &WaitOptions,
        cancel: &CancellationToken,
    ) -> Result<()> {
        let service: Arc<dyn ScanService> = Arc::new(self.clone());
        wait_for_scan(service, handle, options, cancel).await
    }
}

#[async_trait]
impl ScanService for DnstwistClient {
    async fn submit(&self, domain: &str) -> Result<ScanHandle> {
        DnstwistClient::submit(self, domain).await
    }

    async fn get_progress(&self, handle: &ScanHandle) -> Result<ScanProgress> {
        DnstwistClient::get_progress(self, handle).await
    }

    async fn fetch_results(&self, handle: &ScanHandle) -> Result<Vec<CandidateDomain>> {
        DnstwistClient::fetch_results(self, handle).await
    }
}

fn ensure_handle(handle: &ScanHandle) -> Result<()> {
    if handle.is_empty() {
        return Err(ScanError::InvalidInput("scan handle is empty".to_string()));
    }
    Ok(())
}

async fn decode<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T> {
    let status = resp.status();
    if status.as_u16() >= 400 {
        let body = resp.text().await.unwrap_or_default();
        tracing::debug!(status = status.as_u16(), body = %body, "Scan service error response");
        return Err(ScanError::Remote {
            status: status.as_u16(),
            body,
        });
    }

    let body = resp.text().await?;
    serde_json::from_str(&body)
        .map_err(|e| ScanError::Protocol(format!("could not decode response: {}", e)))
}
