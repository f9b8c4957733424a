//! Scan service trait.
//!
//! Abstracts over the remote dnstwist API so callers can drive the same
//! submit/wait/fetch flow against a fake or a local permutation engine.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{CandidateDomain, ScanHandle, ScanProgress};

#[async_trait]
pub trait ScanService: Send + Sync {
    /// Submit a domain for scanning and return its handle.
    async fn submit(&self, domain: &str) -> Result<ScanHandle>;

    /// Current progress of a scan.
    async fn get_progress(&self, handle: &ScanHandle) -> Result<ScanProgress>;

    /// Candidate domains discovered by a scan. Empty when nothing was found.
    async fn fetch_results(&self, handle: &ScanHandle) -> Result<Vec<CandidateDomain>>;
}
