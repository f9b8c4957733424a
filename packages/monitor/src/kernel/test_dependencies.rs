// TestDependencies - mock implementations for testing
//
// Provides mock services that can be injected into MonitorDeps for tests.

use anyhow::Result;
use async_trait::async_trait;
use dnstwist_client::{CandidateDomain, ScanError, ScanHandle, ScanProgress, ScanService};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use super::{BaseNotifier, BaseRegistrationLookup, MonitorDeps};
use crate::domains::classification::RegistrationRecord;
use crate::domains::monitoring::SuspiciousSet;

const HANDLE_PREFIX: &str = "scan-";

// =============================================================================
// Mock Scan Service
// =============================================================================

pub struct MockScanService {
    results: Mutex<HashMap<String, Vec<CandidateDomain>>>,
    submit_failures: Mutex<HashSet<String>>,
    fetch_failures: Mutex<HashSet<String>>,
    stalled: Mutex<HashSet<String>>,
    progress_failures: AtomicUsize,
    submitted: Mutex<Vec<String>>,
    fetched: Mutex<Vec<String>>,
}

impl Default for MockScanService {
    fn default() -> Self {
        Self::new()
    }
}

impl MockScanService {
    pub fn new() -> Self {
        Self {
            results: Mutex::new(HashMap::new()),
            submit_failures: Mutex::new(HashSet::new()),
            fetch_failures: Mutex::new(HashSet::new()),
            stalled: Mutex::new(HashSet::new()),
            progress_failures: AtomicUsize::new(0),
            submitted: Mutex::new(Vec::new()),
            fetched: Mutex::new(Vec::new()),
        }
    }

    /// Candidates returned once the scan of `domain` finishes
    pub fn with_results(self, domain: &str, candidates: Vec<CandidateDomain>) -> Self {
        self.results.lock().unwrap().insert(domain.to_string(), candidates);
        self
    }

    /// Submitting `domain` fails with a remote error
    pub fn with_submit_failure(self, domain: &str) -> Self {
        self.submit_failures.lock().unwrap().insert(domain.to_string());
        self
    }

    /// Fetching results for `domain` fails with a remote error
    pub fn with_fetch_failure(self, domain: &str) -> Self {
        self.fetch_failures.lock().unwrap().insert(domain.to_string());
        self
    }

    /// The scan of `domain` never finishes
    pub fn with_stalled_scan(self, domain: &str) -> Self {
        self.stalled.lock().unwrap().insert(domain.to_string());
        self
    }

    /// The next `count` progress polls fail
    pub fn with_progress_failures(self, count: usize) -> Self {
        self.progress_failures.store(count, Ordering::SeqCst);
        self
    }

    pub fn submitted(&self) -> Vec<String> {
        self.submitted.lock().unwrap().clone()
    }

    pub fn fetched(&self) -> Vec<String> {
        self.fetched.lock().unwrap().clone()
    }

    fn domain_of(handle: &ScanHandle) -> String {
        handle.as_str().trim_start_matches(HANDLE_PREFIX).to_string()
    }
}

#[async_trait]
impl ScanService for MockScanService {
    async fn submit(&self, domain: &str) -> dnstwist_client::Result<ScanHandle> {
        if domain.is_empty() || !domain.contains('.') {
            return Err(ScanError::InvalidInput(format!("invalid domain: {:?}", domain)));
        }

        self.submitted.lock().unwrap().push(domain.to_string());

        if self.submit_failures.lock().unwrap().contains(domain) {
            return Err(ScanError::Remote {
                status: 503,
                body: "scan queue full".to_string(),
            });
        }

        Ok(ScanHandle::new(format!("{}{}", HANDLE_PREFIX, domain)))
    }

    async fn get_progress(&self, handle: &ScanHandle) -> dnstwist_client::Result<ScanProgress> {
        let pending_failures = self.progress_failures.load(Ordering::SeqCst);
        if pending_failures > 0 {
            self.progress_failures
                .store(pending_failures - 1, Ordering::SeqCst);
            return Err(ScanError::Remote {
                status: 502,
                body: String::new(),
            });
        }

        let remaining = if self.stalled.lock().unwrap().contains(&Self::domain_of(handle)) {
            5
        } else {
            0
        };

        Ok(ScanProgress {
            complete: 10 - remaining,
            registered: 1,
            remaining,
            total: 10,
        })
    }

    async fn fetch_results(
        &self,
        handle: &ScanHandle,
    ) -> dnstwist_client::Result<Vec<CandidateDomain>> {
        let domain = Self::domain_of(handle);
        self.fetched.lock().unwrap().push(domain.clone());

        if self.fetch_failures.lock().unwrap().contains(&domain) {
            return Err(ScanError::Remote {
                status: 500,
                body: String::new(),
            });
        }

        Ok(self
            .results
            .lock()
            .unwrap()
            .get(&domain)
            .cloned()
            .unwrap_or_default())
    }
}

// =============================================================================
// Mock Registration Lookup
// =============================================================================

#[derive(Default)]
pub struct MockRegistrationLookup {
    records: Mutex<HashMap<String, RegistrationRecord>>,
    failures: Mutex<HashSet<String>>,
    calls: Mutex<Vec<String>>,
}

impl MockRegistrationLookup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_record(self, domain: &str, record: RegistrationRecord) -> Self {
        self.records.lock().unwrap().insert(domain.to_string(), record);
        self
    }

    pub fn with_failure(self, domain: &str) -> Self {
        self.failures.lock().unwrap().insert(domain.to_string());
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl BaseRegistrationLookup for MockRegistrationLookup {
    async fn lookup(&self, domain: &str) -> Result<RegistrationRecord> {
        self.calls.lock().unwrap().push(domain.to_string());

        if self.failures.lock().unwrap().contains(domain) {
            anyhow::bail!("whois unavailable for {}", domain);
        }

        Ok(self
            .records
            .lock()
            .unwrap()
            .get(domain)
            .cloned()
            .unwrap_or_default())
    }
}

// =============================================================================
// Mock Notifier
// =============================================================================

#[derive(Default)]
pub struct MockNotifier {
    deliveries: Mutex<Vec<SuspiciousSet>>,
    fail: bool,
}

impl MockNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn deliveries(&self) -> Vec<SuspiciousSet> {
        self.deliveries.lock().unwrap().clone()
    }
}

#[async_trait]
impl BaseNotifier for MockNotifier {
    async fn notify(&self, findings: &SuspiciousSet) -> Result<()> {
        self.deliveries.lock().unwrap().push(findings.clone());

        if self.fail {
            anyhow::bail!("webhook returned status 500");
        }
        Ok(())
    }
}

// =============================================================================
// TestDependencies
// =============================================================================

/// Mock services wired into a MonitorDeps, kept around for assertions
pub struct TestDependencies {
    pub scanner: Arc<MockScanService>,
    pub registration: Arc<MockRegistrationLookup>,
    pub notifier: Arc<MockNotifier>,
}

impl TestDependencies {
    pub fn new(
        scanner: MockScanService,
        registration: MockRegistrationLookup,
        notifier: MockNotifier,
    ) -> Self {
        Self {
            scanner: Arc::new(scanner),
            registration: Arc::new(registration),
            notifier: Arc::new(notifier),
        }
    }

    pub fn deps(&self) -> MonitorDeps {
        MonitorDeps::new(
            self.scanner.clone(),
            self.registration.clone(),
            Some(self.notifier.clone()),
        )
    }

    /// Dependencies without a notification destination
    pub fn deps_without_notifier(&self) -> MonitorDeps {
        MonitorDeps::new(self.scanner.clone(), self.registration.clone(), None)
    }
}
