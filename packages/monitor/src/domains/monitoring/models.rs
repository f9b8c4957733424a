use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use dnstwist_client::{ScanError, WaitOptions};
use thiserror::Error;

use crate::domains::classification::VerdictAttributes;

/// Key that must never be reported as a domain.
pub const RESERVED_KEY: &str = "suspicious";

/// Step of the per-domain pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DomainStage {
    Submitted,
    Waiting,
    Fetched,
    Enriching,
    Done,
}

impl std::fmt::Display for DomainStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let stage = match self {
            DomainStage::Submitted => "submit",
            DomainStage::Waiting => "wait",
            DomainStage::Fetched => "fetch",
            DomainStage::Enriching => "enrich",
            DomainStage::Done => "done",
        };
        f.write_str(stage)
    }
}

/// A watched domain that could not be scanned.
#[derive(Debug, Error)]
#[error("{stage} step failed: {source}")]
pub struct DomainFailure {
    pub stage: DomainStage,
    #[source]
    pub source: ScanError,
}

impl DomainFailure {
    pub fn at(stage: DomainStage) -> impl FnOnce(ScanError) -> Self {
        move |source| Self { stage, source }
    }
}

/// Suspicious candidates keyed by domain. Later inserts replace earlier ones.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SuspiciousSet(BTreeMap<String, VerdictAttributes>);

impl SuspiciousSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, domain: impl Into<String>, attributes: VerdictAttributes) {
        self.0.insert(domain.into(), attributes);
    }

    pub fn get(&self, domain: &str) -> Option<&VerdictAttributes> {
        self.0.get(domain)
    }

    pub fn contains(&self, domain: &str) -> bool {
        self.0.contains_key(domain)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &VerdictAttributes)> {
        self.0.iter().map(|(domain, attrs)| (domain.as_str(), attrs))
    }

    /// Copy of the set without the reserved key.
    pub fn reportable(&self) -> Self {
        let mut set = self.clone();
        set.0.remove(RESERVED_KEY);
        set
    }
}

#[derive(Debug, Clone, Default)]
pub struct RunSettings {
    /// Registrations newer than this are suspicious. `None` disables the date rules.
    pub cutoff: Option<DateTime<Utc>>,
    pub wait: WaitOptions,
}

#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub suspicious: SuspiciousSet,
    /// Watched domains whose scan completed
    pub scanned: usize,
    /// Watched domains that ended in an error
    pub failed: usize,
    /// Candidates classified across all scans
    pub candidates: usize,
    /// Run stopped early because of cancellation
    pub cancelled: bool,
}
