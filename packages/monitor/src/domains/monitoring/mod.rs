//! Monitoring domain - drives scans over the watch-list and collects findings

pub mod activities;
pub mod models;

pub use activities::{enrich_candidate, notify_findings, run_watchlist, scan_domain};
pub use models::{
    DomainFailure, DomainStage, RunReport, RunSettings, SuspiciousSet, RESERVED_KEY,
};
