//! Kernel module - monitor infrastructure and dependencies.

pub mod deps;
pub mod test_dependencies;
pub mod traits;

pub use deps::{MonitorDeps, WhoisAdapter};
pub use test_dependencies::{
    MockNotifier, MockRegistrationLookup, MockScanService, TestDependencies,
};
pub use traits::*;

// Re-export scan client types for easy access
pub use dnstwist_client::{
    CandidateDomain, DnstwistClient, ScanError, ScanHandle, ScanProgress, ScanService, WaitOptions,
};
