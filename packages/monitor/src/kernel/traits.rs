// Trait definitions for dependency injection
//
// These are INFRASTRUCTURE traits only - no business logic.
// Classification and orchestration are domain functions that use these traits.
//
// Naming convention: Base* for trait names (e.g., BaseNotifier)

use anyhow::Result;
use async_trait::async_trait;

use crate::domains::classification::RegistrationRecord;
use crate::domains::monitoring::SuspiciousSet;

// =============================================================================
// Registration Lookup Trait (Infrastructure - WHOIS-like metadata)
// =============================================================================

#[async_trait]
pub trait BaseRegistrationLookup: Send + Sync {
    /// Registration metadata for a domain
    async fn lookup(&self, domain: &str) -> Result<RegistrationRecord>;
}

// =============================================================================
// Notifier Trait (Infrastructure - alert delivery)
// =============================================================================

#[async_trait]
pub trait BaseNotifier: Send + Sync {
    /// Deliver every finding. Stops at the first delivery failure.
    async fn notify(&self, findings: &SuspiciousSet) -> Result<()>;
}
