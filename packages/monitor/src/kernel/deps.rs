//! Monitor dependencies for activities (using traits for testability)
//!
//! This module provides the dependency container used by the monitoring activities.
//! All external services use trait abstractions to enable testing.

use anyhow::{Context, Result};
use async_trait::async_trait;
use dnstwist_client::ScanService;
use std::sync::Arc;
use whois_client::{WhoisClient, WhoisRecord};

use crate::domains::classification::RegistrationRecord;
use crate::kernel::{BaseNotifier, BaseRegistrationLookup};

// =============================================================================
// WhoisClient Adapter (implements BaseRegistrationLookup trait)
// =============================================================================

/// Wrapper around WhoisClient that implements BaseRegistrationLookup trait
pub struct WhoisAdapter(pub Arc<WhoisClient>);

impl WhoisAdapter {
    pub fn new(client: Arc<WhoisClient>) -> Self {
        Self(client)
    }
}

#[async_trait]
impl BaseRegistrationLookup for WhoisAdapter {
    async fn lookup(&self, domain: &str) -> Result<RegistrationRecord> {
        let ascii = whois_client::to_ascii(domain).unwrap_or_else(|e| {
            tracing::warn!(domain, error = %e, "Could not convert domain to ascii");
            domain.to_string()
        });
        let query = whois_client::registrable_name(&ascii);

        let raw = self
            .0
            .lookup_with_retry(query)
            .await
            .with_context(|| format!("could not retrieve whois for {}", query))?;

        let record = match whois_client::parse(&raw) {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!(domain, error = %e, whois_raw = %raw, "Could not parse whois");
                return Err(e).with_context(|| format!("could not parse whois for {}", query));
            }
        };

        Ok(record.into())
    }
}

impl From<WhoisRecord> for RegistrationRecord {
    fn from(record: WhoisRecord) -> Self {
        Self {
            created_at: record.created_at,
            updated_at: record.updated_at,
            expires_at: record.expires_at,
            abuse_contact_email: record.registrar_email,
        }
    }
}

// =============================================================================
// MonitorDeps
// =============================================================================

/// Monitor dependencies accessible to activities (using traits for testability)
#[derive(Clone)]
pub struct MonitorDeps {
    /// Permutation scanning service (dnstwist in production)
    pub scanner: Arc<dyn ScanService>,
    pub registration: Arc<dyn BaseRegistrationLookup>,
    /// Alert destination; `None` when no webhook is configured
    pub notifier: Option<Arc<dyn BaseNotifier>>,
}

impl MonitorDeps {
    pub fn new(
        scanner: Arc<dyn ScanService>,
        registration: Arc<dyn BaseRegistrationLookup>,
        notifier: Option<Arc<dyn BaseNotifier>>,
    ) -> Self {
        Self {
            scanner,
            registration,
            notifier,
        }
    }
}
