//! Suspicion heuristics over registration metadata.
//!
//! A candidate is suspicious when any of these hold:
//! - its registration expired before `now`
//! - it was created after the cutoff
//! - its registration was updated after the cutoff
//!
//! Without a cutoff only the expiry rule applies. Absent dates never count.

use chrono::{DateTime, Utc};
use dnstwist_client::CandidateDomain;
use tracing::debug;

use super::models::{RegistrationRecord, SuspicionReason, Verdict, VerdictAttributes};

pub fn classify(
    candidate: &CandidateDomain,
    record: &RegistrationRecord,
    cutoff: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> Verdict {
    let mut reasons = Vec::new();

    if record.expires_at.is_some_and(|expires| expires < now) {
        reasons.push(SuspicionReason::Expired);
    }

    if let Some(cutoff) = cutoff {
        if record.created_at.is_some_and(|created| created > cutoff) {
            reasons.push(SuspicionReason::RecentlyCreated);
        }
        if record.updated_at.is_some_and(|updated| updated > cutoff) {
            reasons.push(SuspicionReason::RecentlyUpdated);
        }
    }

    for reason in &reasons {
        debug!(domain = %candidate.domain, reason = %reason, "Suspicious");
    }

    let suspicious = !reasons.is_empty();

    Verdict {
        suspicious,
        reasons,
        attributes: VerdictAttributes {
            suspicious,
            geo: candidate.geoip.clone().unwrap_or_default(),
            a_records: candidate.dns_a.join(", "),
            expires: render_date(record.expires_at),
            created: render_date(record.created_at),
            updated: render_date(record.updated_at),
            abuse: record.abuse_contact_email.clone().unwrap_or_default(),
        },
    }
}

fn render_date(date: Option<DateTime<Utc>>) -> String {
    date.map(|d| d.to_rfc2822()).unwrap_or_default()
}
