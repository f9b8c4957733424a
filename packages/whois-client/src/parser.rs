//! Raw WHOIS text parsing.
//!
//! Registries disagree on field names and date formats, so parsing is a
//! best-effort scan over `key: value` lines. The first occurrence of a field
//! wins, which keeps registry data ahead of registrar data when both are
//! concatenated.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, WhoisError};

/// Registration metadata extracted from a WHOIS response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WhoisRecord {
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
    pub registrar_email: Option<String>,
}

const CREATED_KEYS: &[&str] = &[
    "creation date",
    "created date",
    "created",
    "created on",
    "registered on",
    "registered",
    "registration time",
    "domain registration date",
];

const UPDATED_KEYS: &[&str] = &[
    "updated date",
    "updated",
    "last updated",
    "last updated on",
    "last-update",
    "last modified",
    "modified",
    "changed",
];

const EXPIRES_KEYS: &[&str] = &[
    "registry expiry date",
    "registrar registration expiration date",
    "expiration date",
    "expiry date",
    "expire date",
    "expires",
    "expires on",
    "paid-till",
    "renewal date",
];

const ABUSE_EMAIL_KEYS: &[&str] = &[
    "registrar abuse contact email",
    "abuse contact email",
    "abuse-mailbox",
];

const REGISTRAR_EMAIL_KEYS: &[&str] = &["registrar email", "registrar contact email"];

const NOT_FOUND_MARKERS: &[&str] = &[
    "no match for",
    "not found",
    "no data found",
    "no entries found",
    "no object found",
    "status: free",
    "status: available",
];

/// Parse a raw WHOIS response.
pub fn parse(raw: &str) -> Result<WhoisRecord> {
    let mut record = WhoisRecord::default();
    let mut fallback_email = None;
    let mut fields = 0usize;

    for (key, value) in fields_of(raw) {
        fields += 1;

        if CREATED_KEYS.contains(&key.as_str()) {
            fill_date(&mut record.created_at, value);
        } else if UPDATED_KEYS.contains(&key.as_str()) {
            fill_date(&mut record.updated_at, value);
        } else if EXPIRES_KEYS.contains(&key.as_str()) {
            fill_date(&mut record.expires_at, value);
        } else if ABUSE_EMAIL_KEYS.contains(&key.as_str()) {
            if record.registrar_email.is_none() && value.contains('@') {
                record.registrar_email = Some(value.to_string());
            }
        } else if REGISTRAR_EMAIL_KEYS.contains(&key.as_str())
            && fallback_email.is_none()
            && value.contains('@')
        {
            fallback_email = Some(value.to_string());
        }
    }

    if record.registrar_email.is_none() {
        record.registrar_email = fallback_email;
    }

    if record == WhoisRecord::default() {
        let lowered = raw.to_lowercase();
        if raw.trim().is_empty() || NOT_FOUND_MARKERS.iter().any(|m| lowered.contains(m)) {
            return Err(WhoisError::NotFound);
        }
        if fields == 0 {
            return Err(WhoisError::Parse("no key/value fields in response".to_string()));
        }
    }

    Ok(record)
}

/// `(lowercased key, trimmed value)` pairs for every non-comment line.
fn fields_of(raw: &str) -> impl Iterator<Item = (String, &str)> {
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('%') && !line.starts_with('#'))
        .filter(|line| !line.starts_with(">>>"))
        .filter_map(|line| line.split_once(':'))
        .map(|(key, value)| (key.trim().to_lowercase(), value.trim()))
        .filter(|(_, value)| !value.is_empty())
}

fn fill_date(slot: &mut Option<DateTime<Utc>>, value: &str) {
    if slot.is_none() {
        *slot = parse_date(value);
    }
}

/// Parse the date formats registries commonly use.
pub fn parse_date(value: &str) -> Option<DateTime<Utc>> {
    let value = value
        .trim()
        .trim_end_matches("(UTC)")
        .trim_end_matches("UTC")
        .trim_end_matches("GMT")
        .trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }

    let naive = value.trim_end_matches('Z');
    for format in [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S",
        "%d-%b-%Y %H:%M:%S",
        "%Y.%m.%d %H:%M:%S",
        "%Y/%m/%d %H:%M:%S",
    ] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(naive, format) {
            return Some(dt.and_utc());
        }
    }

    for format in ["%Y-%m-%d", "%d-%b-%Y", "%d.%m.%Y", "%Y.%m.%d", "%Y/%m/%d"] {
        if let Ok(date) = NaiveDate::parse_from_str(naive, format) {
            return date.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc());
        }
    }

    None
}
