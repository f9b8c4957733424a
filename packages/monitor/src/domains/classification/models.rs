use chrono::{DateTime, Utc};
use serde::Serialize;

/// Registry metadata for a candidate domain. Every field is optional because
/// registries differ in what they expose, and a failed lookup leaves all of
/// them empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistrationRecord {
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
    pub abuse_contact_email: Option<String>,
}

impl RegistrationRecord {
    pub fn with_created_at(mut self, at: DateTime<Utc>) -> Self {
        self.created_at = Some(at);
        self
    }

    pub fn with_updated_at(mut self, at: DateTime<Utc>) -> Self {
        self.updated_at = Some(at);
        self
    }

    pub fn with_expires_at(mut self, at: DateTime<Utc>) -> Self {
        self.expires_at = Some(at);
        self
    }

    pub fn with_abuse_contact(mut self, email: impl Into<String>) -> Self {
        self.abuse_contact_email = Some(email.into());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuspicionReason {
    /// Registration already expired
    Expired,
    /// Registered after the cutoff
    RecentlyCreated,
    /// Registration changed after the cutoff
    RecentlyUpdated,
}

impl std::fmt::Display for SuspicionReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let reason = match self {
            SuspicionReason::Expired => "domain expiration is before today",
            SuspicionReason::RecentlyCreated => "domain recently created",
            SuspicionReason::RecentlyUpdated => "domain recently updated",
        };
        f.write_str(reason)
    }
}

/// Reportable attributes of a classified domain. Missing values are empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct VerdictAttributes {
    pub suspicious: bool,
    pub geo: String,
    pub a_records: String,
    pub expires: String,
    pub created: String,
    pub updated: String,
    pub abuse: String,
}

impl VerdictAttributes {
    /// `(key, value)` pairs in reporting order.
    pub fn fields(&self) -> [(&'static str, String); 7] {
        [
            ("suspicious", self.suspicious.to_string()),
            ("geo", self.geo.clone()),
            ("a_records", self.a_records.clone()),
            ("expires", self.expires.clone()),
            ("created", self.created.clone()),
            ("updated", self.updated.clone()),
            ("abuse", self.abuse.clone()),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub suspicious: bool,
    pub reasons: Vec<SuspicionReason>,
    pub attributes: VerdictAttributes,
}
