use serde::{Deserialize, Serialize};

use crate::error::ScanError;

/// Body for `POST /api/scans`.
#[derive(Debug, Clone, Serialize)]
pub struct ScanRequest {
    pub url: String,
}

/// Scan metadata returned by both the submit and the progress endpoints.
///
/// Counts are signed on the wire; [`ScanProgress`] is the validated form.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScanResponse {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub total: i64,
    #[serde(default)]
    pub registered: i64,
    #[serde(default)]
    pub complete: i64,
    pub remaining: i64,
    #[serde(default)]
    pub timestamp: i64,
}

/// Opaque scan identifier issued by the service.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ScanHandle(String);

impl ScanHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl std::fmt::Display for ScanHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Progress counters for a running scan. `remaining == 0` means done.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ScanProgress {
    pub complete: u64,
    pub registered: u64,
    pub remaining: u64,
    pub total: u64,
}

impl ScanProgress {
    pub fn is_finished(&self) -> bool {
        self.remaining == 0
    }
}

impl TryFrom<&ScanResponse> for ScanProgress {
    type Error = ScanError;

    fn try_from(resp: &ScanResponse) -> Result<Self, Self::Error> {
        let remaining = u64::try_from(resp.remaining).map_err(|_| {
            ScanError::InvalidData(format!("invalid remaining returned: {}", resp.remaining))
        })?;
        let count = |name: &str, value: i64| {
            u64::try_from(value).map_err(|_| {
                ScanError::InvalidData(format!("invalid {} returned: {}", name, value))
            })
        };

        Ok(Self {
            complete: count("complete", resp.complete)?,
            registered: count("registered", resp.registered)?,
            remaining,
            total: count("total", resp.total)?,
        })
    }
}

/// A single permutation result from `GET /api/scans/{id}/domains`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateDomain {
    pub domain: String,
    #[serde(default)]
    pub fuzzer: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dns_a: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dns_aaaa: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dns_mx: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dns_ns: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geoip: Option<String>,
}

impl CandidateDomain {
    pub fn new(domain: impl Into<String>, fuzzer: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            fuzzer: fuzzer.into(),
            dns_a: Vec::new(),
            dns_aaaa: Vec::new(),
            dns_mx: Vec::new(),
            dns_ns: Vec::new(),
            geoip: None,
        }
    }

    pub fn with_a_records(mut self, records: Vec<String>) -> Self {
        self.dns_a = records;
        self
    }

    pub fn with_geoip(mut self, geoip: impl Into<String>) -> Self {
        self.geoip = Some(geoip.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_round_trips_through_json() {
        let progress = ScanProgress {
            complete: 120,
            registered: 14,
            remaining: 33,
            total: 153,
        };

        let json = serde_json::to_string(&progress).unwrap();
        let decoded: ScanProgress = serde_json::from_str(&json).unwrap();

        assert_eq!(decoded, progress);
    }

    #[test]
    fn candidate_round_trips_through_json() {
        let candidate = CandidateDomain {
            domain: "examp1e.com".to_string(),
            fuzzer: "homoglyph".to_string(),
            dns_a: vec!["93.184.216.34".to_string()],
            dns_aaaa: vec!["2606:2800:220:1::".to_string()],
            dns_mx: vec!["mx.examp1e.com".to_string()],
            dns_ns: vec!["ns1.registrar.net".to_string(), "ns2.registrar.net".to_string()],
            geoip: Some("United States".to_string()),
        };

        let json = serde_json::to_string(&candidate).unwrap();
        let decoded: CandidateDomain = serde_json::from_str(&json).unwrap();

        assert_eq!(decoded, candidate);
    }

    #[test]
    fn candidate_without_dns_data_decodes() {
        let decoded: CandidateDomain =
            serde_json::from_str(r#"{"domain": "exmaple.com", "fuzzer": "transposition"}"#)
                .unwrap();

        assert_eq!(decoded, CandidateDomain::new("exmaple.com", "transposition"));
    }

    #[test]
    fn negative_remaining_is_invalid_data() {
        let resp: ScanResponse = serde_json::from_str(
            r#"{"id": "abc", "url": "example.com", "total": 10, "registered": 2,
                "complete": 4, "remaining": -1, "timestamp": 1700000000}"#,
        )
        .unwrap();

        let err = ScanProgress::try_from(&resp).unwrap_err();
        assert!(matches!(err, ScanError::InvalidData(_)));
    }

    #[test]
    fn blank_handle_is_empty() {
        assert!(ScanHandle::new("").is_empty());
        assert!(ScanHandle::new("  ").is_empty());
        assert!(!ScanHandle::new("c2a1").is_empty());
    }
}
