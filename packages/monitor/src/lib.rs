// Typosquat Monitor - Core
//
// Watches a list of domains for look-alike registrations: every watched domain
// is submitted to a permutation-scanning service, each discovered candidate is
// enriched with WHOIS registration data and classified, and suspicious
// candidates are reported to a webhook.

pub mod config;
pub mod domains;
pub mod kernel;

pub use config::*;
