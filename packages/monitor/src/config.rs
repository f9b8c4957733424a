use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use dnstwist_client::WaitOptions;
use serde::Deserialize;
use std::env;
use std::path::Path;
use std::time::Duration;
use whois_client::WhoisOptions;

const DEFAULT_LOG_LEVEL: &str = "info";
const MIN_ALLOWLIST_ENTRY_LEN: usize = 3;

/// Monitor configuration loaded from an optional TOML file and environment variables
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub log: LogConfig,
    pub domains: DomainsConfig,
    pub slack: SlackConfig,
    pub scanner: ScannerConfig,
    pub whois: WhoisConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub level: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DomainsConfig {
    /// Domains owned by the operator. Only validated.
    #[serde(alias = "allowlist")]
    pub whitelist: Vec<String>,
    pub watchlist: Vec<String>,
    /// Registrations newer than this (e.g. `168h`, `7days`) are suspicious
    pub created_since: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SlackConfig {
    pub webhook: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScannerConfig {
    pub url: String,
    pub poll_interval_secs: u64,
    pub max_wait_secs: u64,
    pub request_timeout_secs: u64,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            url: dnstwist_client::DEFAULT_BASE_URL.to_string(),
            poll_interval_secs: 3,
            max_wait_secs: 600,
            request_timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WhoisConfig {
    pub server: String,
    pub attempts: u32,
    pub timeout_secs: u64,
}

impl Default for WhoisConfig {
    fn default() -> Self {
        Self {
            server: whois_client::IANA_WHOIS_SERVER.to_string(),
            attempts: whois_client::DEFAULT_MAX_ATTEMPTS,
            timeout_secs: 10,
        }
    }
}

impl Config {
    /// Load configuration from `path` (if any), then apply environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenvy::dotenv();

        let mut config = match path {
            Some(path) => {
                let contents = std::fs::read_to_string(path).with_context(|| {
                    format!("failed to load configuration file at '{}'", path.display())
                })?;
                Self::from_toml(&contents)?
            }
            None => Self::default(),
        };

        config.apply_env(|name| env::var(name).ok());
        Ok(config)
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        toml::from_str(contents).context("failed to parse configuration")
    }

    /// Override fields with the variables `lookup` knows about
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(level) = lookup("LOG_LEVEL") {
            self.log.level = level;
        }
        if let Some(list) = lookup("DOMAIN_WHITELIST") {
            self.domains.whitelist = split_list(&list);
        }
        if let Some(list) = lookup("DOMAIN_WATCHLIST") {
            self.domains.watchlist = split_list(&list);
        }
        if let Some(since) = lookup("DOMAIN_CREATED_SINCE") {
            self.domains.created_since = Some(since);
        }
        if let Some(webhook) = lookup("SLACK_WEBHOOK") {
            self.slack.webhook = Some(webhook);
        }
        if let Some(url) = lookup("DNSTWIST_URL") {
            self.scanner.url = url;
        }
    }

    /// Fill defaults and reject unusable settings
    pub fn validate(&mut self) -> Result<()> {
        if self.log.level.trim().is_empty() {
            self.log.level = DEFAULT_LOG_LEVEL.to_string();
        }
        self.log.level = self.log.level.trim().to_lowercase();
        self.log
            .level
            .parse::<tracing::Level>()
            .map_err(|_| anyhow::anyhow!("invalid log level: {}", self.log.level))?;

        if let Some(entry) = self
            .domains
            .whitelist
            .iter()
            .find(|entry| entry.len() < MIN_ALLOWLIST_ENTRY_LEN)
        {
            anyhow::bail!(
                "whitelist entry {:?} must be at least {} characters",
                entry,
                MIN_ALLOWLIST_ENTRY_LEN
            );
        }

        self.created_since()?;

        if let Some(webhook) = self.slack.webhook.as_deref().filter(|w| !w.is_empty()) {
            let url = url::Url::parse(webhook).context("invalid Slack webhook URL")?;
            if !matches!(url.scheme(), "http" | "https") {
                anyhow::bail!("Slack webhook must be an http(s) URL");
            }
        }

        url::Url::parse(&self.scanner.url).context("invalid scanner URL")?;
        if self.scanner.poll_interval_secs == 0 || self.scanner.max_wait_secs == 0 {
            anyhow::bail!("scanner poll interval and max wait must be non-zero");
        }
        if self.scanner.request_timeout_secs == 0 || self.whois.timeout_secs == 0 {
            anyhow::bail!("request timeouts must be non-zero");
        }

        Ok(())
    }

    /// `created_since` as a duration, `None` when unset
    pub fn created_since(&self) -> Result<Option<Duration>> {
        match self.domains.created_since.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(since) => humantime::parse_duration(since)
                .map(Some)
                .with_context(|| format!("invalid created_since provided: {}", since)),
        }
    }

    /// Registrations after this moment are suspicious. `None` disables the date rules.
    pub fn cutoff(&self, now: DateTime<Utc>) -> Result<Option<DateTime<Utc>>> {
        let Some(since) = self.created_since()? else {
            return Ok(None);
        };

        let since = chrono::Duration::from_std(since).context("created_since is too large")?;
        now.checked_sub_signed(since)
            .map(Some)
            .context("created_since reaches before the supported date range")
    }

    /// The configured webhook, if any
    pub fn webhook(&self) -> Option<&str> {
        self.slack.webhook.as_deref().filter(|w| !w.is_empty())
    }

    pub fn wait_options(&self) -> WaitOptions {
        WaitOptions::default()
            .with_poll_interval(Duration::from_secs(self.scanner.poll_interval_secs))
            .with_max_wait(Duration::from_secs(self.scanner.max_wait_secs))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.scanner.request_timeout_secs)
    }

    pub fn whois_options(&self) -> WhoisOptions {
        WhoisOptions {
            server: self.whois.server.clone(),
            timeout: Duration::from_secs(self.whois.timeout_secs),
            max_attempts: self.whois.attempts,
            ..WhoisOptions::default()
        }
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
