//! Typosquat monitor
//!
//! Runs one pass over the configured watch-list and reports suspicious
//! look-alike domains.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use monitor_core::config::Config;
use monitor_core::domains::monitoring::{notify_findings, run_watchlist, RunSettings};
use monitor_core::domains::notification::SlackNotifier;
use monitor_core::kernel::{BaseNotifier, DnstwistClient, MonitorDeps, WhoisAdapter};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use whois_client::WhoisClient;

#[derive(Parser)]
#[command(name = "typosquat-monitor")]
#[command(about = "Watch domains for typosquatting look-alikes")]
struct Cli {
    /// The TOML configuration file
    #[arg(long, short)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref()).context("failed to load configuration")?;
    config.validate().context("invalid configuration")?;

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.log.level.as_str().into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    if config.domains.watchlist.is_empty() {
        tracing::warn!("Watchlist is empty, nothing will be monitored");
    }

    let cutoff = config
        .cutoff(Utc::now())
        .context("invalid created_since provided")?;

    let scanner = DnstwistClient::with_timeout(config.scanner.url.clone(), config.request_timeout())
        .context("Failed to create scan client")?;
    let whois = WhoisClient::new(config.whois_options());
    let notifier: Option<Arc<dyn BaseNotifier>> = match config.webhook() {
        Some(webhook) => Some(Arc::new(
            SlackNotifier::new(webhook).context("Failed to create Slack notifier")?,
        )),
        None => None,
    };

    let deps = MonitorDeps::new(
        Arc::new(scanner),
        Arc::new(WhoisAdapter::new(Arc::new(whois))),
        notifier,
    );

    let cancel = CancellationToken::new();
    let shutdown = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Shutdown requested, cancelling run");
            shutdown.cancel();
        }
    });

    tracing::info!(
        whitelist = config.domains.whitelist.len(),
        scanner = %config.scanner.url,
        "Configuration loaded"
    );

    let settings = RunSettings {
        cutoff,
        wait: config.wait_options(),
    };
    let report = run_watchlist(&deps, &config.domains.watchlist, &settings, &cancel).await;

    match notify_findings(&deps, &report).await {
        Ok(0) => {}
        Ok(count) => tracing::debug!(count, "Sent notifications"),
        Err(e) => tracing::error!(error = %e, "Could not report suspicious domains"),
    }

    tracing::info!("Finished");
    Ok(())
}
