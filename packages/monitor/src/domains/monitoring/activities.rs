//! Monitoring activities - the per-run pipeline
//!
//! Each watched domain goes through submit → wait → fetch → enrich. A failure
//! in any step is logged and the run moves on to the next watched domain; a
//! failed registration lookup only degrades that candidate. Cancellation is
//! honoured between watched domains, during the wait and between candidates.

use anyhow::Result;
use chrono::{DateTime, Utc};
use dnstwist_client::{wait_for_scan, CandidateDomain};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::domains::classification::{classify, RegistrationRecord, Verdict};
use crate::domains::monitoring::models::{
    DomainFailure, DomainStage, RunReport, RunSettings,
};
use crate::kernel::MonitorDeps;

/// Scan every watched domain in order and collect the suspicious candidates.
pub async fn run_watchlist(
    deps: &MonitorDeps,
    watchlist: &[String],
    settings: &RunSettings,
    cancel: &CancellationToken,
) -> RunReport {
    let total = watchlist.len();
    let mut report = RunReport::default();

    info!(domains = total, cutoff = ?settings.cutoff, "Starting monitoring");

    for (i, domain) in watchlist.iter().enumerate() {
        if cancel.is_cancelled() {
            warn!(remaining = total - i, "Run cancelled, skipping remaining domains");
            report.cancelled = true;
            break;
        }

        info!(domain = %domain, progress = %format!("{}/{}", i + 1, total), "Monitoring domain");

        let candidates = match scan_domain(deps, domain, settings, cancel).await {
            Ok(candidates) => candidates,
            Err(failure) => {
                error!(
                    domain = %domain,
                    stage = %failure.stage,
                    error = %failure.source,
                    "Could not complete domain check"
                );
                report.failed += 1;
                continue;
            }
        };

        info!(domain = %domain, results = candidates.len(), "Enumerated potential attack domains");
        debug!(domain = %domain, stage = %DomainStage::Enriching, "Classifying candidates");

        let mut classified = 0;
        for candidate in &candidates {
            let verdict = tokio::select! {
                biased;

                _ = cancel.cancelled() => None,
                verdict = enrich_candidate(deps, candidate, settings.cutoff) => Some(verdict),
            };
            let Some(verdict) = verdict else {
                warn!(
                    domain = %domain,
                    remaining = candidates.len() - classified,
                    "Run cancelled, skipping remaining candidates"
                );
                report.cancelled = true;
                break;
            };
            classified += 1;
            let attrs = &verdict.attributes;

            info!(
                domain = %domain,
                attack_domain = %candidate.domain,
                fuzzer = %candidate.fuzzer,
                suspicious = attrs.suspicious,
                geo = %attrs.geo,
                a_records = %attrs.a_records,
                expires = %attrs.expires,
                created = %attrs.created,
                updated = %attrs.updated,
                abuse = %attrs.abuse,
                "Classified candidate"
            );

            if verdict.suspicious {
                report
                    .suspicious
                    .insert(candidate.domain.clone(), verdict.attributes);
            }
        }

        report.candidates += classified;
        if report.cancelled {
            break;
        }
        report.scanned += 1;
        debug!(domain = %domain, stage = %DomainStage::Done, "Domain check finished");
    }

    info!(
        scanned = report.scanned,
        failed = report.failed,
        candidates = report.candidates,
        suspicious_domains = report.suspicious.len(),
        "Concluded suspicious domains"
    );

    report
}

/// Submit `domain`, wait for the scan to finish and fetch its candidates.
pub async fn scan_domain(
    deps: &MonitorDeps,
    domain: &str,
    settings: &RunSettings,
    cancel: &CancellationToken,
) -> std::result::Result<Vec<CandidateDomain>, DomainFailure> {
    let handle = deps
        .scanner
        .submit(domain)
        .await
        .map_err(DomainFailure::at(DomainStage::Submitted))?;
    debug!(domain, handle = %handle, "Scan submitted");

    wait_for_scan(deps.scanner.clone(), &handle, &settings.wait, cancel)
        .await
        .map_err(DomainFailure::at(DomainStage::Waiting))?;

    deps.scanner
        .fetch_results(&handle)
        .await
        .map_err(DomainFailure::at(DomainStage::Fetched))
}

/// Look up registration data for a candidate and classify it.
///
/// A failed lookup classifies the candidate with every registration field absent.
pub async fn enrich_candidate(
    deps: &MonitorDeps,
    candidate: &CandidateDomain,
    cutoff: Option<DateTime<Utc>>,
) -> Verdict {
    let record = match deps.registration.lookup(&candidate.domain).await {
        Ok(record) => record,
        Err(e) => {
            warn!(attack_domain = %candidate.domain, error = %e, "Could not retrieve whois");
            RegistrationRecord::default()
        }
    };

    classify(candidate, &record, cutoff, Utc::now())
}

/// Hand the run's findings to the notifier, if one is configured.
///
/// Returns how many domains were reported.
pub async fn notify_findings(deps: &MonitorDeps, report: &RunReport) -> Result<usize> {
    let Some(notifier) = deps.notifier.as_ref() else {
        debug!("No notification destination configured");
        return Ok(0);
    };

    let findings = report.suspicious.reportable();
    if findings.is_empty() {
        debug!("Nothing to report");
        return Ok(0);
    }

    debug!(count = findings.len(), "Reporting suspicious domains");
    notifier.notify(&findings).await?;

    Ok(findings.len())
}
