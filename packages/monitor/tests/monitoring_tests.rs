//! End-to-end tests for a monitoring run using mock services.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use chrono::Utc;
use monitor_core::domains::classification::RegistrationRecord;
use monitor_core::domains::monitoring::{notify_findings, run_watchlist, RunSettings};
use monitor_core::domains::notification::SlackNotifier;
use monitor_core::kernel::test_dependencies::TestDependencies;
use monitor_core::kernel::{
    BaseRegistrationLookup, CandidateDomain, MockNotifier, MockRegistrationLookup,
    MockScanService, MonitorDeps, WaitOptions,
};
use serde_json::Value;
use tokio_util::sync::CancellationToken;

type Received = Arc<Mutex<Vec<Value>>>;

fn settings(cutoff_days: Option<i64>) -> RunSettings {
    RunSettings {
        cutoff: cutoff_days.map(|days| Utc::now() - chrono::Duration::days(days)),
        wait: WaitOptions::default()
            .with_poll_interval(Duration::from_millis(10))
            .with_max_wait(Duration::from_secs(5)),
    }
}

fn watchlist(domains: &[&str]) -> Vec<String> {
    domains.iter().map(|d| d.to_string()).collect()
}

fn evi1() -> CandidateDomain {
    CandidateDomain::new("evi1.com", "homoglyph")
        .with_a_records(vec!["203.0.113.7".to_string()])
        .with_geoip("Netherlands")
}

fn created_days_ago(days: i64) -> RegistrationRecord {
    RegistrationRecord::default().with_created_at(Utc::now() - chrono::Duration::days(days))
}

#[tokio::test]
async fn recently_created_lookalike_is_reported() {
    let test = TestDependencies::new(
        MockScanService::new().with_results("example.com", vec![evi1()]),
        MockRegistrationLookup::new().with_record("evi1.com", created_days_ago(1)),
        MockNotifier::new(),
    );
    let deps = test.deps();

    let report = run_watchlist(
        &deps,
        &watchlist(&["example.com"]),
        &settings(Some(7)),
        &CancellationToken::new(),
    )
    .await;

    assert_eq!(report.scanned, 1);
    assert_eq!(report.failed, 0);
    assert_eq!(report.suspicious.len(), 1);
    let attrs = report.suspicious.get("evi1.com").unwrap();
    assert!(attrs.suspicious);
    assert_eq!(attrs.geo, "Netherlands");

    let sent = notify_findings(&deps, &report).await.unwrap();

    assert_eq!(sent, 1);
    let deliveries = test.notifier.deliveries();
    assert_eq!(deliveries.len(), 1);
    assert!(deliveries[0].contains("evi1.com"));
}

#[tokio::test]
async fn old_lookalike_is_not_reported() {
    let test = TestDependencies::new(
        MockScanService::new().with_results("example.com", vec![evi1()]),
        MockRegistrationLookup::new().with_record("evi1.com", created_days_ago(30)),
        MockNotifier::new(),
    );
    let deps = test.deps();

    let report = run_watchlist(
        &deps,
        &watchlist(&["example.com"]),
        &settings(Some(7)),
        &CancellationToken::new(),
    )
    .await;

    assert_eq!(report.candidates, 1);
    assert!(report.suspicious.is_empty());

    assert_eq!(notify_findings(&deps, &report).await.unwrap(), 0);
    assert!(test.notifier.deliveries().is_empty());
}

#[tokio::test]
async fn failing_domain_does_not_abort_the_run() {
    let test = TestDependencies::new(
        MockScanService::new()
            .with_submit_failure("broken.com")
            .with_fetch_failure("flaky.net")
            .with_results("example.com", vec![evi1()]),
        MockRegistrationLookup::new().with_record("evi1.com", created_days_ago(2)),
        MockNotifier::new(),
    );

    let report = run_watchlist(
        &test.deps(),
        &watchlist(&["broken.com", "nodothost", "flaky.net", "example.com"]),
        &settings(Some(7)),
        &CancellationToken::new(),
    )
    .await;

    assert_eq!(report.failed, 3);
    assert_eq!(report.scanned, 1);
    assert!(report.suspicious.contains("evi1.com"));
    assert_eq!(
        test.scanner.submitted(),
        vec!["broken.com", "flaky.net", "example.com"]
    );
    assert_eq!(test.scanner.fetched(), vec!["flaky.net", "example.com"]);
}

#[tokio::test]
async fn failed_lookup_still_classifies_candidate() {
    let test = TestDependencies::new(
        MockScanService::new().with_results(
            "example.com",
            vec![evi1(), CandidateDomain::new("exampel.com", "transposition")],
        ),
        MockRegistrationLookup::new()
            .with_failure("evi1.com")
            .with_record("exampel.com", created_days_ago(3)),
        MockNotifier::new(),
    );

    let report = run_watchlist(
        &test.deps(),
        &watchlist(&["example.com"]),
        &settings(Some(7)),
        &CancellationToken::new(),
    )
    .await;

    assert_eq!(test.registration.calls(), vec!["evi1.com", "exampel.com"]);
    assert_eq!(report.candidates, 2);
    assert!(!report.suspicious.contains("evi1.com"));
    assert!(report.suspicious.contains("exampel.com"));
}

#[tokio::test]
async fn expired_lookalike_is_reported_without_cutoff() {
    let expired = RegistrationRecord::default()
        .with_created_at(Utc::now() - chrono::Duration::minutes(10))
        .with_expires_at(Utc::now() - chrono::Duration::days(3));
    let fresh = created_days_ago(1);

    let test = TestDependencies::new(
        MockScanService::new().with_results(
            "example.com",
            vec![evi1(), CandidateDomain::new("examp1e.com", "homoglyph")],
        ),
        MockRegistrationLookup::new()
            .with_record("evi1.com", expired)
            .with_record("examp1e.com", fresh),
        MockNotifier::new(),
    );

    let report = run_watchlist(
        &test.deps(),
        &watchlist(&["example.com"]),
        &settings(None),
        &CancellationToken::new(),
    )
    .await;

    assert_eq!(report.suspicious.len(), 1);
    assert!(report.suspicious.contains("evi1.com"));
}

#[tokio::test]
async fn same_candidate_from_two_scans_is_kept_once() {
    let test = TestDependencies::new(
        MockScanService::new()
            .with_results("example.com", vec![evi1()])
            .with_results("example.net", vec![evi1()]),
        MockRegistrationLookup::new().with_record("evi1.com", created_days_ago(1)),
        MockNotifier::new(),
    );

    let report = run_watchlist(
        &test.deps(),
        &watchlist(&["example.com", "example.net"]),
        &settings(Some(7)),
        &CancellationToken::new(),
    )
    .await;

    assert_eq!(report.candidates, 2);
    assert_eq!(report.suspicious.len(), 1);
}

#[tokio::test]
async fn transient_progress_failures_are_retried() {
    let test = TestDependencies::new(
        MockScanService::new()
            .with_progress_failures(2)
            .with_results("example.com", vec![evi1()]),
        MockRegistrationLookup::new().with_record("evi1.com", created_days_ago(1)),
        MockNotifier::new(),
    );

    let report = run_watchlist(
        &test.deps(),
        &watchlist(&["example.com"]),
        &settings(Some(7)),
        &CancellationToken::new(),
    )
    .await;

    assert_eq!(report.failed, 0);
    assert!(report.suspicious.contains("evi1.com"));
}

#[tokio::test(start_paused = true)]
async fn stalled_scan_times_out_and_run_continues() {
    let test = TestDependencies::new(
        MockScanService::new()
            .with_stalled_scan("slow.com")
            .with_results("example.com", vec![evi1()]),
        MockRegistrationLookup::new().with_record("evi1.com", created_days_ago(1)),
        MockNotifier::new(),
    );
    let settings = RunSettings {
        cutoff: Some(Utc::now() - chrono::Duration::days(7)),
        wait: WaitOptions::default()
            .with_poll_interval(Duration::from_secs(3))
            .with_max_wait(Duration::from_secs(60)),
    };

    let report = run_watchlist(
        &test.deps(),
        &watchlist(&["slow.com", "example.com"]),
        &settings,
        &CancellationToken::new(),
    )
    .await;

    assert_eq!(report.failed, 1);
    assert_eq!(test.scanner.fetched(), vec!["example.com"]);
    assert!(report.suspicious.contains("evi1.com"));
}

#[tokio::test(start_paused = true)]
async fn cancellation_stops_the_run() {
    let test = TestDependencies::new(
        MockScanService::new()
            .with_stalled_scan("slow.com")
            .with_results("example.com", vec![evi1()]),
        MockRegistrationLookup::new(),
        MockNotifier::new(),
    );
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(1)).await;
        trigger.cancel();
    });

    let report = run_watchlist(
        &test.deps(),
        &watchlist(&["slow.com", "example.com"]),
        &settings(Some(7)),
        &cancel,
    )
    .await;

    assert!(report.cancelled);
    assert_eq!(report.failed, 1);
    assert_eq!(test.scanner.submitted(), vec!["slow.com"]);
}

/// Registration lookup that fires the run's cancellation token on its first call.
struct CancellingLookup {
    cancel: CancellationToken,
    calls: AtomicUsize,
}

#[async_trait]
impl BaseRegistrationLookup for CancellingLookup {
    async fn lookup(&self, _domain: &str) -> anyhow::Result<RegistrationRecord> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.cancel.cancel();
        Ok(created_days_ago(1))
    }
}

#[tokio::test]
async fn cancellation_during_enrichment_skips_remaining_candidates() {
    let candidates: Vec<CandidateDomain> = (0..50)
        .map(|i| CandidateDomain::new(format!("examp{}e.com", i), "replacement"))
        .collect();
    let scanner = Arc::new(
        MockScanService::new()
            .with_results("example.com", candidates)
            .with_results("example.net", vec![evi1()]),
    );
    let cancel = CancellationToken::new();
    let lookup = Arc::new(CancellingLookup {
        cancel: cancel.clone(),
        calls: AtomicUsize::new(0),
    });
    let deps = MonitorDeps::new(scanner.clone(), lookup.clone(), None);

    let report = run_watchlist(
        &deps,
        &watchlist(&["example.com", "example.net"]),
        &settings(Some(7)),
        &cancel,
    )
    .await;

    assert_eq!(lookup.calls.load(Ordering::SeqCst), 1);
    assert!(report.cancelled);
    assert_eq!(report.candidates, 1);
    assert_eq!(report.scanned, 0);
    assert!(report.suspicious.contains("examp0e.com"));
    assert_eq!(scanner.submitted(), vec!["example.com"]);
}

#[tokio::test]
async fn notifier_failure_is_returned_not_panicked() {
    let test = TestDependencies::new(
        MockScanService::new().with_results("example.com", vec![evi1()]),
        MockRegistrationLookup::new().with_record("evi1.com", created_days_ago(1)),
        MockNotifier::failing(),
    );
    let deps = test.deps();

    let report = run_watchlist(
        &deps,
        &watchlist(&["example.com"]),
        &settings(Some(7)),
        &CancellationToken::new(),
    )
    .await;

    assert!(notify_findings(&deps, &report).await.is_err());
    assert_eq!(test.notifier.deliveries().len(), 1);
}

#[tokio::test]
async fn reserved_key_is_never_notified() {
    let test = TestDependencies::new(
        MockScanService::new().with_results(
            "example.com",
            vec![evi1(), CandidateDomain::new("suspicious", "various")],
        ),
        MockRegistrationLookup::new()
            .with_record("evi1.com", created_days_ago(1))
            .with_record("suspicious", created_days_ago(1)),
        MockNotifier::new(),
    );
    let deps = test.deps();

    let report = run_watchlist(
        &deps,
        &watchlist(&["example.com"]),
        &settings(Some(7)),
        &CancellationToken::new(),
    )
    .await;
    assert_eq!(report.suspicious.len(), 2);

    notify_findings(&deps, &report).await.unwrap();

    let delivered = &test.notifier.deliveries()[0];
    assert_eq!(delivered.len(), 1);
    assert!(!delivered.contains("suspicious"));
}

#[tokio::test]
async fn no_notifier_configured_skips_notification() {
    let test = TestDependencies::new(
        MockScanService::new().with_results("example.com", vec![evi1()]),
        MockRegistrationLookup::new().with_record("evi1.com", created_days_ago(1)),
        MockNotifier::new(),
    );
    let deps = test.deps_without_notifier();

    let report = run_watchlist(
        &deps,
        &watchlist(&["example.com"]),
        &settings(Some(7)),
        &CancellationToken::new(),
    )
    .await;

    assert_eq!(notify_findings(&deps, &report).await.unwrap(), 0);
    assert!(test.notifier.deliveries().is_empty());
}

#[tokio::test]
async fn slack_receives_one_message_per_suspicious_domain() {
    let received: Received = Arc::new(Mutex::new(Vec::new()));
    let app = Router::new()
        .route(
            "/hook",
            post(
                |State(received): State<Received>, Json(body): Json<Value>| async move {
                    received.lock().unwrap().push(body);
                    "ok"
                },
            ),
        )
        .with_state(received.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let scanner = Arc::new(MockScanService::new().with_results("example.com", vec![evi1()]));
    let registration = Arc::new(
        MockRegistrationLookup::new().with_record("evi1.com", created_days_ago(1)),
    );
    let slack = Arc::new(SlackNotifier::new(format!("http://{}/hook", addr)).unwrap());
    let deps = MonitorDeps::new(scanner, registration, Some(slack));

    let report = run_watchlist(
        &deps,
        &watchlist(&["example.com"]),
        &settings(Some(7)),
        &CancellationToken::new(),
    )
    .await;
    notify_findings(&deps, &report).await.unwrap();

    let received = received.lock().unwrap();
    assert_eq!(received.len(), 1);
    let blocks = received[0]["blocks"].as_array().unwrap();
    assert_eq!(blocks.len(), 2);
    assert_eq!(
        blocks[0]["text"]["text"],
        "*Suspicious domain detected:* evi1.com\n"
    );
    let listing = blocks[1]["text"]["text"].as_str().unwrap();
    assert!(listing.starts_with("suspicious: true\ngeo: Netherlands\na_records: 203.0.113.7\n"));
}
