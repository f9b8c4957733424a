//! Waiting for a scan to complete.
//!
//! A background task polls the scan progress on a fixed interval while the
//! caller races it against the overall deadline and the cancellation token.
//! Individual poll failures are logged and retried; only the deadline or a
//! cancellation ends the wait unsuccessfully.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

use crate::error::{Result, ScanError};
use crate::service::ScanService;
use crate::types::ScanHandle;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(3);
pub const DEFAULT_MAX_WAIT: Duration = Duration::from_secs(10 * 60);

#[derive(Debug, Clone)]
pub struct WaitOptions {
    /// Delay between two progress polls.
    pub poll_interval: Duration,
    /// Overall deadline for the scan to finish.
    pub max_wait: Duration,
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            max_wait: DEFAULT_MAX_WAIT,
        }
    }
}

impl WaitOptions {
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_max_wait(mut self, max_wait: Duration) -> Self {
        self.max_wait = max_wait;
        self
    }
}

/// Wait until `handle` reports zero remaining permutations.
///
/// Returns [`ScanError::Timeout`] once `options.max_wait` elapses and
/// [`ScanError::Cancelled`] if `cancel` fires first. In both cases the poll
/// task is told to stop at its next checkpoint rather than aborted.
pub async fn wait_for_scan(
    service: Arc<dyn ScanService>,
    handle: &ScanHandle,
    options: &WaitOptions,
    cancel: &CancellationToken,
) -> Result<()> {
    if handle.is_empty() {
        return Err(ScanError::InvalidInput("cannot wait on empty handle".to_string()));
    }

    let stop = cancel.child_token();

    debug!(handle = %handle, "Spawning scan poll task");
    let mut poller = tokio::spawn(poll_until_finished(
        service,
        handle.clone(),
        options.poll_interval,
        stop.clone(),
    ));

    let outcome = tokio::select! {
        biased;

        joined = &mut poller => match joined {
            Ok(true) => Ok(()),
            Ok(false) => Err(ScanError::Cancelled),
            Err(e) => Err(ScanError::Protocol(format!("scan poll task failed: {}", e))),
        },
        _ = cancel.cancelled() => Err(ScanError::Cancelled),
        _ = tokio::time::sleep(options.max_wait) => Err(ScanError::Timeout(options.max_wait)),
    };

    match &outcome {
        Ok(()) => debug!(handle = %handle, "Scan poll task finished"),
        Err(e) => {
            debug!(handle = %handle, error = %e, "Abandoning scan poll task");
            stop.cancel();
        }
    }

    outcome
}

/// Poll until the scan is finished (`true`) or `stop` fires (`false`).
async fn poll_until_finished(
    service: Arc<dyn ScanService>,
    handle: ScanHandle,
    interval: Duration,
    stop: CancellationToken,
) -> bool {
    loop {
        if stop.is_cancelled() {
            return false;
        }

        match service.get_progress(&handle).await {
            Ok(progress) if progress.is_finished() => return true,
            Ok(progress) => debug!(
                handle = %handle,
                remaining = progress.remaining,
                total = progress.total,
                "Scan still in progress"
            ),
            Err(e) => error!(
                handle = %handle,
                error = %e,
                "Could not retrieve scan progress, retrying"
            ),
        }

        tokio::select! {
            _ = stop.cancelled() => return false,
            _ = tokio::time::sleep(interval) => {}
        }
    }
}
