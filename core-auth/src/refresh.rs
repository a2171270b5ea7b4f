//! Proactive refresh task.
//!
//! One deferred task per session: it sleeps for the check interval, runs a
//! check, then re-arms. The check decides whether the loop continues.

use core_async::sync::CancellationToken;
use core_async::task::spawn;
use core_async::time::{sleep, Duration};
use std::future::Future;
use std::sync::{Mutex, MutexGuard};
use tracing::debug;

/// Result of one scheduled check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Continue,
    Stop,
}

/// Owner of the single re-armed refresh task.
#[derive(Default)]
pub struct RefreshScheduler {
    running: Mutex<Option<CancellationToken>>,
}

impl RefreshScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    fn running(&self) -> MutexGuard<'_, Option<CancellationToken>> {
        self.running
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Start the task, replacing any running one.
    ///
    /// `check` runs after every `interval`; returning [`TickOutcome::Stop`]
    /// ends the task.
    pub fn start<F, Fut>(&self, interval: Duration, check: F)
    where
        F: Fn() -> Fut + Send + 'static,
        Fut: Future<Output = TickOutcome> + Send + 'static,
    {
        let cancel = CancellationToken::new();
        if let Some(previous) = self.running().replace(cancel.clone()) {
            previous.cancel();
        }

        spawn(async move {
            loop {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => break,
                    _ = sleep(interval) => {}
                }

                if check().await == TickOutcome::Stop {
                    break;
                }
                if cancel.is_cancelled() {
                    break;
                }
            }
            debug!("Refresh task finished");
        });

        debug!(interval_secs = interval.as_secs(), "Refresh task armed");
    }

    /// Cancel the task. The current check, if any, runs to completion.
    pub fn stop(&self) {
        if let Some(cancel) = self.running().take() {
            cancel.cancel();
            debug!("Refresh task cancelled");
        }
    }

    pub fn is_running(&self) -> bool {
        self.running()
            .as_ref()
            .is_some_and(|cancel| !cancel.is_cancelled())
    }
}

impl Drop for RefreshScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}
