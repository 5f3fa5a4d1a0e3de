//! Deadline-bounded execution of a single algorithm invocation.
//!
//! Every call gets its own freshly spawned OS thread. Workers are never
//! pooled: a timed-out worker that ignores cancellation keeps its thread
//! until it returns, and that thread is never handed another job.

use std::panic::{self, AssertUnwindSafe};
use std::thread;
use std::time::Duration;

use tokio::sync::oneshot;
use tracing::{debug, warn};

use crate::cancel::CancellationToken;
use crate::error::DiffError;
use crate::types::DiffResult;

/// What happened to one timed invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum TrialOutcome {
    Completed(DiffResult),
    TimedOut,
    Failed(String),
}

impl TrialOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, TrialOutcome::Completed(_))
    }

    /// Collapse to the `([], [])` form: a timeout or failure becomes the
    /// sentinel empty result and is no longer distinguishable.
    pub fn into_sentinel_form(self) -> DiffResult {
        match self {
            TrialOutcome::Completed(result) => result,
            TrialOutcome::TimedOut | TrialOutcome::Failed(_) => DiffResult::sentinel(),
        }
    }

    /// Short label for logs.
    pub fn label(&self) -> &'static str {
        match self {
            TrialOutcome::Completed(_) => "completed",
            TrialOutcome::TimedOut => "timed_out",
            TrialOutcome::Failed(_) => "failed",
        }
    }
}

type WorkerReport = std::thread::Result<Result<DiffResult, DiffError>>;

/// Runs one invocation at a time under a hard wall-clock deadline.
#[derive(Debug, Clone)]
pub struct TimeoutRunner {
    deadline: Duration,
}

impl Default for TimeoutRunner {
    fn default() -> Self {
        Self::new(Duration::from_secs(600))
    }
}

impl TimeoutRunner {
    pub fn new(deadline: Duration) -> Self {
        Self { deadline }
    }

    pub fn deadline(&self) -> Duration {
        self.deadline
    }

    /// Execute `job` on a dedicated worker and wait at most the deadline.
    ///
    /// On expiry the worker's token is cancelled and `TimedOut` is returned
    /// without waiting for the worker to stop. Errors and panics inside
    /// `job` become `Failed`.
    pub async fn run<F>(&self, job: F) -> TrialOutcome
    where
        F: FnOnce(&CancellationToken) -> Result<DiffResult, DiffError> + Send + 'static,
    {
        let token = CancellationToken::new();
        let worker_token = token.clone();
        let (tx, rx) = oneshot::channel::<WorkerReport>();

        let spawned = thread::Builder::new()
            .name("logbench-worker".to_string())
            .spawn(move || {
                let report = panic::catch_unwind(AssertUnwindSafe(|| job(&worker_token)));
                // The receiver is gone when the deadline already passed.
                let _ = tx.send(report);
            });
        if let Err(err) = spawned {
            warn!(error = %err, "failed to spawn benchmark worker");
            return TrialOutcome::Failed(format!("worker spawn failed: {err}"));
        }

        match tokio::time::timeout(self.deadline, rx).await {
            Ok(Ok(Ok(Ok(result)))) => TrialOutcome::Completed(result),
            Ok(Ok(Ok(Err(err)))) => {
                debug!(error = %err, "invocation failed");
                TrialOutcome::Failed(err.to_string())
            }
            Ok(Ok(Err(payload))) => {
                let reason = panic_message(payload.as_ref());
                warn!(reason = %reason, "invocation panicked");
                TrialOutcome::Failed(format!("panicked: {reason}"))
            }
            Ok(Err(_closed)) => TrialOutcome::Failed("worker exited without a result".to_string()),
            Err(_elapsed) => {
                token.cancel();
                debug!(deadline_ms = self.deadline.as_millis() as u64, "invocation timed out");
                TrialOutcome::TimedOut
            }
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
