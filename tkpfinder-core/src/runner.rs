//! Multi-input execution with per-input failure isolation.
//!
//! Each input is an independent unit of work. A unit that returns an error,
//! panics or exceeds the timeout yields `None`; the remaining inputs are
//! still processed and results come back in input order.
//!
//! ## Examples
//!
//! ```rust
//! use std::time::Duration;
//! use tkpfinder_core::runner::RunCoordinator;
//! use tkpfinder_core::types::TkpError;
//!
//! let coordinator = RunCoordinator::new(Some(2), Duration::from_secs(5));
//! let results = coordinator.run(vec![1, 2, 3], |n: i32| {
//!     if n == 2 {
//!         Err(TkpError::InvalidInput("corrupted".to_string()))
//!     } else {
//!         Ok(n * 10)
//!     }
//! })?;
//!
//! assert_eq!(results, vec![Some(10), None, Some(30)]);
//! # Ok::<(), TkpError>(())
//! ```

use std::any::Any;
use std::fmt::Display;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info};

use crate::config::TkpConfig;
use crate::types::TkpError;

type JobOutcome<T> = Result<Result<T, TkpError>, Box<dyn Any + Send>>;

/// Fans a job out over independent inputs.
#[derive(Debug, Clone, Copy)]
pub struct RunCoordinator {
    num_workers: usize,
    timeout: Duration,
}

impl RunCoordinator {
    /// `None` or a single worker runs inputs one after another.
    #[must_use]
    pub fn new(num_workers: Option<usize>, timeout: Duration) -> Self {
        Self {
            num_workers: num_workers.unwrap_or(1).max(1),
            timeout,
        }
    }

    #[must_use]
    pub fn from_config(config: &TkpConfig) -> Self {
        Self::new(config.num_workers, config.timeout)
    }

    /// Whether `num_inputs` inputs would be spread over a worker pool.
    #[must_use]
    pub const fn is_parallel(&self, num_inputs: usize) -> bool {
        self.num_workers > 1 && num_inputs > 1
    }

    /// Runs `job` on every input.
    ///
    /// The result vector has one entry per input, in input order. In
    /// parallel mode the coordinator waits at most `timeout` for each input
    /// in turn; a timed-out job keeps its worker until it returns, but its
    /// result is discarded.
    ///
    /// # Errors
    ///
    /// Only fails when the worker pool cannot be created. Failures of
    /// individual inputs are logged and reported as `None`.
    pub fn run<I, T, F>(&self, inputs: Vec<I>, job: F) -> Result<Vec<Option<T>>, TkpError>
    where
        I: Display + Send + 'static,
        T: Send + 'static,
        F: Fn(I) -> Result<T, TkpError> + Send + Sync + 'static,
    {
        if !self.is_parallel(inputs.len()) {
            return Ok(inputs
                .into_iter()
                .map(|input| {
                    let label = input.to_string();
                    let outcome = panic::catch_unwind(AssertUnwindSafe(|| job(input)));
                    settle(&label, outcome)
                })
                .collect());
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.num_workers)
            .thread_name(|i| format!("tkp-worker-{i}"))
            .build()
            .map_err(|e| {
                TkpError::InvalidConfig(format!("failed to build worker pool: {e}"))
            })?;
        info!(
            workers = self.num_workers,
            inputs = inputs.len(),
            "running inputs in parallel"
        );

        let job = Arc::new(job);
        let pending: Vec<_> = inputs
            .into_iter()
            .map(|input| {
                let label = input.to_string();
                let (sender, receiver) = mpsc::channel::<JobOutcome<T>>();
                let job = Arc::clone(&job);
                pool.spawn(move || {
                    let outcome = panic::catch_unwind(AssertUnwindSafe(|| job(input)));
                    // The receiver is gone once the input timed out
                    let _ = sender.send(outcome);
                });
                (label, receiver)
            })
            .collect();

        Ok(pending
            .into_iter()
            .map(|(label, receiver)| match receiver.recv_timeout(self.timeout) {
                Ok(outcome) => settle(&label, outcome),
                Err(RecvTimeoutError::Timeout) => {
                    report(
                        &label,
                        &format!("no result within {:?}", self.timeout),
                    );
                    None
                }
                Err(RecvTimeoutError::Disconnected) => {
                    report(&label, "worker exited without a result");
                    None
                }
            })
            .collect())
    }
}

fn settle<T>(label: &str, outcome: JobOutcome<T>) -> Option<T> {
    match outcome {
        Ok(Ok(value)) => Some(value),
        Ok(Err(e)) => {
            report(label, &e.to_string());
            None
        }
        Err(payload) => {
            report(label, &format!("panicked: {}", panic_message(payload.as_ref())));
            None
        }
    }
}

fn report(label: &str, reason: &str) {
    let failure = TkpError::WorkerFailure {
        input: label.to_string(),
        reason: reason.to_string(),
    };
    error!(input = %label, "{failure}");
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic payload")
}
