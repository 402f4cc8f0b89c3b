//! Cancellable delayed tasks
//!
//! Forfeit timers and bot think-time both go through [`Scheduler`]. Delays
//! use `tokio::time`, so tests can pause and advance the clock instead of
//! sleeping for real.

use std::future::Future;
use std::time::Duration;

use tokio::task::AbortHandle;

/// Spawns futures that run after a delay
#[derive(Debug, Clone, Default)]
pub struct Scheduler;

impl Scheduler {
    pub fn new() -> Self {
        Self
    }

    /// Run `task` once `delay` has elapsed
    ///
    /// Must be called from within a tokio runtime.
    pub fn schedule<F>(&self, delay: Duration, task: F) -> ScheduledTask
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            task.await;
        });

        ScheduledTask {
            handle: handle.abort_handle(),
        }
    }
}

/// Handle to a pending delayed task
///
/// Dropping the handle does not cancel the task.
#[derive(Debug)]
pub struct ScheduledTask {
    handle: AbortHandle,
}

impl ScheduledTask {
    /// Cancel the task if it has not run yet. Safe to call repeatedly.
    ///
    /// A task that already woke up finishes its synchronous work; callers
    /// re-validate state when the task body runs.
    pub fn cancel(&self) {
        self.handle.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}
