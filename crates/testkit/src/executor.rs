//! In-memory [`Executor`] test doubles.

use notifyq_ports::{ExecutionRejected, Executor};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Runs every task inline, on the calling thread, the instant it's handed
/// over. Deterministic for tests that care about delivery order but don't
/// want real worker threads in the mix.
#[derive(Debug, Default)]
pub struct InMemoryExecutor {
    executed: AtomicUsize,
}

impl InMemoryExecutor {
    /// Build an executor with no tasks run yet.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of tasks run so far.
    #[must_use]
    pub fn executed_count(&self) -> usize {
        self.executed.load(Ordering::SeqCst)
    }
}

impl Executor for InMemoryExecutor {
    fn execute(&self, task: Box<dyn FnOnce() + Send>) -> Result<(), ExecutionRejected> {
        task();
        self.executed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Refuses every task, for exercising S6 (worker pool saturation) without
/// needing to actually saturate a real pool.
#[derive(Debug, Default)]
pub struct RejectingExecutor {
    reason: String,
}

impl RejectingExecutor {
    /// Build an executor that refuses every task with `reason`.
    #[must_use]
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl Executor for RejectingExecutor {
    fn execute(&self, _task: Box<dyn FnOnce() + Send>) -> Result<(), ExecutionRejected> {
        Err(ExecutionRejected::new(self.reason.clone()))
    }
}
