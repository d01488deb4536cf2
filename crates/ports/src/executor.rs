//! Worker execution boundary contract.
//!
//! The dispatcher never owns threads itself: every [`NotificationTask`](
//! notifyq_domain::NotificationTask) is handed to an external worker pool
//! through this port, and the pool decides when (and whether) it actually
//! runs. This mirrors how the domain model treats execution as "supplied by
//! the caller" rather than as the dispatcher's own concern.

/// Why an [`Executor`] refused to run a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionRejected {
    /// Human-readable reason the pool gave for refusing the task.
    pub reason: String,
}

impl ExecutionRejected {
    /// Build a rejection with the given reason.
    #[must_use]
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// Runs arbitrary units of work on a worker pool supplied by the caller.
///
/// Implementations decide the scheduling policy (thread-per-task, a fixed
/// worker pool, a `rayon`/tokio executor, whatever the host application
/// already runs) — the dispatcher only needs `execute` to eventually invoke
/// the closure on some thread, or to refuse up front.
pub trait Executor: Send + Sync {
    /// Schedule `task` to run. Returns `Err` if the pool refuses to accept
    /// more work (scenario: a saturated worker pool, per S6); the caller is
    /// then responsible for surfacing that refusal rather than silently
    /// dropping the task.
    fn execute(&self, task: Box<dyn FnOnce() + Send>) -> Result<(), ExecutionRejected>;
}
