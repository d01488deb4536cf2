//! Concurrency primitives shared across the workspace.
//!
//! - Correlation identifiers via [`CorrelationId`], used to tag log lines for a
//!   single dispatcher instance or a single submission.
//! - A synchronous, clonable [`CancellationToken`] that blocking code can poll
//!   or wait on with a timeout, mirroring the way a thread-based worker pool
//!   signals shutdown to code that has no event loop to hand a future to.
//! - [`RequestContext`], bundling a correlation id with a cancellation token.
//!
//! These primitives are deliberately synchronous: callers of this workspace
//! block inside plain OS threads (see `notifyq_domain::BoundedQueue`), not
//! inside an async runtime, so cancellation has to be observable without
//! `.await`.

use crate::{ErrorCode, ErrorEnvelope, Result};
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::time::Duration;

/// A correlation identifier used for logging/telemetry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CorrelationId(Arc<str>);

impl CorrelationId {
    /// Parse a correlation identifier from user input.
    ///
    /// The value is trimmed; empty values are rejected.
    pub fn parse(value: impl AsRef<str>) -> Result<Self> {
        let trimmed = value.as_ref().trim();
        if trimmed.is_empty() {
            return Err(ErrorEnvelope::expected(
                ErrorCode::invalid_input(),
                "correlationId must be non-empty",
            ));
        }
        Ok(Self(Arc::<str>::from(trimmed)))
    }

    /// Create a new dispatcher-scoped id, best-effort unique within this process.
    #[must_use]
    pub fn new_dispatcher_id() -> Self {
        next_scoped_id(&DISPATCHER_ID_COUNTER, "dispatcher_")
    }

    /// Create a new submission id, best-effort unique within this process.
    #[must_use]
    pub fn new_submission_id() -> Self {
        next_scoped_id(&SUBMISSION_ID_COUNTER, "submit_")
    }

    /// Borrow the identifier as a string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

static DISPATCHER_ID_COUNTER: AtomicU64 = AtomicU64::new(1);
static SUBMISSION_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

fn next_scoped_id(counter: &AtomicU64, prefix: &'static str) -> CorrelationId {
    let n = counter.fetch_add(1, Ordering::Relaxed);
    let id: Box<str> = format!("{prefix}{n}").into_boxed_str();
    CorrelationId(Arc::<str>::from(id))
}

/// A clonable, synchronous cancellation token.
///
/// Unlike an async `Notify`-backed token, [`CancellationToken::wait_timeout`]
/// blocks the calling OS thread, which is what a queue operation sitting
/// inside a timed `offer`/`poll` needs: the ability to wake early when asked
/// to shut down, without an executor to poll it.
#[derive(Debug, Clone)]
pub struct CancellationToken {
    inner: Arc<CancellationState>,
}

#[derive(Debug)]
struct CancellationState {
    cancelled: AtomicBool,
    lock: Mutex<()>,
    condvar: Condvar,
}

impl CancellationToken {
    /// Create a new token in the non-cancelled state.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(CancellationState {
                cancelled: AtomicBool::new(false),
                lock: Mutex::new(()),
                condvar: Condvar::new(),
            }),
        }
    }

    /// Cancel the token and wake every blocked waiter.
    pub fn cancel(&self) {
        let was_cancelled = self.inner.cancelled.swap(true, Ordering::SeqCst);
        if !was_cancelled {
            // Hold the lock while notifying so a waiter that is between
            // checking `cancelled` and entering `wait_timeout` cannot miss
            // the wakeup (the standard condvar-notification discipline).
            drop(self.inner.lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner()));
            self.inner.condvar.notify_all();
        }
    }

    /// Returns true if the token has been cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::SeqCst)
    }

    /// Block the current thread until the token is cancelled or `timeout`
    /// elapses. Returns `true` if cancellation was observed.
    #[must_use]
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        if self.is_cancelled() {
            return true;
        }
        let guard = self
            .inner
            .lock
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let (_guard, _timed_out) = self
            .inner
            .condvar
            .wait_timeout_while(guard, timeout, |()| !self.is_cancelled())
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        self.is_cancelled()
    }
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}

/// Request-scoped context passed across boundaries: a correlation id for log
/// lines plus a cancellation token shared with whoever owns the lifetime of
/// the operation.
#[derive(Debug, Clone)]
pub struct RequestContext {
    correlation_id: CorrelationId,
    cancellation: CancellationToken,
}

impl RequestContext {
    /// Create a new request context with a fresh cancellation token.
    #[must_use]
    pub fn new(correlation_id: CorrelationId) -> Self {
        Self {
            correlation_id,
            cancellation: CancellationToken::new(),
        }
    }

    /// Create a context with an explicit cancellation token (for sharing
    /// cancellation across several contexts, e.g. one per listener task).
    #[must_use]
    pub const fn with_cancellation(
        correlation_id: CorrelationId,
        cancellation: CancellationToken,
    ) -> Self {
        Self {
            correlation_id,
            cancellation,
        }
    }

    /// Return the correlation id.
    #[must_use]
    pub const fn correlation_id(&self) -> &CorrelationId {
        &self.correlation_id
    }

    /// Return a clone of the cancellation token.
    #[must_use]
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancellation.clone()
    }

    /// Returns true if the request was cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }

    /// Cancel this request.
    pub fn cancel(&self) {
        self.cancellation.cancel();
    }

    /// Return an error if the request has already been cancelled, naming
    /// `operation` in the message so logs/errors point at the right call site.
    pub fn ensure_not_cancelled(&self, operation: &str) -> Result<()> {
        if self.is_cancelled() {
            return Err(ErrorEnvelope::cancelled(format!(
                "{operation} cancelled via correlation id {}",
                self.correlation_id
            )));
        }
        Ok(())
    }
}


#[cfg(test)]
impl CorrelationId {
    fn new_request_id_for_test() -> Self {
        Self::new_submission_id()
    }
}
