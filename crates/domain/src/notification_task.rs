//! Per-listener serial notification pipeline: a bounded queue plus the
//! handshake that hands the queue's contents off to a worker thread one at a
//! time, in submission order, without ever running two notifications for the
//! same listener concurrently.

use crate::bounded_queue::{BoundedQueue, OfferOutcome, PollOutcome};
use notifyq_shared::{CancellationToken, ErrorClass, ErrorCode, ErrorEnvelope};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Condvar, Mutex, PoisonError};
use std::time::Duration;
use tracing::{debug, warn};

/// Number of times [`NotificationTask::offer_with_retries`] will retry an
/// enqueue attempt before giving up and reporting `EnqueueTimeout`.
///
/// Resolved in this implementation: attempts are logged 1-indexed
/// (`1..=MAX_OFFER_ATTEMPTS`), matching how an operator reading the log would
/// count "the 3rd attempt" rather than "attempt number 2".
pub const MAX_OFFER_ATTEMPTS: u32 = 10;

/// How long a single `offer` call blocks waiting for queue space before the
/// caller retries.
pub const OFFER_TIMEOUT: Duration = Duration::from_secs(60);

/// How long the worker loop blocks waiting for a queued notification before
/// re-checking whether the task should retire.
pub const POLL_TIMEOUT: Duration = Duration::from_millis(10);

/// Failure reported by an [`Invoker`] while delivering a notification to a
/// listener.
#[derive(Debug, Clone)]
pub struct InvokeFailure {
    /// Human-readable description of what went wrong.
    pub message: String,
    /// Whether the failure should be treated as unrecoverable for this
    /// listener (the worker stops invoking it further) or merely logged and
    /// skipped so the next queued notification still gets a chance.
    pub fatal: bool,
}

impl InvokeFailure {
    /// Build a recoverable failure (the worker keeps draining the queue).
    #[must_use]
    pub fn recoverable(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            fatal: false,
        }
    }

    /// Build a fatal failure (the worker stops invoking this listener).
    #[must_use]
    pub fn fatal(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            fatal: true,
        }
    }
}

/// Delivers a single notification to a single listener.
///
/// Implementations are supplied by the caller: the dispatcher itself has no
/// opinion on what a listener is or how a notification reaches it, only that
/// delivery happens strictly one at a time per listener.
pub trait Invoker<L, N>: Send + Sync {
    /// Invoke `listener` with `notification`. Errors are reported through
    /// [`InvokeFailure`] rather than a generic error type so the worker loop
    /// can decide whether to keep draining the queue.
    fn invoke(&self, listener: &L, notification: &N) -> Result<(), InvokeFailure>;
}

/// The two-flag handshake a task uses to decide whether it is safe to retire
/// from the external worker pool.
///
/// `done` and `queued_notifications` are only ever read or written together,
/// under `handshake.lock`. A submitter that finds `done == true` knows the
/// task has already (or is about to) leave the pool and must create a fresh
/// task instead of queuing onto this one; a submitter that finds `done ==
/// false` sets `queued_notifications = true` so the worker, upon draining an
/// empty queue, knows to keep the task alive instead of retiring it.
struct Handshake {
    done: bool,
    queued_notifications: bool,
}

/// Owns one listener's queue and drives delivery on whatever thread the
/// external worker pool assigns it.
pub struct NotificationTask<L, N> {
    listener: std::sync::Arc<L>,
    queue: BoundedQueue<N>,
    handshake: Mutex<Handshake>,
    handshake_changed: Condvar,
    /// Lock-free mirror of `handshake.done`, read by submitters that only
    /// need a fast "is this task still accepting work" check and are willing
    /// to pay the lock only when it might actually say no.
    done_hint: AtomicBool,
    cancellation: CancellationToken,
}

/// What a submitter should do after calling [`NotificationTask::submit`].
pub enum QueuingState<N> {
    /// The notification was accepted by this task; no further action needed.
    Queued,
    /// This task has already retired. The caller must create a new task
    /// (and a new registry entry) for the listener, and may retry the
    /// notification there — it is handed back unconsumed.
    Retired(N),
    /// The queue rejected the notification after exhausting
    /// [`MAX_OFFER_ATTEMPTS`] retries.
    EnqueueTimedOut,
    /// An external cancellation interrupted a blocked enqueue attempt. The
    /// caller treats this as shutdown and does not retry.
    Interrupted,
}

impl<L, N> NotificationTask<L, N>
where
    L: Send + Sync + 'static,
    N: Send + 'static,
{
    /// Build a task for `listener`, bounded to `capacity` queued
    /// notifications.
    #[must_use]
    pub fn new(listener: std::sync::Arc<L>, capacity: usize) -> Self {
        Self {
            listener,
            queue: BoundedQueue::new(capacity),
            handshake: Mutex::new(Handshake {
                done: false,
                queued_notifications: false,
            }),
            handshake_changed: Condvar::new(),
            done_hint: AtomicBool::new(false),
            cancellation: CancellationToken::new(),
        }
    }

    /// Borrow the listener this task delivers to.
    #[must_use]
    pub fn listener(&self) -> &std::sync::Arc<L> {
        &self.listener
    }

    /// Number of notifications currently queued for this listener.
    #[must_use]
    pub fn queue_depth(&self) -> usize {
        self.queue.size()
    }

    /// Fast, lock-free check of whether this task has retired. A `false`
    /// result is authoritative only until the next handshake-guarded
    /// mutation; submitters still confirm via the full handshake before
    /// creating a replacement task.
    #[must_use]
    pub fn is_done_hint(&self) -> bool {
        self.done_hint.load(Ordering::Acquire)
    }

    /// Offer `notification` to this task's queue, retrying enqueue attempts
    /// up to [`MAX_OFFER_ATTEMPTS`] times. Returns the queuing state the
    /// caller should act on.
    ///
    /// The handshake lock is held for the entire offer-retry loop, not just
    /// the `done` check: `queued_notifications` must never be set unless the
    /// enqueue it represents has already landed, or a consumer could observe
    /// the flag, clear it on one empty poll, retire on the next, and close
    /// the queue before this offer ever reaches it — dropping the
    /// notification instead of handing it back.
    pub fn submit(&self, notification: N) -> QueuingState<N> {
        let mut guard = self.lock_handshake();
        if guard.done {
            return QueuingState::Retired(notification);
        }
        match self.offer_with_retries(notification) {
            QueuingState::Queued => {
                guard.queued_notifications = true;
                QueuingState::Queued
            },
            other => other,
        }
    }

    fn offer_with_retries(&self, notification: N) -> QueuingState<N> {
        let mut item = notification;
        for attempt in 1..=MAX_OFFER_ATTEMPTS {
            debug!(attempt, max_attempts = MAX_OFFER_ATTEMPTS, "offer attempt");
            match self.queue.offer(item, OFFER_TIMEOUT, &self.cancellation) {
                OfferOutcome::Accepted => return QueuingState::Queued,
                OfferOutcome::Interrupted(_) => {
                    return QueuingState::Interrupted;
                }
                OfferOutcome::TimedOut(returned) => {
                    warn!(attempt, max_attempts = MAX_OFFER_ATTEMPTS, "offer attempt timed out");
                    item = returned;
                }
            }
        }
        QueuingState::EnqueueTimedOut
    }

    /// Drain the queue, delivering each notification to the listener via
    /// `invoker` strictly in FIFO order, until the queue has been empty for
    /// one poll and no submitter queued anything in the interim — at which
    /// point the task retires and the caller (the worker pool) must drop it
    /// from the registry.
    ///
    /// Returns `Err` only for a fatal invoker failure; recoverable failures
    /// are logged and the loop continues with the next queued item.
    pub fn run(&self, invoker: &dyn Invoker<L, N>) -> Result<(), ErrorEnvelope> {
        loop {
            match self.queue.poll(POLL_TIMEOUT, &self.cancellation) {
                PollOutcome::Item(notification) => {
                    self.notify_listener(invoker, &notification)?;
                }
                PollOutcome::Empty => {
                    if self.try_retire() {
                        return Ok(());
                    }
                }
                PollOutcome::Interrupted => {
                    return Ok(());
                }
            }
        }
    }

    fn notify_listener(&self, invoker: &dyn Invoker<L, N>, notification: &N) -> Result<(), ErrorEnvelope> {
        debug!("invoking listener");
        match invoker.invoke(&self.listener, notification) {
            Ok(()) => Ok(()),
            Err(failure) if failure.fatal => {
                tracing::error!(message = %failure.message, fatal = true, "invoker failure");
                // Escalate before re-raising: mark this task retired now, so
                // no replacement task gets created for this listener while
                // the worker pool unwinds the failure on its own terms.
                self.mark_retired();
                Err(ErrorEnvelope::unexpected(
                    ErrorCode::invoker_failure(),
                    failure.message,
                    ErrorClass::NonRetriable,
                ))
            }
            Err(failure) => {
                tracing::error!(message = %failure.message, fatal = false, "invoker failure");
                Ok(())
            }
        }
    }

    /// Attempt to leave the worker pool. Succeeds only if no submitter
    /// queued a notification since the last poll; otherwise clears the flag
    /// and gives the worker another pass instead of retiring.
    fn try_retire(&self) -> bool {
        {
            let mut guard = self.lock_handshake();
            if guard.queued_notifications {
                guard.queued_notifications = false;
                return false;
            }
        }
        self.mark_retired();
        true
    }

    /// Mark this task as done under the handshake lock, wake any submitter
    /// blocked on the cancellation-aware offer/poll loop, and close the
    /// queue so further offers fail fast instead of timing out.
    fn mark_retired(&self) {
        {
            let mut guard = self.lock_handshake();
            guard.done = true;
        }
        self.done_hint.store(true, Ordering::Release);
        self.handshake_changed.notify_all();
        self.queue.close();
    }

    fn lock_handshake(&self) -> std::sync::MutexGuard<'_, Handshake> {
        self.handshake.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
