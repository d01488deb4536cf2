//! A bounded, multi-producer single-consumer FIFO with timed offer/poll.
//!
//! Modeled on the blocking `ArrayBlockingQueue`-style contract: `offer` waits
//! up to a timeout for space, `poll` waits up to a timeout for an element,
//! and an external [`CancellationToken`] can wake a blocked caller early with
//! an `Interrupted` outcome, standing in for thread interruption.

use notifyq_shared::CancellationToken;
use std::collections::VecDeque;
use std::sync::{Condvar, Mutex, PoisonError};
use std::time::{Duration, Instant};

/// How often a blocked `offer`/`poll` wakes up to recheck cancellation,
/// independent of how much of its own timeout remains.
const CANCELLATION_POLL_SLICE: Duration = Duration::from_millis(25);

/// Outcome of [`BoundedQueue::offer`]. The element is returned to the caller
/// on every non-`Accepted` path so a retry loop never has to reconstruct or
/// clone the notification.
pub enum OfferOutcome<T> {
    /// The element was appended to the queue.
    Accepted,
    /// No space became available before the timeout elapsed.
    TimedOut(T),
    /// The queue was closed, or the cancellation token fired, before the
    /// element could be enqueued.
    Interrupted(T),
}

/// Outcome of [`BoundedQueue::poll`].
pub enum PollOutcome<T> {
    /// An element was dequeued.
    Item(T),
    /// The queue stayed empty for the whole timeout.
    Empty,
    /// The queue was closed, or the cancellation token fired, while waiting.
    Interrupted,
}

struct QueueState<T> {
    items: VecDeque<T>,
    closed: bool,
}

/// Bounded FIFO of at most `capacity` elements.
pub struct BoundedQueue<T> {
    capacity: usize,
    state: Mutex<QueueState<T>>,
    not_empty: Condvar,
    not_full: Condvar,
}

impl<T> BoundedQueue<T> {
    /// Create a queue bounded to `capacity` elements.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero. Callers validate `maxQueueCapacity > 0`
    /// at the dispatcher's construction boundary (`BadArgument`); by the
    /// time a queue is built, zero has already been rejected.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "BoundedQueue capacity must be positive");
        Self {
            capacity,
            state: Mutex::new(QueueState {
                items: VecDeque::with_capacity(capacity.min(64)),
                closed: false,
            }),
            not_empty: Condvar::new(),
            not_full: Condvar::new(),
        }
    }

    /// Current number of queued elements. Advisory under concurrent use.
    #[must_use]
    pub fn size(&self) -> usize {
        self.lock().items.len()
    }

    /// Wake every blocked `offer`/`poll` with `Interrupted` and keep them
    /// interrupted going forward. Used when the owning task is torn down.
    pub fn close(&self) {
        self.lock().closed = true;
        self.not_empty.notify_all();
        self.not_full.notify_all();
    }

    /// Block up to `timeout` waiting for space, then enqueue `item`.
    pub fn offer(&self, item: T, timeout: Duration, cancel: &CancellationToken) -> OfferOutcome<T> {
        let deadline = Instant::now() + timeout;
        let mut guard = self.lock();
        loop {
            if guard.closed || cancel.is_cancelled() {
                return OfferOutcome::Interrupted(item);
            }
            if guard.items.len() < self.capacity {
                guard.items.push_back(item);
                drop(guard);
                self.not_empty.notify_one();
                return OfferOutcome::Accepted;
            }
            let Some(slice) = remaining_slice(deadline) else {
                return OfferOutcome::TimedOut(item);
            };
            guard = self
                .not_full
                .wait_timeout(guard, slice)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
        }
    }

    /// Block up to `timeout` waiting for an element.
    pub fn poll(&self, timeout: Duration, cancel: &CancellationToken) -> PollOutcome<T> {
        let deadline = Instant::now() + timeout;
        let mut guard = self.lock();
        loop {
            if let Some(item) = guard.items.pop_front() {
                drop(guard);
                self.not_full.notify_one();
                return PollOutcome::Item(item);
            }
            if guard.closed || cancel.is_cancelled() {
                return PollOutcome::Interrupted;
            }
            let Some(slice) = remaining_slice(deadline) else {
                return PollOutcome::Empty;
            };
            guard = self
                .not_empty
                .wait_timeout(guard, slice)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, QueueState<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Returns the next wait slice to sleep for, bounded by both the remaining
/// timeout and [`CANCELLATION_POLL_SLICE`] so cancellation is never more
/// than one slice away from being observed. `None` once the deadline has
/// passed.
fn remaining_slice(deadline: Instant) -> Option<Duration> {
    let remaining = deadline.saturating_duration_since(Instant::now());
    if remaining.is_zero() {
        None
    } else {
        Some(remaining.min(CANCELLATION_POLL_SLICE))
    }
}
