//! In-memory [`Invoker`] test doubles with fault injection.

use notifyq_domain::{InvokeFailure, Invoker};
use std::collections::HashMap;
use std::sync::{Arc, Barrier, Mutex, PoisonError};

/// A single recorded invocation, in the order the invoker actually saw it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call<L, N> {
    /// The listener the notification was delivered to.
    pub listener: L,
    /// The notification delivered.
    pub notification: N,
}

/// What a scripted call should do, keyed by its 0-based index across the
/// invoker's whole lifetime (not per-listener).
#[derive(Debug, Clone)]
pub enum Fault {
    /// Report a recoverable failure; the task keeps draining.
    Recoverable(String),
    /// Report a fatal failure; the task stops draining for this listener.
    Fatal(String),
}

/// Records every delivered `(listener, notification)` pair in call order,
/// and optionally fails specific calls according to a fixed schedule.
///
/// Cloning `L`/`N` on every call keeps the recorded history independent of
/// what the dispatcher does with the originals afterward.
pub struct RecordingInvoker<L, N> {
    calls: Mutex<Vec<Call<L, N>>>,
    faults: Mutex<HashMap<usize, Fault>>,
}

impl<L, N> Default for RecordingInvoker<L, N> {
    fn default() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            faults: Mutex::new(HashMap::new()),
        }
    }
}

impl<L, N> RecordingInvoker<L, N>
where
    L: Clone,
    N: Clone,
{
    /// Build an invoker with no scripted faults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the call at `index` (0-based, across the invoker's lifetime)
    /// fail the way `fault` describes.
    #[must_use]
    pub fn with_fault(self, index: usize, fault: Fault) -> Self {
        self.faults
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(index, fault);
        self
    }

    /// Snapshot of every call recorded so far, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<Call<L, N>> {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Number of calls recorded so far.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

impl<L, N> Invoker<L, N> for RecordingInvoker<L, N>
where
    L: Clone + Send + Sync,
    N: Clone + Send + Sync,
{
    fn invoke(&self, listener: &L, notification: &N) -> Result<(), InvokeFailure> {
        let index = {
            let mut calls = self.calls.lock().unwrap_or_else(PoisonError::into_inner);
            calls.push(Call {
                listener: listener.clone(),
                notification: notification.clone(),
            });
            calls.len() - 1
        };

        match self
            .faults
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&index)
        {
            Some(Fault::Recoverable(message)) => Err(InvokeFailure::recoverable(message.clone())),
            Some(Fault::Fatal(message)) => Err(InvokeFailure::fatal(message.clone())),
            None => Ok(()),
        }
    }
}

/// Blocks the calling (worker) thread on its first invocation only, so a
/// test can rendezvous on `started` to know the invoker is mid-call before
/// asserting on executor or queue saturation.
pub struct BlockingInvoker {
    started: Arc<Barrier>,
    release: Arc<Barrier>,
    blocked: Mutex<bool>,
}

impl BlockingInvoker {
    /// Build a blocking invoker sharing `started`/`release` rendezvous
    /// points with the test driving it.
    #[must_use]
    pub fn new(started: Arc<Barrier>, release: Arc<Barrier>) -> Self {
        Self {
            started,
            release,
            blocked: Mutex::new(false),
        }
    }
}

impl<L, N> Invoker<L, N> for BlockingInvoker {
    fn invoke(&self, _listener: &L, _notification: &N) -> Result<(), InvokeFailure> {
        let mut blocked = self.blocked.lock().unwrap_or_else(PoisonError::into_inner);
        if !*blocked {
            *blocked = true;
            drop(blocked);
            self.started.wait();
            self.release.wait();
        }
        Ok(())
    }
}
