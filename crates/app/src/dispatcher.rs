//! The public `Dispatcher`: the entry point producers call to notify a
//! listener, and the orchestration that keeps the registry, the worker pool,
//! and each listener's notification task cooperating correctly.

use notifyq_config::ValidatedDispatcherConfig;
use notifyq_domain::{
    InsertOutcome, Invoker, ListenerQueueDepth, NotificationTask, QueuingState, Registry,
};
use notifyq_ports::Executor;
use notifyq_shared::{ErrorClass, ErrorCode, ErrorEnvelope};
use std::sync::Arc;

/// Result alias for dispatcher operations.
pub type Result<T, E = ErrorEnvelope> = std::result::Result<T, E>;

/// Routes notifications to per-listener tasks, creating a task (and handing
/// it to the worker pool) the first time a listener is seen, and reusing the
/// live task for as long as it keeps draining.
pub struct Dispatcher<L, N> {
    config: ValidatedDispatcherConfig,
    executor: Arc<dyn Executor>,
    invoker: Arc<dyn Invoker<L, N>>,
    registry: Arc<Registry<L, N>>,
}

impl<L, N> Dispatcher<L, N>
where
    L: Send + Sync + 'static,
    N: Send + 'static,
{
    /// Build a dispatcher. `config` has already passed validation (P5:
    /// `maxQueueCapacity <= 0` is rejected there, before a dispatcher ever
    /// exists), `executor` runs the per-listener tasks, and `invoker`
    /// delivers individual notifications.
    #[must_use]
    pub fn new(
        config: ValidatedDispatcherConfig,
        executor: Arc<dyn Executor>,
        invoker: Arc<dyn Invoker<L, N>>,
    ) -> Self {
        Self {
            config,
            executor,
            invoker,
            registry: Arc::new(Registry::new()),
        }
    }

    /// Submit a single notification for `listener`.
    ///
    /// A missing listener or notification is silently ignored (P6) — this is
    /// the Rust expression of the source spec's `NullInput`, which is
    /// control flow rather than an error.
    pub fn submit(&self, listener: Option<Arc<L>>, notification: Option<N>) -> Result<()> {
        let (Some(listener), Some(notification)) = (listener, notification) else {
            return Ok(());
        };
        self.submit_one(&listener, notification)
    }

    /// Submit many notifications for `listener`, in iteration order.
    ///
    /// A missing listener or iterable is silently ignored (P6); each
    /// notification in the iterable is submitted independently, so a later
    /// `rejected` outcome does not unwind earlier, already-accepted ones.
    pub fn submit_all(
        &self,
        listener: Option<Arc<L>>,
        notifications: Option<impl IntoIterator<Item = N>>,
    ) -> Result<()> {
        let (Some(listener), Some(notifications)) = (listener, notifications) else {
            return Ok(());
        };
        for notification in notifications {
            self.submit_one(&listener, notification)?;
        }
        Ok(())
    }

    fn submit_one(&self, listener: &Arc<L>, notification: N) -> Result<()> {
        tracing::trace!(dispatcher = %self.config.name, "submit");
        let mut pending = notification;
        loop {
            if let Some(existing) = self.registry.get(listener) {
                match existing.submit(pending) {
                    QueuingState::Queued
                    | QueuingState::EnqueueTimedOut
                    | QueuingState::Interrupted => return Ok(()),
                    QueuingState::Retired(returned) => {
                        // The task we just saw is on its way out (or just
                        // left); loop and either join a new task someone
                        // else already published, or publish our own.
                        pending = returned;
                        continue;
                    },
                }
            }

            let capacity = self.config.max_queue_capacity;
            let outcome = self
                .registry
                .insert_if_absent(listener, || NotificationTask::new(Arc::clone(listener), capacity));

            match outcome {
                InsertOutcome::Inserted(candidate) => {
                    // The candidate has not been published to the worker
                    // pool yet, so it cannot be mid-drain or retiring:
                    // seeding it now can only return `Queued`,
                    // `EnqueueTimedOut`, or `Interrupted`, never `Retired`.
                    match candidate.submit(pending) {
                        QueuingState::Retired(_) => unreachable!(
                            "a task that has never been published cannot already be retired"
                        ),
                        QueuingState::Queued
                        | QueuingState::EnqueueTimedOut
                        | QueuingState::Interrupted => {},
                    }
                    return self.hand_to_executor(listener, candidate);
                },
                InsertOutcome::Existing(current) => {
                    // Someone else won the race to publish a task for this
                    // listener after our `get` missed it.
                    match current.submit(pending) {
                        QueuingState::Queued
                        | QueuingState::EnqueueTimedOut
                        | QueuingState::Interrupted => return Ok(()),
                        QueuingState::Retired(returned) => {
                            pending = returned;
                        },
                    }
                },
            }
        }
    }

    fn hand_to_executor(&self, listener: &Arc<L>, task: Arc<NotificationTask<L, N>>) -> Result<()> {
        let invoker = Arc::clone(&self.invoker);
        let registry = Arc::clone(&self.registry);
        let listener = Arc::clone(listener);
        self.executor
            .execute(Box::new(move || {
                if let Err(error) = task.run(invoker.as_ref()) {
                    tracing::error!(error = %error, "notification task exited with a fatal failure");
                }
                // `run` only returns once the task has retired (or been
                // interrupted); either way it no longer belongs in the
                // registry unless a fresh task already replaced it.
                let _ = registry.remove_if_current(&listener, &task);
            }))
            .map_err(|rejected| {
                ErrorEnvelope::expected_with_class(
                    ErrorCode::rejected(),
                    rejected.reason,
                    ErrorClass::Retriable,
                )
            })
    }

    /// Snapshot of the current per-listener queue depths. Weakly consistent
    /// with respect to concurrent submission and retirement (§4.5).
    #[must_use]
    pub fn listener_stats(&self) -> Vec<ListenerQueueDepth> {
        self.registry.listener_stats()
    }

    /// The configured per-listener queue capacity.
    #[must_use]
    pub fn max_queue_capacity(&self) -> usize {
        self.config.max_queue_capacity
    }

    /// The worker pool this dispatcher hands tasks to.
    #[must_use]
    pub fn executor(&self) -> &Arc<dyn Executor> {
        &self.executor
    }
}
