//! Concurrent, identity-keyed map from listener to its notification task.

use crate::listener_key::ListenerKey;
use crate::notification_task::NotificationTask;
use crate::queue_stats::ListenerQueueDepth;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::sync::Arc;

/// Outcome of [`Registry::insert_if_absent`].
pub enum InsertOutcome<L, N> {
    /// No task existed for this listener; the new one was inserted.
    Inserted(Arc<NotificationTask<L, N>>),
    /// A task already existed (and had not retired); the existing task is
    /// returned so the caller queues onto it instead.
    Existing(Arc<NotificationTask<L, N>>),
}

/// Maps each listener to the single [`NotificationTask`] draining its queue.
///
/// Keyed on reference identity via [`ListenerKey`], not on any
/// `PartialEq`/`Hash` the listener type provides. Backed by a
/// [`DashMap`] so lookups, inserts and removals can happen concurrently from
/// many submitting threads without a single global lock.
pub struct Registry<L, N> {
    tasks: DashMap<ListenerKey<L>, Arc<NotificationTask<L, N>>>,
}

impl<L, N> Registry<L, N>
where
    L: Send + Sync + 'static,
    N: Send + 'static,
{
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            tasks: DashMap::new(),
        }
    }

    /// Look up the task currently registered for `listener`, if any.
    #[must_use]
    pub fn get(&self, listener: &Arc<L>) -> Option<Arc<NotificationTask<L, N>>> {
        let key = ListenerKey::new(Arc::clone(listener));
        self.tasks.get(&key).map(|entry| Arc::clone(entry.value()))
    }

    /// Atomically insert a freshly built task for `listener` if none is
    /// registered yet, otherwise return the existing one.
    ///
    /// `build` only runs when a new entry is actually needed, so the common
    /// case of "listener already has a live task" never allocates a task it
    /// throws away.
    pub fn insert_if_absent<F>(&self, listener: &Arc<L>, build: F) -> InsertOutcome<L, N>
    where
        F: FnOnce() -> NotificationTask<L, N>,
    {
        let key = ListenerKey::new(Arc::clone(listener));
        match self.tasks.entry(key) {
            Entry::Occupied(entry) => InsertOutcome::Existing(Arc::clone(entry.get())),
            Entry::Vacant(entry) => {
                let task = Arc::new(build());
                entry.insert(Arc::clone(&task));
                InsertOutcome::Inserted(task)
            }
        }
    }

    /// Remove the entry for `listener` if it still points at `task` (the
    /// same `Arc` allocation). Called by the worker loop right after a task
    /// retires, guarding against a race where a fresh task was inserted for
    /// the same listener in between.
    pub fn remove_if_current(&self, listener: &Arc<L>, task: &Arc<NotificationTask<L, N>>) -> bool {
        let key = ListenerKey::new(Arc::clone(listener));
        let mut removed = false;
        let _ = self.tasks.remove_if(&key, |_key, current| {
            removed = Arc::ptr_eq(current, task);
            removed
        });
        removed
    }

    /// True if no listener currently has a registered task.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Number of listeners with a registered task.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Snapshot of every listener's current queue depth. The snapshot is not
    /// atomic across listeners: depths are read one entry at a time while
    /// other threads may be concurrently submitting or draining.
    #[must_use]
    pub fn listener_stats(&self) -> Vec<ListenerQueueDepth> {
        self.tasks
            .iter()
            .map(|entry| ListenerQueueDepth::new(entry.key(), entry.value().queue_depth()))
            .collect()
    }
}

impl<L, N> Default for Registry<L, N>
where
    L: Send + Sync + 'static,
    N: Send + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task_for(listener: &Arc<&'static str>) -> NotificationTask<&'static str, u32> {
        NotificationTask::new(Arc::clone(listener), 8)
    }

    #[test]
    fn insert_if_absent_creates_once_per_listener() {
        let registry: Registry<&'static str, u32> = Registry::new();
        let listener = Arc::new("listener");

        let first = match registry.insert_if_absent(&listener, || task_for(&listener)) {
            InsertOutcome::Inserted(task) => task,
            InsertOutcome::Existing(_) => panic!("expected a fresh insert"),
        };
        let second = match registry.insert_if_absent(&listener, || task_for(&listener)) {
            InsertOutcome::Existing(task) => task,
            InsertOutcome::Inserted(_) => panic!("expected the existing task"),
        };
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn distinct_listeners_get_distinct_tasks() {
        let registry: Registry<&'static str, u32> = Registry::new();
        let a = Arc::new("a");
        let b = Arc::new("a");

        registry.insert_if_absent(&a, || task_for(&a));
        registry.insert_if_absent(&b, || task_for(&b));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn remove_if_current_guards_against_stale_task() {
        let registry: Registry<&'static str, u32> = Registry::new();
        let listener = Arc::new("listener");
        let task = match registry.insert_if_absent(&listener, || task_for(&listener)) {
            InsertOutcome::Inserted(task) => task,
            InsertOutcome::Existing(task) => task,
        };

        let stale = Arc::new(task_for(&listener));
        assert!(!registry.remove_if_current(&listener, &stale));
        assert!(registry.remove_if_current(&listener, &task));
        assert!(registry.is_empty());
    }

    #[test]
    fn listener_stats_reports_queue_depth() {
        let registry: Registry<&'static str, u32> = Registry::new();
        let listener = Arc::new("listener");
        let task = match registry.insert_if_absent(&listener, || task_for(&listener)) {
            InsertOutcome::Inserted(task) => task,
            InsertOutcome::Existing(task) => task,
        };
        task.submit(1);
        task.submit(2);

        let stats = registry.listener_stats();
        assert_eq!(stats.len(), 1);
        assert_eq!(stats[0].depth, 2);
    }

    struct NoopInvoker;

    impl crate::notification_task::Invoker<u32, u32> for NoopInvoker {
        fn invoke(
            &self,
            _listener: &u32,
            _notification: &u32,
        ) -> Result<(), crate::notification_task::InvokeFailure> {
            Ok(())
        }
    }

    /// P4: once every producer has stopped and every listener's task has
    /// drained and retired, the registry holds no entries.
    #[test]
    fn registry_is_empty_after_every_task_drains() {
        let registry: Registry<u32, u32> = Registry::new();
        let invoker = NoopInvoker;

        for id in 0..8u32 {
            let listener = Arc::new(id);
            let task = match registry.insert_if_absent(&listener, || {
                NotificationTask::new(Arc::clone(&listener), 8)
            }) {
                InsertOutcome::Inserted(task) | InsertOutcome::Existing(task) => task,
            };
            task.submit(id);
            task.submit(id + 100);
            task.run(&invoker).expect("drain succeeds");
            assert!(registry.remove_if_current(&listener, &task));
        }

        assert!(registry.is_empty());
    }
}
