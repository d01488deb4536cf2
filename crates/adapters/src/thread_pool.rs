//! A fixed-size thread pool implementing [`Executor`].
//!
//! Workers share a bounded channel. `execute` uses a non-blocking send: if
//! every worker is busy and the channel is full, the task is rejected rather
//! than queued indefinitely, matching the "worker pool saturated" scenario.

use crossbeam_channel::{Receiver, Sender, TrySendError, bounded};
use notifyq_ports::{ExecutionRejected, Executor};
use std::thread::{self, JoinHandle};

type Task = Box<dyn FnOnce() + Send>;

/// A fixed-size pool of OS threads draining a shared bounded work queue.
pub struct ThreadPoolExecutor {
    sender: Option<Sender<Task>>,
    workers: Vec<JoinHandle<()>>,
}

impl ThreadPoolExecutor {
    /// Spawn `worker_count` threads sharing a queue of `queue_capacity`
    /// pending tasks.
    ///
    /// # Panics
    ///
    /// Panics if `worker_count` is zero.
    #[must_use]
    pub fn new(worker_count: usize, queue_capacity: usize) -> Self {
        assert!(worker_count > 0, "thread pool requires at least one worker");

        let (sender, receiver) = bounded::<Task>(queue_capacity);
        let workers = (0..worker_count)
            .map(|id| spawn_worker(id, receiver.clone()))
            .collect();

        Self {
            sender: Some(sender),
            workers,
        }
    }
}

fn spawn_worker(id: usize, receiver: Receiver<Task>) -> JoinHandle<()> {
    thread::Builder::new()
        .name(format!("notifyq-worker-{id}"))
        .spawn(move || {
            while let Ok(task) = receiver.recv() {
                task();
            }
            tracing::debug!(worker = id, "notifyq worker thread exiting");
        })
        .expect("failed to spawn notifyq worker thread")
}

impl Executor for ThreadPoolExecutor {
    fn execute(&self, task: Task) -> Result<(), ExecutionRejected> {
        let Some(sender) = self.sender.as_ref() else {
            return Err(ExecutionRejected::new("worker pool has been shut down"));
        };
        sender.try_send(task).map_err(|error| match error {
            TrySendError::Full(_) => ExecutionRejected::new("worker pool queue is full"),
            TrySendError::Disconnected(_) => {
                ExecutionRejected::new("worker pool has been shut down")
            },
        })
    }
}

impl Drop for ThreadPoolExecutor {
    fn drop(&mut self) {
        // Dropping the sender closes the channel, so every worker's `recv`
        // loop exits once it has drained what's already queued.
        self.sender = None;
        for worker in self.workers.drain(..) {
            let _ = worker.join();
        }
    }
}
