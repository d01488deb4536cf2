//! Builds a ready-to-use [`Dispatcher`] from a validated config and a
//! caller-supplied invoker, the same way the rest of this workspace's
//! factories turn configuration into a live adapter.

use notifyq_adapters::ThreadPoolExecutor;
use notifyq_app::Dispatcher;
use notifyq_config::{ValidatedDispatcherConfig, load_dispatcher_config_std_env};
use notifyq_domain::Invoker;
use notifyq_shared::ErrorEnvelope;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::thread::available_parallelism;

/// Pending tasks the executor's shared channel holds before rejecting
/// further work, independent of a listener's own queue capacity.
const DEFAULT_EXECUTOR_QUEUE_CAPACITY: usize = 4_096;

/// Fallback worker count when the host can't report its parallelism.
const FALLBACK_WORKER_COUNT: usize = 4;

/// Load config from the process environment and build a [`Dispatcher`]
/// backed by a [`ThreadPoolExecutor`] sized to the host's parallelism.
pub fn build_dispatcher<L, N>(
    invoker: Arc<dyn Invoker<L, N>>,
) -> Result<Dispatcher<L, N>, ErrorEnvelope>
where
    L: Send + Sync + 'static,
    N: Send + 'static,
{
    let config = load_dispatcher_config_std_env()?;
    Ok(build_dispatcher_with_config(config, invoker))
}

/// Build a [`Dispatcher`] from an already-validated config, for callers that
/// load configuration some other way (tests, a non-env composition path).
#[must_use]
pub fn build_dispatcher_with_config<L, N>(
    config: ValidatedDispatcherConfig,
    invoker: Arc<dyn Invoker<L, N>>,
) -> Dispatcher<L, N>
where
    L: Send + Sync + 'static,
    N: Send + 'static,
{
    let worker_count = available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(FALLBACK_WORKER_COUNT);
    let executor = Arc::new(ThreadPoolExecutor::new(
        worker_count,
        DEFAULT_EXECUTOR_QUEUE_CAPACITY,
    ));
    Dispatcher::new(config, executor, invoker)
}

#[cfg(test)]
mod tests {
    use super::*;
    use notifyq_config::DispatcherConfig;
    use notifyq_domain::InvokeFailure;
    use std::sync::Mutex;

    struct RecordingInvoker {
        seen: Mutex<Vec<u32>>,
    }

    impl Invoker<u32, u32> for RecordingInvoker {
        fn invoke(&self, _listener: &u32, notification: &u32) -> Result<(), InvokeFailure> {
            self.seen
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner)
                .push(*notification);
            Ok(())
        }
    }

    #[test]
    fn build_dispatcher_with_config_produces_a_usable_dispatcher() {
        let config = notifyq_config::validate_dispatcher_config(DispatcherConfig::default())
            .expect("default is valid");
        let invoker = Arc::new(RecordingInvoker {
            seen: Mutex::new(Vec::new()),
        });
        let dispatcher = build_dispatcher_with_config(config, invoker);

        assert_eq!(dispatcher.max_queue_capacity(), 1_000);
        assert!(dispatcher.listener_stats().is_empty());
    }
}
