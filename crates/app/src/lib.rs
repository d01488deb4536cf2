//! # notifyq-app
//!
//! The public `Dispatcher` application service: wires the domain's registry
//! and notification tasks to an externally supplied worker pool and invoker.
//! This crate depends on `config`, `domain`, `ports`, and `shared`.

pub mod dispatcher;

pub use dispatcher::{Dispatcher, Result};

/// Returns the app crate version.
#[must_use]
pub const fn app_crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;
    use notifyq_adapters::ThreadPoolExecutor;
    use notifyq_config::{DispatcherConfig, validate_dispatcher_config};
    use notifyq_domain::{InvokeFailure, Invoker};
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::{Arc, Barrier, Mutex};

    #[test]
    fn app_crate_compiles() {
        assert!(!app_crate_version().is_empty());
    }

    fn workspace_deps() -> Vec<String> {
        let cargo_toml = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/Cargo.toml"));
        let mut deps = Vec::new();
        let mut in_deps = false;

        for raw_line in cargo_toml.lines() {
            let line = raw_line.split('#').next().unwrap_or("").trim();
            if line.is_empty() {
                continue;
            }
            if line.starts_with('[') {
                in_deps = line == "[dependencies]";
                continue;
            }
            if !in_deps {
                continue;
            }
            if line.starts_with("notifyq-") {
                let key = line.split('=').next().unwrap_or("").trim();
                let name = key.split('.').next().unwrap_or("").trim();
                deps.push(name.to_string());
            }
        }

        deps
    }

    /// App depends only on config + domain + ports + shared: no downward
    /// dependency on adapters/infra/facade is ever allowed to sneak in.
    #[test]
    fn app_depends_only_on_config_domain_ports_and_shared() {
        let deps = workspace_deps();
        let allowed = [
            "notifyq-config",
            "notifyq-domain",
            "notifyq-ports",
            "notifyq-shared",
        ];

        for dep in &deps {
            assert!(allowed.contains(&dep.as_str()), "unexpected dependency found: {dep}");
        }

        for expected in allowed {
            assert!(deps.iter().any(|dep| dep == expected), "missing dependency: {expected}");
        }
    }

    struct RecordingInvoker {
        seen: Mutex<Vec<(u32, u32)>>,
    }

    impl Invoker<u32, u32> for RecordingInvoker {
        fn invoke(&self, listener: &u32, notification: &u32) -> Result<(), InvokeFailure> {
            self.seen
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner)
                .push((*listener, *notification));
            Ok(())
        }
    }

    fn wait_until(mut predicate: impl FnMut() -> bool) {
        let deadline = std::time::Instant::now() + std::time::Duration::from_secs(5);
        while !predicate() && std::time::Instant::now() < deadline {
            std::thread::yield_now();
        }
        assert!(predicate(), "condition did not become true in time");
    }

    #[test]
    fn submit_delivers_notifications_in_order() {
        let config =
            validate_dispatcher_config(DispatcherConfig::default()).expect("default is valid");
        let executor = Arc::new(ThreadPoolExecutor::new(4, 16));
        let invoker = Arc::new(RecordingInvoker {
            seen: Mutex::new(Vec::new()),
        });
        let dispatcher = Dispatcher::new(config, executor, Arc::clone(&invoker));

        let listener = Arc::new(1_u32);
        for value in 0..5_u32 {
            dispatcher
                .submit(Some(Arc::clone(&listener)), Some(value))
                .expect("submit accepted");
        }

        wait_until(|| {
            invoker
                .seen
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner)
                .len()
                >= 5
        });

        let seen = invoker
            .seen
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone();
        assert_eq!(seen, vec![(1, 0), (1, 1), (1, 2), (1, 3), (1, 4)]);
    }

    #[test]
    fn submit_with_missing_listener_or_notification_is_a_noop() {
        let config =
            validate_dispatcher_config(DispatcherConfig::default()).expect("default is valid");
        let executor = Arc::new(ThreadPoolExecutor::new(1, 4));
        let invoker = Arc::new(RecordingInvoker {
            seen: Mutex::new(Vec::new()),
        });
        let dispatcher = Dispatcher::new(config, executor, Arc::clone(&invoker));

        dispatcher.submit(None, Some(1_u32)).expect("no-op");
        dispatcher
            .submit(Some(Arc::new(1_u32)), None)
            .expect("no-op");

        assert!(
            invoker
                .seen
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner)
                .is_empty()
        );
        assert!(dispatcher.listener_stats().is_empty());
    }

    /// Blocks the worker thread on its first invocation only, so a test can
    /// rendezvous on `started` to know the sole worker is provably occupied
    /// before checking saturation behavior.
    struct BlockingOnceInvoker {
        started: Arc<Barrier>,
        release: Arc<Barrier>,
        blocked_once: AtomicBool,
    }

    impl Invoker<u32, u32> for BlockingOnceInvoker {
        fn invoke(&self, _listener: &u32, _notification: &u32) -> Result<(), InvokeFailure> {
            if !self.blocked_once.swap(true, Ordering::SeqCst) {
                self.started.wait();
                self.release.wait();
            }
            Ok(())
        }
    }

    #[test]
    fn saturated_executor_surfaces_rejection_to_the_caller() {
        let config =
            validate_dispatcher_config(DispatcherConfig::default()).expect("default is valid");
        let executor = Arc::new(ThreadPoolExecutor::new(1, 1));
        let started = Arc::new(Barrier::new(2));
        let release = Arc::new(Barrier::new(2));
        let invoker = Arc::new(BlockingOnceInvoker {
            started: Arc::clone(&started),
            release: Arc::clone(&release),
            blocked_once: AtomicBool::new(false),
        });
        let dispatcher = Dispatcher::new(config, executor, invoker);

        dispatcher
            .submit(Some(Arc::new(1_u32)), Some(1_u32))
            .expect("first listener's task is accepted");
        started.wait();

        dispatcher
            .submit(Some(Arc::new(2_u32)), Some(1_u32))
            .expect("second listener's task fills the executor's one-slot queue");

        let result = dispatcher.submit(Some(Arc::new(3_u32)), Some(1_u32));
        assert!(result.is_err());

        release.wait();
    }
}
