//! End-to-end scenarios (S1-S6) exercised against the public `Dispatcher`,
//! using this workspace's in-memory `Invoker`/`Executor` test doubles.

use notifyq_adapters::ThreadPoolExecutor;
use notifyq_facade::{Dispatcher, DispatcherConfig, ErrorCode, validate_dispatcher_config};
use notifyq_testkit::{BlockingInvoker, Fault, RecordingInvoker};
use std::sync::{Arc, Barrier};
use std::time::{Duration, Instant};

fn wait_until(mut predicate: impl FnMut() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(10);
    while !predicate() && Instant::now() < deadline {
        std::thread::yield_now();
    }
    assert!(predicate(), "condition did not become true in time");
}

/// S1: single listener, single producer, capacity 4 — delivery order must
/// match submission order.
#[test]
fn s1_single_listener_single_producer_preserves_order() {
    let config = validate_dispatcher_config(DispatcherConfig {
        max_queue_capacity: 4,
        ..DispatcherConfig::default()
    })
    .expect("valid config");
    let executor = Arc::new(ThreadPoolExecutor::new(2, 16));
    let invoker = Arc::new(RecordingInvoker::<u32, &'static str>::new());
    let dispatcher = Dispatcher::new(config, executor, Arc::clone(&invoker));

    let listener = Arc::new(1_u32);
    for value in ["a", "b", "c"] {
        dispatcher
            .submit(Some(Arc::clone(&listener)), Some(value))
            .expect("submit accepted");
    }

    wait_until(|| invoker.call_count() >= 3);
    let notifications: Vec<&str> = invoker.calls().into_iter().map(|call| call.notification).collect();
    assert_eq!(notifications, vec!["a", "b", "c"]);
}

/// S2: invoker raises a recoverable error on the middle notification; all
/// three are still delivered, in order, and the task retires normally.
#[test]
fn s2_recoverable_failure_on_middle_notification_does_not_stop_delivery() {
    let config = validate_dispatcher_config(DispatcherConfig::default()).expect("valid config");
    let executor = Arc::new(ThreadPoolExecutor::new(1, 16));
    let invoker = Arc::new(
        RecordingInvoker::<u32, &'static str>::new().with_fault(1, Fault::Recoverable("boom".into())),
    );
    let dispatcher = Dispatcher::new(config, executor, Arc::clone(&invoker));

    let listener = Arc::new(1_u32);
    for value in ["a", "b", "c"] {
        dispatcher
            .submit(Some(Arc::clone(&listener)), Some(value))
            .expect("submit accepted");
    }

    wait_until(|| invoker.call_count() >= 3);
    let notifications: Vec<&str> = invoker.calls().into_iter().map(|call| call.notification).collect();
    assert_eq!(notifications, vec!["a", "b", "c"]);
    assert!(dispatcher.listener_stats().is_empty(), "task should have retired");
}

struct SlowInvoker {
    seen: std::sync::Mutex<Vec<u32>>,
}

impl notifyq_facade::Invoker<u32, u32> for SlowInvoker {
    fn invoke(&self, _listener: &u32, notification: &u32) -> std::result::Result<(), notifyq_facade::InvokeFailure> {
        std::thread::sleep(Duration::from_micros(200));
        self.seen
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(*notification);
        Ok(())
    }
}

/// S3: slow invoker, fast producer, small capacity — every notification
/// submitted arrives in order, even though the producer has to wait for the
/// queue to drain between offers.
#[test]
fn s3_slow_invoker_fast_producer_small_capacity_preserves_order() {
    let config = validate_dispatcher_config(DispatcherConfig {
        max_queue_capacity: 2,
        ..DispatcherConfig::default()
    })
    .expect("valid config");
    let executor = Arc::new(ThreadPoolExecutor::new(1, 4));
    let invoker = Arc::new(SlowInvoker {
        seen: std::sync::Mutex::new(Vec::new()),
    });
    let dispatcher = Dispatcher::new(config, executor, Arc::clone(&invoker));

    let listener = Arc::new(1_u32);
    for value in 0..50_u32 {
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
            >= 50
    });

    let seen = invoker
        .seen
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner)
        .clone();
    assert_eq!(seen, (0..50).collect::<Vec<_>>());
}

/// S4: many producers racing to submit for the same listener while tasks
/// are concurrently draining and retiring — every notification must be
/// delivered exactly once, never dropped and never duplicated.
#[test]
fn s4_concurrent_producers_never_drop_or_duplicate_during_retirement_races() {
    let config = validate_dispatcher_config(DispatcherConfig::default()).expect("valid config");
    let executor = Arc::new(ThreadPoolExecutor::new(4, 64));
    let invoker = Arc::new(RecordingInvoker::<u32, u32>::new());
    let dispatcher = Arc::new(Dispatcher::new(config, executor, Arc::clone(&invoker)));

    let listener = Arc::new(1_u32);
    const PER_THREAD: u32 = 200;
    let threads: Vec<_> = (0..4u32)
        .map(|thread_id| {
            let dispatcher = Arc::clone(&dispatcher);
            let listener = Arc::clone(&listener);
            std::thread::spawn(move || {
                for offset in 0..PER_THREAD {
                    let value = thread_id * PER_THREAD + offset;
                    dispatcher
                        .submit(Some(Arc::clone(&listener)), Some(value))
                        .expect("submit accepted");
                }
            })
        })
        .collect();

    for thread in threads {
        thread.join().expect("producer thread panicked");
    }

    wait_until(|| invoker.call_count() >= (4 * PER_THREAD) as usize);

    let mut seen: Vec<u32> = invoker.calls().into_iter().map(|call| call.notification).collect();
    seen.sort_unstable();
    let expected: Vec<u32> = (0..4 * PER_THREAD).collect();
    assert_eq!(seen, expected, "every submitted notification must be delivered exactly once");
}

#[derive(Debug, Clone)]
struct BuggyEquals(&'static str);

impl PartialEq for BuggyEquals {
    fn eq(&self, _other: &Self) -> bool {
        // Always reports equal, regardless of identity. The dispatcher must
        // not be fooled by this.
        true
    }
}

struct BlockUntilReleased {
    started: Arc<Barrier>,
    release: Arc<Barrier>,
}

impl notifyq_facade::Invoker<BuggyEquals, u32> for BlockUntilReleased {
    fn invoke(&self, _listener: &BuggyEquals, _notification: &u32) -> std::result::Result<(), notifyq_facade::InvokeFailure> {
        self.started.wait();
        self.release.wait();
        Ok(())
    }
}

/// S5: two listener instances whose own equality reports them as equal are
/// still treated as distinct — each gets its own queue and its own task.
#[test]
fn s5_listeners_with_buggy_equality_get_independent_tasks() {
    let config = validate_dispatcher_config(DispatcherConfig::default()).expect("valid config");
    let executor = Arc::new(ThreadPoolExecutor::new(2, 8));
    let started = Arc::new(Barrier::new(3));
    let release = Arc::new(Barrier::new(3));
    let invoker = Arc::new(BlockUntilReleased {
        started: Arc::clone(&started),
        release: Arc::clone(&release),
    });
    let dispatcher = Dispatcher::new(config, executor, invoker);

    let listener_a = Arc::new(BuggyEquals("same"));
    let listener_b = Arc::new(BuggyEquals("same"));
    assert_eq!(listener_a, listener_b, "the buggy equality really does say they're equal");

    dispatcher
        .submit(Some(Arc::clone(&listener_a)), Some(1_u32))
        .expect("submit accepted");
    dispatcher
        .submit(Some(Arc::clone(&listener_b)), Some(2_u32))
        .expect("submit accepted");

    // Both workers are now blocked mid-invocation, one per listener, so
    // neither task has retired yet.
    started.wait();
    assert_eq!(
        dispatcher.listener_stats().len(),
        2,
        "colliding equality must not merge the two listeners' tasks"
    );

    release.wait();
}

/// S6: a saturated worker pool only rejects submissions that need to create
/// a fresh task; a submission for a listener with a still-live task is
/// unaffected.
#[test]
fn s6_worker_pool_saturation_only_blocks_fresh_tasks() {
    let config = validate_dispatcher_config(DispatcherConfig::default()).expect("valid config");
    let executor = Arc::new(ThreadPoolExecutor::new(1, 1));
    let started = Arc::new(Barrier::new(2));
    let release = Arc::new(Barrier::new(2));
    let invoker = Arc::new(BlockingInvoker::new(Arc::clone(&started), Arc::clone(&release)));
    let dispatcher = Dispatcher::new(config, executor, invoker);

    let listener_a = Arc::new(1_u32);
    dispatcher
        .submit(Some(Arc::clone(&listener_a)), Some(1_u32))
        .expect("first listener's task is accepted");
    started.wait();

    dispatcher
        .submit(Some(Arc::clone(&listener_a)), Some(2_u32))
        .expect("listener_a already has a live task: the saturated pool is never consulted");

    let listener_b = Arc::new(2_u32);
    dispatcher
        .submit(Some(Arc::clone(&listener_b)), Some(1_u32))
        .expect("second listener's task fills the executor's one queue slot");

    let listener_c = Arc::new(3_u32);
    let result = dispatcher.submit(Some(listener_c), Some(1_u32));
    assert!(result.is_err(), "a third, distinct listener has nowhere to go");
    assert_eq!(result.unwrap_err().code, ErrorCode::rejected());

    release.wait();
}

struct ReentrancyGuardInvoker {
    busy: std::sync::atomic::AtomicBool,
    violated: std::sync::atomic::AtomicBool,
    calls: std::sync::atomic::AtomicUsize,
}

impl notifyq_facade::Invoker<u32, u32> for ReentrancyGuardInvoker {
    fn invoke(&self, _listener: &u32, _notification: &u32) -> std::result::Result<(), notifyq_facade::InvokeFailure> {
        use std::sync::atomic::Ordering;
        if self.busy.swap(true, Ordering::SeqCst) {
            self.violated.store(true, Ordering::SeqCst);
        }
        std::thread::sleep(Duration::from_micros(50));
        self.busy.store(false, Ordering::SeqCst);
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// P2: no listener ever has two notifications in flight at once, even under
/// many producers hammering the same listener through a multi-worker pool.
#[test]
fn p2_invoker_is_never_reentered_concurrently_for_the_same_listener() {
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    let config = validate_dispatcher_config(DispatcherConfig::default()).expect("valid config");
    let executor = Arc::new(ThreadPoolExecutor::new(8, 64));
    let invoker = Arc::new(ReentrancyGuardInvoker {
        busy: AtomicBool::new(false),
        violated: AtomicBool::new(false),
        calls: AtomicUsize::new(0),
    });
    let dispatcher = Arc::new(Dispatcher::new(config, executor, Arc::clone(&invoker)));

    let listener = Arc::new(1_u32);
    const PER_THREAD: usize = 100;
    let threads: Vec<_> = (0..8)
        .map(|_| {
            let dispatcher = Arc::clone(&dispatcher);
            let listener = Arc::clone(&listener);
            std::thread::spawn(move || {
                for value in 0..PER_THREAD as u32 {
                    dispatcher
                        .submit(Some(Arc::clone(&listener)), Some(value))
                        .expect("submit accepted");
                }
            })
        })
        .collect();
    for thread in threads {
        thread.join().expect("producer thread panicked");
    }

    wait_until(|| invoker.calls.load(Ordering::SeqCst) >= 8 * PER_THREAD);
    assert!(!invoker.violated.load(Ordering::SeqCst), "invoker was entered concurrently for one listener");
}

/// P5: construction with `maxQueueCapacity <= 0` fails with `BadArgument`,
/// surfaced through the same `ErrorEnvelope` every other fallible boundary
/// in this workspace uses.
#[test]
fn p5_zero_capacity_is_rejected_as_bad_argument() {
    let config = DispatcherConfig {
        max_queue_capacity: 0,
        ..DispatcherConfig::default()
    };
    let error: notifyq_facade::ErrorEnvelope = validate_dispatcher_config(config)
        .expect_err("zero capacity must fail validation")
        .into();
    assert_eq!(error.code, ErrorCode::bad_argument());
}
