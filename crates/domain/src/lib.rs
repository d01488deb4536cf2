//! # notifyq-domain
//!
//! Core dispatcher primitives: per-listener identity keys, a bounded
//! blocking queue, the notification task that drains a single listener's
//! queue in order, and the concurrent registry mapping listeners to tasks.
//!
//! This crate has no opinion on how tasks get scheduled onto threads (see
//! `notifyq-ports::Executor`) or how a listener is actually invoked (see
//! [`notification_task::Invoker`]); it only guarantees that, for a given
//! listener, notifications are delivered strictly one at a time and in
//! submission order.
//!
//! ## Dependency Rules
//!
//! - Depends only on the `shared` crate
//! - No port or adapter dependencies
//! - Pure in-process concurrency primitives, no I/O

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

pub mod bounded_queue;
pub mod listener_key;
pub mod notification_task;
pub mod queue_stats;
pub mod registry;

pub use bounded_queue::{BoundedQueue, OfferOutcome, PollOutcome};
pub use listener_key::ListenerKey;
pub use notification_task::{
    InvokeFailure, Invoker, MAX_OFFER_ATTEMPTS, NotificationTask, OFFER_TIMEOUT, POLL_TIMEOUT,
    QueuingState,
};
pub use queue_stats::ListenerQueueDepth;
pub use registry::{InsertOutcome, Registry};

/// Returns the domain crate version.
#[must_use]
pub const fn domain_crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
