//! # notifyq-adapters
//!
//! Reference implementations of the [`notifyq_ports::Executor`] port. This
//! crate depends only on `ports` and `shared`, matching the rest of the
//! workspace's outward-pointing dependency direction.

/// Fixed-size thread-pool backed [`notifyq_ports::Executor`].
pub mod thread_pool;

pub use thread_pool::ThreadPoolExecutor;

/// Returns the adapters crate version.
#[must_use]
pub const fn adapters_crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
