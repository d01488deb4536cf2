//! # notifyq-testkit
//!
//! In-memory `Invoker`/`Executor` test doubles, plus error fixtures, shared
//! by this workspace's own integration tests and available to downstream
//! consumers writing their own. This crate depends on `domain`, `ports`,
//! and `shared` only.

pub mod errors;
pub mod executor;
pub mod invoker;

pub use executor::{InMemoryExecutor, RejectingExecutor};
pub use invoker::{BlockingInvoker, Call, Fault, RecordingInvoker};

/// Returns the testkit crate version.
#[must_use]
pub const fn testkit_crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
