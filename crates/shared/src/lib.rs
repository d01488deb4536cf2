//! # notifyq-shared
//!
//! Shared utilities, result types, and error handling for the notifyq workspace.
//!
//! This crate provides foundational types used across all other crates:
//!
//! - Result and error envelope types
//! - Synchronous concurrency primitives (correlation ids, cancellation tokens)
//! - Bounded numeric invariants and validation helpers
//!
//! ## Design Principles
//!
//! 1. **No workspace dependencies** - This crate only depends on external crates
//! 2. **Zero-cost abstractions** - Types should compile away to efficient code
//! 3. **Serde-compatible** - All public types support serialization

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

pub mod concurrency;
pub mod errors;
pub mod invariants;
pub mod result;
pub mod retry;
pub mod timeout;
pub mod validation;

pub use concurrency::{CancellationToken, CorrelationId, RequestContext};
pub use errors::{
    ErrorClass, ErrorCode, ErrorEnvelope, ErrorKind, ErrorMetadata, REDACTED_VALUE,
    UnexpectedError, abort, check_cancelled, is_abort, normalize_unexpected_error, redact_metadata,
};
pub use invariants::{
    BoundedU32, BoundedU64, BoundedUsize, BoundsError, Unvalidated, Validated, ValidatedState,
};
pub use result::{Result, ResultExt};
pub use retry::{RetryPolicy, retry, retry_with_observer};
pub use timeout::timeout_with_context;
pub use validation::{Validate, ValidationError};

/// Returns the shared crate version.
#[must_use]
pub const fn shared_crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

// =============================================================================
// TESTS
// =============================================================================
