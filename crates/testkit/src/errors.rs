//! Fixtures for the error codes this workspace's dispatcher actually raises.

use notifyq_shared::{ErrorClass, ErrorCode, ErrorEnvelope};

/// The dispatch-namespaced error codes a `Dispatcher` can surface.
#[must_use]
pub fn dispatch_error_codes() -> Vec<ErrorCode> {
    vec![
        ErrorCode::bad_argument(),
        ErrorCode::enqueue_timeout(),
        ErrorCode::rejected(),
        ErrorCode::invoker_failure(),
        ErrorCode::cancelled(),
    ]
}

/// A `rejected` error, as surfaced when the worker pool refuses a task (S6).
#[must_use]
pub fn rejected_error(reason: impl Into<String>) -> ErrorEnvelope {
    ErrorEnvelope::expected_with_class(ErrorCode::rejected(), reason, ErrorClass::Retriable)
}

/// A `bad_argument` error, as surfaced by config/construction validation (P5).
#[must_use]
pub fn bad_argument_error(message: impl Into<String>) -> ErrorEnvelope {
    ErrorEnvelope::expected(ErrorCode::bad_argument(), message)
}
