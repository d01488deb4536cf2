//! Timeout helpers with cancellation awareness.

use crate::{ErrorClass, ErrorCode, ErrorEnvelope, RequestContext, Result};
use std::sync::mpsc::RecvTimeoutError;
use std::time::{Duration, Instant};

/// Run `op` on a dedicated thread, bounding how long the caller waits for it
/// and honoring cancellation on `ctx` while waiting.
///
/// `op` keeps running to completion on its own thread even if this call
/// returns a timeout error first; callers that need the work itself aborted
/// must build that into `op` (e.g. by checking a cancellation token).
pub fn timeout_with_context<T, F>(
    ctx: &RequestContext,
    timeout: Duration,
    operation: &'static str,
    op: F,
) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    ctx.ensure_not_cancelled(operation)?;

    let (tx, rx) = std::sync::mpsc::channel();
    std::thread::spawn(move || {
        let _ = tx.send(op());
    });

    let deadline = Instant::now() + timeout;
    let poll_slice = Duration::from_millis(20);

    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return Err(timeout_error(operation));
        }
        match rx.recv_timeout(remaining.min(poll_slice)) {
            Ok(result) => return result,
            Err(RecvTimeoutError::Timeout) => {
                if ctx.is_cancelled() {
                    return Err(cancelled_error(operation));
                }
            },
            Err(RecvTimeoutError::Disconnected) => {
                return Err(ErrorEnvelope::unexpected(
                    ErrorCode::internal(),
                    format!("{operation} worker thread dropped its result"),
                    ErrorClass::NonRetriable,
                ));
            },
        }
    }
}

fn timeout_error(operation: &'static str) -> ErrorEnvelope {
    ErrorEnvelope::unexpected(
        ErrorCode::timeout(),
        format!("operation timed out: {operation}"),
        ErrorClass::Retriable,
    )
    .with_metadata("operation", operation)
}

fn cancelled_error(operation: &'static str) -> ErrorEnvelope {
    ErrorEnvelope::cancelled("operation cancelled").with_metadata("operation", operation)
}
