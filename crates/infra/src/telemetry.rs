//! Process-wide tracing subscriber setup.
//!
//! Every other crate in this workspace only ever emits `tracing` events; a
//! subscriber is installed exactly once, here, by whatever binary or
//! long-running test actually wants readable output.

use tracing_subscriber::EnvFilter;

/// Install a `fmt` subscriber filtered by `RUST_LOG` (`info` by default).
///
/// Safe to call more than once per process: a second call is a no-op rather
/// than a panic, since integration tests across this crate's own `tests/`
/// binaries each run in a separate process but a single `cargo test` can
/// still exercise this more than once within one.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_tracing_is_idempotent() {
        init_tracing();
        init_tracing();
    }
}
