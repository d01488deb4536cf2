//! # notifyq-facade
//!
//! The single crate a consumer actually depends on: re-exports the public
//! `Dispatcher`, its configuration, the two ports a caller implements
//! (`Invoker`, `Executor`), and the composition-root helpers that wire a
//! default executor and tracing subscriber together. Everything else in the
//! workspace (domain internals, the derive macro, the config schema's error
//! type) stays an implementation detail behind this surface.

pub use notifyq_app::{Dispatcher, Result};
pub use notifyq_config::{
    ConfigSchemaError, DispatcherConfig, DispatcherEnv, EnvParseError, ValidatedDispatcherConfig,
    apply_env_overrides, load_dispatcher_config_from_path, load_dispatcher_config_from_sources,
    load_dispatcher_config_std_env, parse_dispatcher_config_json, to_pretty_json,
    validate_dispatcher_config,
};
pub use notifyq_domain::{InvokeFailure, Invoker, ListenerQueueDepth};
pub use notifyq_infra::{build_dispatcher, build_dispatcher_with_config, init_tracing};
pub use notifyq_ports::{ExecutionRejected, Executor};
pub use notifyq_shared::{ErrorClass, ErrorCode, ErrorEnvelope, ErrorKind};

/// Returns the facade crate version.
#[must_use]
pub const fn facade_crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
