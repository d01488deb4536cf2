//! # notifyq-config
//!
//! Configuration schema, validation, and loading for the dispatcher. This
//! crate depends on `shared` and `validate-derive` only.

/// Environment variable parsing and merging.
pub mod env;
/// Config loading helpers (env + file + overrides).
pub mod load;
/// Configuration schema types and helpers.
pub mod schema;

pub use env::{DispatcherEnv, ENV_MAX_QUEUE_CAPACITY, ENV_NAME, EnvParseError, apply_env_overrides};
pub use load::{
    load_dispatcher_config_from_path, load_dispatcher_config_from_sources,
    load_dispatcher_config_std_env, to_pretty_json,
};
pub use schema::{
    ConfigSchemaError, DispatcherConfig, ValidatedDispatcherConfig, parse_dispatcher_config_json,
    validate_dispatcher_config,
};

/// Returns the config crate version.
#[must_use]
pub const fn config_crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
