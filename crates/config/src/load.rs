//! Config loading helpers (env + file + overrides).
//!
//! The loader is responsible for deterministic merge order and surfacing
//! user-facing errors as typed `ErrorEnvelope`s.

use crate::env::{DispatcherEnv, apply_env_overrides};
use crate::schema::{DispatcherConfig, ValidatedDispatcherConfig, parse_dispatcher_config_json};
use notifyq_shared::{ErrorCode, ErrorEnvelope};
use std::fs;
use std::path::Path;

/// Load the dispatcher config from sources using a deterministic precedence
/// order.
///
/// Precedence (highest wins):
/// - env overrides (`NOTIFYQ_MAX_QUEUE_CAPACITY`, `NOTIFYQ_NAME`)
/// - config JSON (file content)
/// - defaults (`DispatcherConfig::default()`)
pub fn load_dispatcher_config_from_sources(
    config_json: Option<&str>,
    env: &DispatcherEnv,
) -> Result<ValidatedDispatcherConfig, ErrorEnvelope> {
    let config = match config_json {
        None => DispatcherConfig::default(),
        Some(input) => parse_dispatcher_config_json(input)?,
    };

    apply_env_overrides(config, env)
}

/// Load the dispatcher config from an optional file path, falling back to
/// defaults when `config_path` is `None`.
pub fn load_dispatcher_config_from_path(
    config_path: Option<&Path>,
    env: &DispatcherEnv,
) -> Result<ValidatedDispatcherConfig, ErrorEnvelope> {
    let config_text = match config_path {
        None => None,
        Some(path) => Some(read_config_file(path)?),
    };
    load_dispatcher_config_from_sources(config_text.as_deref(), env)
}

/// Load the dispatcher config using only the process environment and
/// built-in defaults, the common case for a composition root.
pub fn load_dispatcher_config_std_env() -> Result<ValidatedDispatcherConfig, ErrorEnvelope> {
    let env = DispatcherEnv::from_std_env().map_err(Into::<ErrorEnvelope>::into)?;
    load_dispatcher_config_from_sources(None, &env)
}

/// Pretty-print a config as JSON for diagnostics (e.g. an operator-facing
/// "effective config" dump).
pub fn to_pretty_json(config: &DispatcherConfig) -> Result<String, ErrorEnvelope> {
    serde_json::to_string_pretty(config).map_err(|error| {
        ErrorEnvelope::expected(ErrorCode::internal(), format!("failed to serialize config: {error}"))
    })
}

fn read_config_file(path: &Path) -> Result<String, ErrorEnvelope> {
    fs::read_to_string(path).map_err(|error| {
        ErrorEnvelope::expected(
            ErrorCode::bad_argument(),
            format!("failed to read config file {}: {error}", path.display()),
        )
    })
}
