//! Environment variable parsing and env-to-config merging.
//!
//! Kept strict (invalid values fail fast) and deterministic, matching the
//! rest of the workspace's validation boundary style.

use crate::schema::{DispatcherConfig, ValidatedDispatcherConfig, validate_dispatcher_config};
use notifyq_shared::{ErrorCode, ErrorEnvelope};
use std::collections::BTreeMap;
use std::fmt;

/// Env var: maximum per-listener queue capacity.
pub const ENV_MAX_QUEUE_CAPACITY: &str = "NOTIFYQ_MAX_QUEUE_CAPACITY";
/// Env var: dispatcher instance name.
pub const ENV_NAME: &str = "NOTIFYQ_NAME";

/// Parsed environment overrides for [`DispatcherConfig`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatcherEnv {
    /// Parsed `NOTIFYQ_MAX_QUEUE_CAPACITY`, if present and valid.
    pub max_queue_capacity: Option<usize>,
    /// Parsed `NOTIFYQ_NAME`, if present and non-empty.
    pub name: Option<String>,
}

impl DispatcherEnv {
    /// Read overrides from an arbitrary key/value source (tests pass a
    /// fixed map; production reads `std::env::vars()`).
    pub fn from_source<I, K, V>(vars: I) -> Result<Self, EnvParseError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let map: BTreeMap<String, String> = vars
            .into_iter()
            .map(|(key, value)| (key.as_ref().to_string(), value.as_ref().to_string()))
            .collect();

        let max_queue_capacity = match map.get(ENV_MAX_QUEUE_CAPACITY) {
            None => None,
            Some(raw) => {
                let trimmed = raw.trim();
                if trimmed.is_empty() {
                    return Err(EnvParseError::EmptyValue {
                        var: ENV_MAX_QUEUE_CAPACITY,
                    });
                }
                Some(trimmed.parse::<usize>().map_err(|_| EnvParseError::InvalidInt {
                    var: ENV_MAX_QUEUE_CAPACITY,
                    value: raw.clone(),
                })?)
            },
        };

        let name = match map.get(ENV_NAME) {
            None => None,
            Some(raw) => {
                let trimmed = raw.trim();
                if trimmed.is_empty() {
                    return Err(EnvParseError::EmptyValue { var: ENV_NAME });
                }
                Some(trimmed.to_string())
            },
        };

        Ok(Self {
            max_queue_capacity,
            name,
        })
    }

    /// Read overrides from the process environment.
    pub fn from_std_env() -> Result<Self, EnvParseError> {
        Self::from_source(std::env::vars())
    }
}

/// Apply env overrides to a base config (env wins over file/default values),
/// then validate the result.
pub fn apply_env_overrides(
    base: DispatcherConfig,
    env: &DispatcherEnv,
) -> Result<ValidatedDispatcherConfig, ErrorEnvelope> {
    let mut config = base;
    if let Some(max_queue_capacity) = env.max_queue_capacity {
        config.max_queue_capacity = max_queue_capacity;
    }
    if let Some(name) = env.name.clone() {
        config.name = name;
    }
    validate_dispatcher_config(config).map_err(Into::into)
}

/// Validation failures when parsing env variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvParseError {
    /// An env var was present but empty after trimming.
    EmptyValue {
        /// Env var name.
        var: &'static str,
    },
    /// Integer env var had an invalid value.
    InvalidInt {
        /// Env var name.
        var: &'static str,
        /// Raw input value.
        value: String,
    },
}

impl fmt::Display for EnvParseError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyValue { var } => write!(formatter, "{var} must be non-empty"),
            Self::InvalidInt { var, .. } => write!(formatter, "{var} must be an integer"),
        }
    }
}

impl std::error::Error for EnvParseError {}

impl From<EnvParseError> for ErrorEnvelope {
    fn from(error: EnvParseError) -> Self {
        let var = match &error {
            EnvParseError::EmptyValue { var } | EnvParseError::InvalidInt { var, .. } => *var,
        };
        Self::expected(ErrorCode::bad_argument(), error.to_string()).with_metadata("env_var", var)
    }
}
