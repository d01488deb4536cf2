//! Dispatcher configuration schema, defaults, and validation.
//!
//! Validation is derived via `notifyq_validate_derive::Validate`, the same
//! mechanism request DTOs elsewhere in the workspace use for bounds and
//! non-empty checks.

use notifyq_shared::{ErrorCode, ErrorEnvelope, Validate, Validated, ValidationError};
use serde::{Deserialize, Serialize};
use std::fmt;

const DEFAULT_MAX_QUEUE_CAPACITY: usize = 1_000;
const DEFAULT_NAME: &str = "default";

/// Raw, not-yet-validated dispatcher configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, notifyq_validate_derive::Validate)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
#[validate(error = "ConfigSchemaError")]
pub struct DispatcherConfig {
    /// Upper bound on how many notifications may be queued for any single
    /// listener before `submit` starts reporting `EnqueueTimeout`. Must be
    /// positive (P5: `maxQueueCapacity <= 0` is `BadArgument`).
    #[validate(field = "maxQueueCapacity", range(min = 1, max = 1_000_000))]
    pub max_queue_capacity: usize,
    /// Human-readable name for this dispatcher instance, used to tag log
    /// lines and correlation ids when a process runs more than one.
    #[validate(field = "name", non_empty)]
    pub name: String,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            max_queue_capacity: DEFAULT_MAX_QUEUE_CAPACITY,
            name: DEFAULT_NAME.to_string(),
        }
    }
}

/// A [`DispatcherConfig`] that has passed validation.
pub type ValidatedDispatcherConfig = Validated<DispatcherConfig>;

/// Validate `config`, producing a [`ValidatedDispatcherConfig`] on success.
pub fn validate_dispatcher_config(
    config: DispatcherConfig,
) -> Result<ValidatedDispatcherConfig, ConfigSchemaError> {
    config.validate()?;
    Ok(Validated::new(config))
}

/// Validation failure for [`DispatcherConfig`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSchemaError {
    /// A required field was empty.
    Empty {
        /// The field name, as it appears in the serialized config.
        field: &'static str,
    },
    /// A field value failed an arbitrary validity check.
    Invalid {
        /// The field name.
        field: &'static str,
        /// Why the value was rejected.
        reason: &'static str,
    },
    /// A numeric field was outside its allowed range.
    OutOfRange {
        /// The field name.
        field: &'static str,
        /// The rejected value.
        value: String,
        /// Inclusive minimum, as a string.
        min: String,
        /// Inclusive maximum, as a string.
        max: String,
    },
}

impl ValidationError for ConfigSchemaError {
    fn empty(field: &'static str) -> Self {
        Self::Empty { field }
    }

    fn invalid(field: &'static str, reason: &'static str) -> Self {
        Self::Invalid { field, reason }
    }

    fn out_of_range(field: &'static str, value: String, min: String, max: String) -> Self {
        Self::OutOfRange {
            field,
            value,
            min,
            max,
        }
    }
}

impl fmt::Display for ConfigSchemaError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty { field } => write!(formatter, "{field} must be non-empty"),
            Self::Invalid { field, reason } => write!(formatter, "{field} is invalid: {reason}"),
            Self::OutOfRange { field, value, min, max } => write!(
                formatter,
                "{field} must be between {min} and {max}, got {value}"
            ),
        }
    }
}

impl std::error::Error for ConfigSchemaError {}

impl From<ConfigSchemaError> for ErrorEnvelope {
    fn from(error: ConfigSchemaError) -> Self {
        Self::expected(ErrorCode::bad_argument(), error.to_string())
    }
}

/// Parse a [`DispatcherConfig`] from a JSON document.
pub fn parse_dispatcher_config_json(json: &str) -> Result<DispatcherConfig, ErrorEnvelope> {
    serde_json::from_str(json).map_err(|error| {
        ErrorEnvelope::expected(ErrorCode::bad_argument(), format!("invalid config JSON: {error}"))
    })
}
