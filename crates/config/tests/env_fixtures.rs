//! Integration tests for env parsing and env-to-config merging.

use notifyq_config::{DispatcherConfig, DispatcherEnv, EnvParseError, apply_env_overrides};
use notifyq_shared::ErrorCode;

#[test]
fn env_overrides_merge_into_effective_config() {
    let env = DispatcherEnv::from_source([("NOTIFYQ_MAX_QUEUE_CAPACITY", "256"), (
        "NOTIFYQ_NAME",
        "orders-dispatcher",
    )])
    .expect("valid env vars");

    let validated =
        apply_env_overrides(DispatcherConfig::default(), &env).expect("valid overrides");

    assert_eq!(validated.max_queue_capacity, 256);
    assert_eq!(validated.name, "orders-dispatcher");
}

#[test]
fn partial_env_overrides_preserve_base_fields() {
    let env = DispatcherEnv::from_source([("NOTIFYQ_NAME", "orders-dispatcher")])
        .expect("valid env vars");
    let base = DispatcherConfig {
        max_queue_capacity: 32,
        name: "default".to_string(),
    };

    let validated = apply_env_overrides(base, &env).expect("valid overrides");

    assert_eq!(validated.max_queue_capacity, 32);
    assert_eq!(validated.name, "orders-dispatcher");
}

#[test]
fn invalid_env_value_is_rejected() {
    let result = DispatcherEnv::from_source([("NOTIFYQ_MAX_QUEUE_CAPACITY", "not-a-number")]);
    let error = result.err().expect("non-numeric capacity is rejected");
    assert!(matches!(error, EnvParseError::InvalidInt { .. }));

    let envelope: notifyq_shared::ErrorEnvelope = error.into();
    assert_eq!(envelope.code, ErrorCode::bad_argument());
}

#[test]
fn env_override_failing_validation_surfaces_as_error() {
    let env = DispatcherEnv::from_source([("NOTIFYQ_MAX_QUEUE_CAPACITY", "0")])
        .expect("parses as an integer");
    let result = apply_env_overrides(DispatcherConfig::default(), &env);
    assert!(result.is_err());
}
