//! # notifyq-infra
//!
//! The composition root: the one place in this workspace that loads
//! configuration from the environment, installs a tracing subscriber, and
//! wires a [`notifyq_adapters::ThreadPoolExecutor`] and a caller-supplied
//! invoker into a running [`notifyq_app::Dispatcher`]. Every other crate
//! only ever emits `tracing` events or returns `ErrorEnvelope`s; this crate
//! is where that ends up pointed at stdout and where threads actually get
//! spawned.

pub mod composition;
pub mod telemetry;

pub use composition::{build_dispatcher, build_dispatcher_with_config};
pub use telemetry::init_tracing;

/// Returns the infra crate version.
#[must_use]
pub const fn infra_crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn workspace_deps() -> Vec<String> {
        let cargo_toml = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/Cargo.toml"));
        let mut deps = Vec::new();
        let mut in_deps = false;

        for raw_line in cargo_toml.lines() {
            let line = raw_line.split('#').next().unwrap_or("").trim();
            if line.is_empty() {
                continue;
            }
            if line.starts_with('[') {
                in_deps = line == "[dependencies]";
                continue;
            }
            if !in_deps {
                continue;
            }
            if line.starts_with("notifyq-") {
                let key = line.split('=').next().unwrap_or("").trim();
                let name = key.split('.').next().unwrap_or("").trim();
                deps.push(name.to_string());
            }
        }

        deps
    }

    /// Infra may reach into every other layer: it is the composition root,
    /// not a layer other crates depend on.
    #[test]
    fn infra_depends_on_app_adapters_config_domain_ports_and_shared() {
        let deps = workspace_deps();
        let required = [
            "notifyq-adapters",
            "notifyq-app",
            "notifyq-config",
            "notifyq-domain",
            "notifyq-ports",
            "notifyq-shared",
        ];

        for expected in required {
            assert!(
                deps.iter().any(|dep| dep == expected),
                "missing dependency: {expected}"
            );
        }
    }

    #[test]
    fn infra_crate_compiles() {
        assert!(!infra_crate_version().is_empty());
    }
}
