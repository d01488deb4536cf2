//! # notifyq-ports
//!
//! Port traits for the notifyq hexagonal architecture.
//!
//! This crate defines the interface between the dispatcher's application
//! layer and the infrastructure that actually runs work and invokes
//! listeners. It depends only on `domain` and `shared`.

pub mod executor;

pub use executor::{ExecutionRejected, Executor};

// Re-export the domain-level delivery contract so adapter crates can
// implement invokers without depending on `notifyq-domain` directly.
pub use notifyq_domain::{InvokeFailure, Invoker};

/// Returns the ports crate version.
#[must_use]
pub const fn ports_crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;
    use notifyq_domain::domain_crate_version;
    use notifyq_shared::shared_crate_version;

    fn workspace_deps() -> Vec<String> {
        let cargo_toml = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/Cargo.toml"));
        let mut deps = Vec::new();
        let mut in_deps = false;
        let mut in_dev_deps = false;

        for raw_line in cargo_toml.lines() {
            let line = raw_line.split('#').next().unwrap_or("").trim();
            if line.is_empty() {
                continue;
            }
            if line.starts_with('[') {
                in_deps = line == "[dependencies]";
                in_dev_deps = line == "[dev-dependencies]";
                continue;
            }
            if !(in_deps || in_dev_deps) {
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

    /// Ports depends only on domain + shared: no upward dependency on the
    /// application, adapter, or infra layers is ever allowed to sneak in.
    #[test]
    fn ports_depends_only_on_domain_and_shared() {
        let deps = workspace_deps();
        let allowed = ["notifyq-domain", "notifyq-shared"];

        for dep in &deps {
            assert!(
                allowed.contains(&dep.as_str()),
                "unexpected dependency found: {dep}"
            );
        }

        for expected in allowed {
            assert!(
                deps.iter().any(|dep| dep == expected),
                "missing dependency: {expected}"
            );
        }
    }

    #[test]
    fn ports_crate_compiles() {
        let version = ports_crate_version();
        assert!(!version.is_empty());
    }

    #[test]
    fn ports_can_use_domain_and_shared() {
        let domain_version = domain_crate_version();
        let shared_version = shared_crate_version();

        assert!(!domain_version.is_empty());
        assert!(!shared_version.is_empty());
    }
}
