//! # Registry Bootstrap
//!
//! Turns a [`PolicyConfig`] into a [`LockedRegistry`]:
//!
//! 1. Validate the declared versions (at least one, UTC timestamps, the
//!    default among them).
//! 2. Register the selected standard rules.
//! 3. Lock with the first version, then freeze each remaining version.
//!
//! Any failure aborts bootstrap; a half-built registry is never returned.

use bizops_core::Timestamp;

use crate::config::PolicyConfig;
use crate::error::BootstrapError;
use crate::registry::{LockedRegistry, RegistryBuilder};
use crate::rules::{standard_rule, standard_rules};
use crate::version::PolicyVersion;

/// Build and lock the registry described by `config`.
///
/// # Errors
///
/// See [`BootstrapError`].
pub fn build_registry(config: &PolicyConfig) -> Result<LockedRegistry, BootstrapError> {
    let mut versions = Vec::with_capacity(config.versions.len());
    for v in &config.versions {
        let created_at =
            Timestamp::parse(&v.created_at).map_err(|source| BootstrapError::InvalidCreatedAt {
                version_id: v.version_id.clone(),
                source,
            })?;
        versions.push(PolicyVersion::new(&v.version_id, created_at, &v.description)?);
    }
    if versions.is_empty() {
        return Err(BootstrapError::EmptyVersionList);
    }
    if !versions
        .iter()
        .any(|v| v.version_id() == config.default_policy_version)
    {
        return Err(BootstrapError::UnknownDefaultVersion {
            version_id: config.default_policy_version.clone(),
        });
    }

    let builder = RegistryBuilder::new();
    let rules = match &config.standard_rules {
        None => standard_rules()?,
        Some(ids) => {
            let mut rules = Vec::with_capacity(ids.len());
            for rule_id in ids {
                let rule = standard_rule(rule_id)?.ok_or_else(|| {
                    BootstrapError::UnknownStandardRule {
                        rule_id: rule_id.clone(),
                    }
                })?;
                rules.push(rule);
            }
            rules
        }
    };
    for rule in rules {
        builder.register_rule(rule)?;
    }

    let mut versions = versions.into_iter();
    let first = versions.next();
    let mut registry = builder.lock(first);
    for version in versions {
        registry.freeze(version);
    }

    tracing::info!(
        rule_count = registry.rule_count(),
        versions = registry.versions().len(),
        default_policy_version = %config.default_policy_version,
        "policy registry bootstrapped"
    );
    Ok(registry)
}
