//! # Policy Error Types
//!
//! Two taxonomies live in this crate and they never mix:
//!
//! - **Setup-time errors** ([`ContractError`], [`RegistryError`],
//!   [`ConfigError`], [`BootstrapError`]) are returned while the rule
//!   catalog is being built and abort bootstrap.
//! - **Rule data errors** ([`RuleError`]) are returned by a rule's
//!   `evaluate` when its inputs are defective. The engine never propagates
//!   them; they are folded into a BLOCK result.
//!
//! Business rejections are not errors at all. They are failing
//! `RuleResult`s inside a `PolicyDecision`.

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error for bootstrap code that wants a single error type.
#[derive(Error, Debug)]
pub enum PolicyError {
    /// A rule declaration or policy version failed validation.
    #[error("contract error: {0}")]
    Contract(#[from] ContractError),

    /// The registry refused a rule.
    #[error("registry error: {0}")]
    Registry(#[from] RegistryError),

    /// A persisted decision payload could not be rebuilt.
    #[error("payload error: {0}")]
    Payload(#[from] PayloadError),

    /// Policy configuration could not be loaded.
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// The registry could not be assembled from configuration.
    #[error("bootstrap error: {0}")]
    Bootstrap(#[from] BootstrapError),
}

/// A rule declaration or policy version violates the rule contract.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ContractError {
    /// `rule_id` is empty or whitespace.
    #[error("rule_id must be non-empty")]
    EmptyRuleId,

    /// `version` is not `MAJOR.MINOR.PATCH` with decimal components.
    #[error("rule {rule_id}: version {version:?} must match MAJOR.MINOR.PATCH")]
    InvalidVersion {
        /// Offending rule.
        rule_id: String,
        /// The rejected version string.
        version: String,
    },

    /// `domain` is empty or whitespace.
    #[error("rule {rule_id}: domain must be non-empty")]
    EmptyDomain {
        /// Offending rule.
        rule_id: String,
    },

    /// Severity string is not one of BLOCK, WARN, ESCALATE.
    #[error("invalid severity {value:?}: expected one of BLOCK, WARN, ESCALATE")]
    InvalidSeverity {
        /// The rejected severity string.
        value: String,
    },

    /// `applies_to` names no command types.
    #[error("rule {rule_id}: applies_to must name at least one command type")]
    EmptyAppliesTo {
        /// Offending rule.
        rule_id: String,
    },

    /// An `applies_to` entry is empty or whitespace.
    #[error("rule {rule_id}: applies_to contains an empty command type")]
    EmptyCommandType {
        /// Offending rule.
        rule_id: String,
    },

    /// A policy version was declared with an empty id.
    #[error("policy version_id must be non-empty")]
    EmptyPolicyVersionId,
}

/// The registry refused a registration.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// A rule with the same `(rule_id, version)` is already registered.
    #[error("rule {rule_id} version {version} is already registered")]
    DuplicateRule {
        /// Rule identifier.
        rule_id: String,
        /// Rule version.
        version: String,
    },
}

/// Data defect hit by a rule while evaluating a command.
///
/// Returning one of these is the polite way for a rule to fail; the engine
/// turns it into a BLOCK result whose metadata names the variant.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RuleError {
    /// A required command payload field is absent.
    #[error("missing payload field: {field}")]
    MissingPayloadField {
        /// Payload key.
        field: String,
    },

    /// A required projected-state fact is absent.
    #[error("missing projected fact: {key}")]
    MissingFact {
        /// Fact key.
        key: String,
    },

    /// A value is present but of the wrong type or out of range.
    #[error("invalid value for {field}: expected {expected}")]
    InvalidValue {
        /// Payload key or fact key.
        field: String,
        /// What the rule expected.
        expected: String,
    },

    /// Any other defect inside the rule.
    #[error("internal rule error: {0}")]
    Internal(String),
}

impl RuleError {
    /// Name of the variant, recorded as `error_type` in fault metadata.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MissingPayloadField { .. } => "MissingPayloadField",
            Self::MissingFact { .. } => "MissingFact",
            Self::InvalidValue { .. } => "InvalidValue",
            Self::Internal(_) => "Internal",
        }
    }
}

/// A persisted decision payload is internally inconsistent.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PayloadError {
    /// `allowed` disagrees with the presence of violations.
    #[error("payload allowed={allowed} contradicts {violations} violation(s)")]
    InconsistentAllowed {
        /// The stored `allowed` flag.
        allowed: bool,
        /// Number of stored violations.
        violations: usize,
    },

    /// An explanation tree counter disagrees with the findings.
    #[error("explanation tree {counter}={recorded} but payload carries {actual} finding(s)")]
    CountMismatch {
        /// Which counter (`block_count`, `warn_count`, `escalate_count`).
        counter: &'static str,
        /// Value recorded in the tree.
        recorded: usize,
        /// Number of findings in the payload.
        actual: usize,
    },
}

/// Policy configuration could not be loaded.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The YAML document is malformed or has unknown fields.
    #[error("failed to parse policy config at {path}: {source}")]
    YamlParse {
        /// Source path, or `<inline>` for strings.
        path: PathBuf,
        /// Underlying parser error.
        source: serde_yaml::Error,
    },

    /// The config file does not exist.
    #[error("policy config not found: {path}")]
    FileNotFound {
        /// Path that was looked up.
        path: PathBuf,
    },

    /// The config file exists but could not be read.
    #[error("failed to read policy config at {path}: {source}")]
    Io {
        /// Path that was read.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
}

/// The rule registry could not be assembled from configuration.
#[derive(Error, Debug)]
pub enum BootstrapError {
    /// Configuration declares no policy versions.
    #[error("policy config declares no versions")]
    EmptyVersionList,

    /// `standard_rules` names a rule that is not in the standard catalog.
    #[error("unknown standard rule: {rule_id}")]
    UnknownStandardRule {
        /// The unrecognised id.
        rule_id: String,
    },

    /// `default_policy_version` is not among the declared versions.
    #[error("default policy version {version_id} is not declared in versions")]
    UnknownDefaultVersion {
        /// The configured default.
        version_id: String,
    },

    /// A version's `created_at` is not a UTC timestamp.
    #[error("invalid created_at for version {version_id}: {source}")]
    InvalidCreatedAt {
        /// Version being declared.
        version_id: String,
        /// Parse failure.
        source: bizops_core::ValidationError,
    },

    /// A rule or version failed contract validation.
    #[error("contract error: {0}")]
    Contract(#[from] ContractError),

    /// The registry refused a rule.
    #[error("registry error: {0}")]
    Registry(#[from] RegistryError),
}
