//! # bizops-policy: Deterministic Policy Engine
//!
//! Decides whether a business command may proceed, and under what
//! enforcement grade, without touching storage or the clock and without
//! ever returning an error to the caller.
//!
//! ## Architecture
//!
//! - **Rule** (`rule.rs`): the rule contract, validated descriptors, and
//!   the three severities (BLOCK, WARN, ESCALATE).
//!
//! - **Registry** (`registry.rs`): `RegistryBuilder` → `LockedRegistry`
//!   typestate with frozen per-version snapshots for replay.
//!
//! - **Execution** (`execution.rs`): per-rule fault isolation. Errors,
//!   panics and malformed results become BLOCK results.
//!
//! - **Engine** (`engine.rs`): evaluates a command against a version and
//!   builds a `PolicyDecision` with an explanation tree.
//!
//! - **Config / Bootstrap** (`config.rs`, `bootstrap.rs`): YAML policy
//!   configuration and registry assembly.
//!
//! - **Rules** (`rules/`): the standard inventory, retail and lifecycle
//!   rule catalog.
//!
//! ## Crate Policy
//!
//! - Depends on `bizops-core` only.
//! - Rules are iterated in `rule_id` order from `BTreeMap`-backed indexes,
//!   so evaluation order never depends on hashing or registration races.

pub mod bootstrap;
pub mod config;
pub mod decision;
pub mod engine;
pub mod error;
pub mod execution;
pub mod registry;
pub mod rule;
pub mod rules;
pub mod version;

pub use config::PolicyConfig;
pub use decision::{DecisionPayload, ExplanationTree, Finding, PolicyDecision, RuleDetail};
pub use engine::PolicyEngine;
pub use error::{
    BootstrapError, ConfigError, ContractError, PayloadError, PolicyError, RegistryError,
    RuleError,
};
pub use registry::{LockedRegistry, RegistryBuilder, RuleRef};
pub use rule::{Metadata, Rule, RuleDeclaration, RuleDescriptor, RuleResult, Severity};
pub use version::{PolicyVersion, INITIAL_POLICY_VERSION};
