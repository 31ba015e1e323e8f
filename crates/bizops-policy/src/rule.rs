//! # Rule Contract
//!
//! A rule is a pure check over a command, the business it targets and a
//! snapshot of projected state. Every rule owns a [`RuleDescriptor`]: its
//! identity (`rule_id`, `version`), the `domain` it belongs to, the
//! [`Severity`] applied when it fails, and the command types it applies to.
//!
//! ## Contract Validation
//!
//! A descriptor can only be obtained through [`RuleDescriptor::new`] or
//! `TryFrom<RuleDeclaration>`, both of which enforce:
//!
//! - `rule_id` non-empty;
//! - `version` is `MAJOR.MINOR.PATCH` (`"1.0"`, `"v1"` and `"1.0.0-beta"`
//!   are rejected);
//! - `domain` non-empty;
//! - `applies_to` non-empty with no blank entries.
//!
//! A malformed rule therefore never reaches the registry.
//!
//! ## Failure Modes
//!
//! A business failure is a failing [`RuleResult`] built with
//! [`RuleDescriptor::fail`]. A data defect (missing payload field, missing
//! fact) is a [`RuleError`]; rules may use `?` and the engine folds the
//! error into a BLOCK.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use bizops_core::{BusinessContext, Command, ProjectedState};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{ContractError, RuleError};

/// Audit detail attached to a rule result. Keys serialize in sorted order.
pub type Metadata = Map<String, Value>;

// ---------------------------------------------------------------------------
// Severity
// ---------------------------------------------------------------------------

/// Enforcement grade applied when a rule fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    /// Hard block: the command is rejected.
    Block,
    /// Soft warning: recorded, the command proceeds.
    Warn,
    /// Mandatory escalation: the command proceeds but requires review.
    Escalate,
}

impl Severity {
    /// All severities.
    pub const ALL: [Severity; 3] = [Self::Block, Self::Warn, Self::Escalate];

    /// Wire form (`BLOCK`, `WARN`, `ESCALATE`).
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Block => "BLOCK",
            Self::Warn => "WARN",
            Self::Escalate => "ESCALATE",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = ContractError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "BLOCK" => Ok(Self::Block),
            "WARN" => Ok(Self::Warn),
            "ESCALATE" => Ok(Self::Escalate),
            other => Err(ContractError::InvalidSeverity {
                value: other.to_string(),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// RuleResult
// ---------------------------------------------------------------------------

/// Outcome of evaluating one rule against one command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleResult {
    /// The rule that produced this result.
    pub rule_id: String,
    /// Whether the check passed.
    pub passed: bool,
    /// The rule's grade. Informational when `passed`.
    pub severity: Severity,
    /// Human-readable explanation. Never empty.
    pub message: String,
    /// Audit detail.
    #[serde(default)]
    pub metadata: Metadata,
}

// ---------------------------------------------------------------------------
// RuleDescriptor
// ---------------------------------------------------------------------------

/// Validated identity and scope of a rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleDescriptor {
    rule_id: String,
    version: String,
    domain: String,
    severity: Severity,
    applies_to: BTreeSet<String>,
}

impl RuleDescriptor {
    /// Build a descriptor, enforcing the rule contract.
    ///
    /// # Errors
    ///
    /// Returns the first [`ContractError`] found, checked in the order
    /// rule_id, version, domain, applies_to.
    pub fn new<I, S>(
        rule_id: impl Into<String>,
        version: impl Into<String>,
        domain: impl Into<String>,
        severity: Severity,
        applies_to: I,
    ) -> Result<Self, ContractError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let rule_id = rule_id.into();
        if rule_id.trim().is_empty() {
            return Err(ContractError::EmptyRuleId);
        }
        let version = version.into();
        if !is_semantic_version(&version) {
            return Err(ContractError::InvalidVersion { rule_id, version });
        }
        let domain = domain.into();
        if domain.trim().is_empty() {
            return Err(ContractError::EmptyDomain { rule_id });
        }
        let mut commands = BTreeSet::new();
        for command_type in applies_to {
            let command_type = command_type.into();
            if command_type.trim().is_empty() {
                return Err(ContractError::EmptyCommandType { rule_id });
            }
            commands.insert(command_type);
        }
        if commands.is_empty() {
            return Err(ContractError::EmptyAppliesTo { rule_id });
        }
        Ok(Self {
            rule_id,
            version,
            domain,
            severity,
            applies_to: commands,
        })
    }

    /// Rule identifier, e.g. `INV-001`.
    pub fn rule_id(&self) -> &str {
        &self.rule_id
    }

    /// Rule version, `MAJOR.MINOR.PATCH`.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Business domain, e.g. `inventory`.
    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// Grade applied on failure.
    pub fn severity(&self) -> Severity {
        self.severity
    }

    /// Command types this rule is evaluated for, in sorted order.
    pub fn applies_to(&self) -> &BTreeSet<String> {
        &self.applies_to
    }

    /// Whether the rule is evaluated for `command_type`.
    pub fn applies(&self, command_type: &str) -> bool {
        self.applies_to.contains(command_type)
    }

    /// A passing result stamped with this rule's id and severity.
    pub fn pass(&self, message: impl Into<String>) -> RuleResult {
        RuleResult {
            rule_id: self.rule_id.clone(),
            passed: true,
            severity: self.severity,
            message: message.into(),
            metadata: Metadata::new(),
        }
    }

    /// A failing result stamped with this rule's id and severity.
    ///
    /// `metadata` is usually a `json!({...})` object. `Null` means no
    /// metadata; any other scalar is stored under `"value"`.
    pub fn fail(&self, message: impl Into<String>, metadata: Value) -> RuleResult {
        RuleResult {
            rule_id: self.rule_id.clone(),
            passed: false,
            severity: self.severity,
            message: message.into(),
            metadata: into_metadata(metadata),
        }
    }
}

pub(crate) fn into_metadata(value: Value) -> Metadata {
    match value {
        Value::Object(map) => map,
        Value::Null => Metadata::new(),
        other => {
            let mut map = Metadata::new();
            map.insert("value".to_string(), other);
            map
        }
    }
}

/// `^\d+\.\d+\.\d+$`, ASCII digits only.
fn is_semantic_version(version: &str) -> bool {
    let parts: Vec<&str> = version.split('.').collect();
    parts.len() == 3
        && parts
            .iter()
            .all(|p| !p.is_empty() && p.bytes().all(|b| b.is_ascii_digit()))
}

// ---------------------------------------------------------------------------
// RuleDeclaration
// ---------------------------------------------------------------------------

/// Unvalidated rule declaration as it appears in YAML or JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuleDeclaration {
    /// Rule identifier.
    pub rule_id: String,
    /// Rule version.
    pub version: String,
    /// Business domain.
    pub domain: String,
    /// Severity string; must be exactly `BLOCK`, `WARN` or `ESCALATE`.
    pub severity: String,
    /// Command types.
    pub applies_to: Vec<String>,
}

impl TryFrom<RuleDeclaration> for RuleDescriptor {
    type Error = ContractError;

    fn try_from(decl: RuleDeclaration) -> Result<Self, Self::Error> {
        let severity = decl.severity.parse::<Severity>()?;
        RuleDescriptor::new(
            decl.rule_id,
            decl.version,
            decl.domain,
            severity,
            decl.applies_to,
        )
    }
}

// ---------------------------------------------------------------------------
// Rule trait
// ---------------------------------------------------------------------------

/// A policy rule.
///
/// Implementations must be pure: same inputs, same result, no I/O and no
/// clock. `Send + Sync` so a locked registry can be shared across threads.
pub trait Rule: Send + Sync + fmt::Debug {
    /// The validated descriptor this rule was built with.
    fn descriptor(&self) -> &RuleDescriptor;

    /// Evaluate the rule.
    ///
    /// # Errors
    ///
    /// Returns a [`RuleError`] when the inputs are defective. The engine
    /// converts it into a BLOCK result.
    fn evaluate(
        &self,
        command: &Command,
        context: &BusinessContext,
        state: &ProjectedState,
    ) -> Result<RuleResult, RuleError>;

    /// Shorthand for `descriptor().rule_id()`.
    fn rule_id(&self) -> &str {
        self.descriptor().rule_id()
    }

    /// Shorthand for `descriptor().version()`.
    fn version(&self) -> &str {
        self.descriptor().version()
    }

    /// Shorthand for `descriptor().domain()`.
    fn domain(&self) -> &str {
        self.descriptor().domain()
    }

    /// Shorthand for `descriptor().severity()`.
    fn severity(&self) -> Severity {
        self.descriptor().severity()
    }

    /// Shorthand for `descriptor().applies_to()`.
    fn applies_to(&self) -> &BTreeSet<String> {
        self.descriptor().applies_to()
    }

    /// Shorthand for `descriptor().pass(message)`.
    fn pass(&self, message: impl Into<String>) -> RuleResult
    where
        Self: Sized,
    {
        self.descriptor().pass(message)
    }

    /// Shorthand for `descriptor().fail(message, metadata)`.
    fn fail(&self, message: impl Into<String>, metadata: Value) -> RuleResult
    where
        Self: Sized,
    {
        self.descriptor().fail(message, metadata)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn descriptor(version: &str) -> Result<RuleDescriptor, ContractError> {
        RuleDescriptor::new(
            "INV-001",
            version,
            "inventory",
            Severity::Block,
            ["inventory.stock.move.request"],
        )
    }

    #[test]
    fn accepts_semantic_versions() {
        for v in ["1.0.0", "0.0.1", "10.20.30"] {
            assert!(descriptor(v).is_ok(), "{v}");
        }
    }

    #[test]
    fn rejects_malformed_versions() {
        for v in ["1.0", "v1", "1.0.0-beta", "", "1..0", "1.0.0.0", "a.b.c", " 1.0.0"] {
            let err = descriptor(v).unwrap_err();
            assert!(matches!(err, ContractError::InvalidVersion { .. }), "{v}");
        }
    }

    #[test]
    fn rejects_empty_rule_id_and_domain() {
        let err = RuleDescriptor::new("", "1.0.0", "inventory", Severity::Warn, ["x"]).unwrap_err();
        assert_eq!(err, ContractError::EmptyRuleId);
        let err = RuleDescriptor::new("R", "1.0.0", " ", Severity::Warn, ["x"]).unwrap_err();
        assert_eq!(
            err,
            ContractError::EmptyDomain {
                rule_id: "R".into()
            }
        );
    }

    #[test]
    fn rejects_empty_applies_to() {
        let err = RuleDescriptor::new("R", "1.0.0", "d", Severity::Warn, Vec::<String>::new())
            .unwrap_err();
        assert_eq!(
            err,
            ContractError::EmptyAppliesTo {
                rule_id: "R".into()
            }
        );
        let err = RuleDescriptor::new("R", "1.0.0", "d", Severity::Warn, ["ok", ""]).unwrap_err();
        assert_eq!(
            err,
            ContractError::EmptyCommandType {
                rule_id: "R".into()
            }
        );
    }

    #[test]
    fn severity_parse_is_exact() {
        assert_eq!("BLOCK".parse::<Severity>().unwrap(), Severity::Block);
        assert_eq!("WARN".parse::<Severity>().unwrap(), Severity::Warn);
        assert_eq!("ESCALATE".parse::<Severity>().unwrap(), Severity::Escalate);
        for bad in ["CRITICAL", "block", ""] {
            assert!(matches!(
                bad.parse::<Severity>(),
                Err(ContractError::InvalidSeverity { .. })
            ));
        }
    }

    #[test]
    fn declaration_rejects_critical_severity() {
        let decl = RuleDeclaration {
            rule_id: "RET-009".into(),
            version: "1.0.0".into(),
            domain: "retail".into(),
            severity: "CRITICAL".into(),
            applies_to: vec!["retail.sale.apply_discount.request".into()],
        };
        let err = RuleDescriptor::try_from(decl).unwrap_err();
        assert_eq!(
            err,
            ContractError::InvalidSeverity {
                value: "CRITICAL".into()
            }
        );
    }

    #[test]
    fn declaration_from_yaml() {
        let decl: RuleDeclaration = serde_yaml::from_str(
            "rule_id: RET-001\nversion: 1.2.3\ndomain: retail\nseverity: ESCALATE\napplies_to: [a.b]\n",
        )
        .unwrap();
        let d = RuleDescriptor::try_from(decl).unwrap();
        assert_eq!(d.version(), "1.2.3");
        assert_eq!(d.severity(), Severity::Escalate);
        assert!(d.applies("a.b"));
        assert!(!d.applies("a.c"));
    }

    #[test]
    fn pass_and_fail_are_stamped() {
        let d = descriptor("1.0.0").unwrap();
        let ok = d.pass("fine");
        assert!(ok.passed);
        assert_eq!(ok.rule_id, "INV-001");
        assert_eq!(ok.severity, Severity::Block);
        assert!(ok.metadata.is_empty());

        let bad = d.fail("short", json!({"deficit": 90}));
        assert!(!bad.passed);
        assert_eq!(bad.metadata["deficit"], json!(90));
    }

    #[test]
    fn fail_normalizes_non_object_metadata() {
        let d = descriptor("1.0.0").unwrap();
        assert!(d.fail("m", Value::Null).metadata.is_empty());
        assert_eq!(d.fail("m", json!(5)).metadata["value"], json!(5));
    }

    #[test]
    fn severity_serializes_upper_case() {
        assert_eq!(serde_json::to_string(&Severity::Escalate).unwrap(), "\"ESCALATE\"");
        let back: Severity = serde_json::from_str("\"WARN\"").unwrap();
        assert_eq!(back, Severity::Warn);
    }
}
