//! # Policy Decisions and Explanation Trees
//!
//! A [`PolicyDecision`] is the full outcome of evaluating one command:
//! failed results bucketed by severity, the `allowed` verdict, and an
//! [`ExplanationTree`] recording every rule that ran, in order.
//!
//! ## Invariant
//!
//! `allowed == violations.is_empty()`. The fields are private and the only
//! constructors derive `allowed` from the buckets (or, for persisted
//! payloads, reject any payload that disagrees), so a decision that breaks
//! the invariant cannot exist.
//!
//! ## Replay
//!
//! [`PolicyDecision::to_payload`] produces the shape handed to the event
//! store. [`PolicyDecision::from_payload`] rebuilds a decision from it, and
//! [`PolicyDecision::explanation_digest`] hashes the canonical form of the
//! explanation tree so a replay can be compared bit-for-bit.

use bizops_core::{sha256_digest, CanonicalBytes, CanonicalizationError, ContentDigest, Timestamp};
use serde::{Deserialize, Serialize};

use crate::error::PayloadError;
use crate::rule::{Metadata, RuleResult, Severity};

// ---------------------------------------------------------------------------
// ExplanationTree
// ---------------------------------------------------------------------------

/// One rule's entry in the explanation tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleDetail {
    /// Rule that ran.
    pub rule_id: String,
    /// Whether it passed.
    pub passed: bool,
    /// Its severity.
    pub severity: Severity,
    /// Its message.
    pub message: String,
    /// Its metadata.
    #[serde(default)]
    pub metadata: Metadata,
}

impl From<&RuleResult> for RuleDetail {
    fn from(r: &RuleResult) -> Self {
        Self {
            rule_id: r.rule_id.clone(),
            passed: r.passed,
            severity: r.severity,
            message: r.message.clone(),
            metadata: r.metadata.clone(),
        }
    }
}

/// Auditable record of an evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExplanationTree {
    /// Command type that was evaluated.
    pub command_type: String,
    /// Policy version the rules were taken from.
    pub policy_version: String,
    /// Caller-supplied evaluation time, `YYYY-MM-DDTHH:MM:SSZ`.
    pub evaluation_time: Option<String>,
    /// Number of rules executed.
    pub rules_evaluated: usize,
    /// Number that passed.
    pub rules_passed: usize,
    /// Number that failed.
    pub rules_failed: usize,
    /// Failed BLOCK rules.
    pub block_count: usize,
    /// Failed WARN rules.
    pub warn_count: usize,
    /// Failed ESCALATE rules.
    pub escalate_count: usize,
    /// One entry per rule, in evaluation order.
    pub details: Vec<RuleDetail>,
}

// ---------------------------------------------------------------------------
// PolicyDecision
// ---------------------------------------------------------------------------

/// Outcome of evaluating a command against a policy version.
#[derive(Debug, Clone, PartialEq)]
pub struct PolicyDecision {
    allowed: bool,
    warnings: Vec<RuleResult>,
    violations: Vec<RuleResult>,
    escalations: Vec<RuleResult>,
    explanation_tree: ExplanationTree,
    policy_version: String,
}

impl PolicyDecision {
    /// Build a decision from rule results in evaluation order.
    ///
    /// Failed results are bucketed by severity; `allowed` is true exactly
    /// when no BLOCK result failed.
    pub fn from_results(
        command_type: &str,
        policy_version: &str,
        evaluation_time: Option<Timestamp>,
        results: Vec<RuleResult>,
    ) -> Self {
        let details: Vec<RuleDetail> = results.iter().map(RuleDetail::from).collect();

        let mut warnings = Vec::new();
        let mut violations = Vec::new();
        let mut escalations = Vec::new();
        let mut rules_passed = 0;
        let rules_evaluated = results.len();

        for result in results {
            if result.passed {
                rules_passed += 1;
                continue;
            }
            match result.severity {
                Severity::Block => violations.push(result),
                Severity::Warn => warnings.push(result),
                Severity::Escalate => escalations.push(result),
            }
        }

        let explanation_tree = ExplanationTree {
            command_type: command_type.to_string(),
            policy_version: policy_version.to_string(),
            evaluation_time: evaluation_time.map(|t| t.to_iso8601()),
            rules_evaluated,
            rules_passed,
            rules_failed: rules_evaluated - rules_passed,
            block_count: violations.len(),
            warn_count: warnings.len(),
            escalate_count: escalations.len(),
            details,
        };

        Self {
            allowed: violations.is_empty(),
            warnings,
            violations,
            escalations,
            explanation_tree,
            policy_version: policy_version.to_string(),
        }
    }

    /// Whether the command may proceed.
    pub fn allowed(&self) -> bool {
        self.allowed
    }

    /// Failed WARN results.
    pub fn warnings(&self) -> &[RuleResult] {
        &self.warnings
    }

    /// Failed BLOCK results.
    pub fn violations(&self) -> &[RuleResult] {
        &self.violations
    }

    /// Failed ESCALATE results.
    pub fn escalations(&self) -> &[RuleResult] {
        &self.escalations
    }

    /// The explanation tree.
    pub fn explanation_tree(&self) -> &ExplanationTree {
        &self.explanation_tree
    }

    /// Policy version the decision was made under.
    pub fn policy_version(&self) -> &str {
        &self.policy_version
    }

    /// Any WARN failures.
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// Any BLOCK failures.
    pub fn has_violations(&self) -> bool {
        !self.violations.is_empty()
    }

    /// Any ESCALATE failures.
    pub fn has_escalations(&self) -> bool {
        !self.escalations.is_empty()
    }

    /// Whether a human must review the resulting event.
    pub fn requires_review(&self) -> bool {
        self.has_escalations()
    }

    /// SHA-256 over the JCS canonical bytes of the explanation tree.
    ///
    /// # Errors
    ///
    /// Returns [`CanonicalizationError`] if the tree cannot be serialized.
    pub fn explanation_digest(&self) -> Result<ContentDigest, CanonicalizationError> {
        let canonical = CanonicalBytes::new(&self.explanation_tree)?;
        Ok(sha256_digest(&canonical))
    }

    /// Render the decision for the event store.
    pub fn to_payload(&self) -> DecisionPayload {
        DecisionPayload {
            allowed: self.allowed,
            policy_version: self.policy_version.clone(),
            warnings: self.warnings.iter().map(Finding::from).collect(),
            violations: self.violations.iter().map(Finding::from).collect(),
            escalations: self.escalations.iter().map(Finding::from).collect(),
            explanation_tree: self.explanation_tree.clone(),
        }
    }

    /// Rebuild a decision from a persisted payload.
    ///
    /// # Errors
    ///
    /// Returns [`PayloadError::InconsistentAllowed`] if `allowed` contradicts
    /// the violations, or [`PayloadError::CountMismatch`] if a tree counter
    /// disagrees with its findings bucket.
    pub fn from_payload(payload: DecisionPayload) -> Result<Self, PayloadError> {
        if payload.allowed != payload.violations.is_empty() {
            return Err(PayloadError::InconsistentAllowed {
                allowed: payload.allowed,
                violations: payload.violations.len(),
            });
        }
        let tree = &payload.explanation_tree;
        for (counter, recorded, actual) in [
            ("block_count", tree.block_count, payload.violations.len()),
            ("warn_count", tree.warn_count, payload.warnings.len()),
            ("escalate_count", tree.escalate_count, payload.escalations.len()),
        ] {
            if recorded != actual {
                return Err(PayloadError::CountMismatch {
                    counter,
                    recorded,
                    actual,
                });
            }
        }

        let bucket = |findings: Vec<Finding>, severity: Severity| -> Vec<RuleResult> {
            findings
                .into_iter()
                .map(|f| f.into_result(severity))
                .collect()
        };

        Ok(Self {
            allowed: payload.allowed,
            warnings: bucket(payload.warnings, Severity::Warn),
            violations: bucket(payload.violations, Severity::Block),
            escalations: bucket(payload.escalations, Severity::Escalate),
            explanation_tree: payload.explanation_tree,
            policy_version: payload.policy_version,
        })
    }
}

// ---------------------------------------------------------------------------
// Payload
// ---------------------------------------------------------------------------

/// A failed rule as recorded in a decision payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    /// Rule that failed.
    pub rule_id: String,
    /// Its message.
    pub message: String,
    /// Its metadata.
    #[serde(default)]
    pub metadata: Metadata,
}

impl Finding {
    fn into_result(self, severity: Severity) -> RuleResult {
        RuleResult {
            rule_id: self.rule_id,
            passed: false,
            severity,
            message: self.message,
            metadata: self.metadata,
        }
    }
}

impl From<&RuleResult> for Finding {
    fn from(r: &RuleResult) -> Self {
        Self {
            rule_id: r.rule_id.clone(),
            message: r.message.clone(),
            metadata: r.metadata.clone(),
        }
    }
}

/// Serializable form of a [`PolicyDecision`] handed to the event store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionPayload {
    /// Verdict.
    pub allowed: bool,
    /// Policy version evaluated.
    pub policy_version: String,
    /// WARN findings.
    pub warnings: Vec<Finding>,
    /// BLOCK findings.
    pub violations: Vec<Finding>,
    /// ESCALATE findings.
    pub escalations: Vec<Finding>,
    /// Full explanation tree.
    pub explanation_tree: ExplanationTree,
}
