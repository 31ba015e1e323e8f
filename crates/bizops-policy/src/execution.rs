//! # Fault-Isolated Rule Execution
//!
//! Runs one rule and guarantees a well-formed [`RuleResult`] comes back no
//! matter what the rule does. Three faults are recognised:
//!
//! | Fault | `error_type` in metadata |
//! |---|---|
//! | result with the wrong `rule_id` or an empty message | `INVALID_RETURN_TYPE` |
//! | rule returned `Err(RuleError)` | the `RuleError` variant name |
//! | rule panicked | `Panic` |
//!
//! Every fault becomes a failing BLOCK result stamped with the rule's own id.
//! The system fails closed: a broken rule can never let a command through.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use bizops_core::{BusinessContext, Command, ProjectedState};
use serde_json::json;

use crate::error::RuleError;
use crate::rule::{into_metadata, Rule, RuleResult, Severity};

/// Why a rule invocation did not yield a usable result.
#[derive(Debug, Clone, PartialEq)]
pub enum ExecutionFault {
    /// The rule returned a result that breaks the result contract.
    MalformedResult {
        /// What was wrong with it.
        defect: String,
    },
    /// The rule reported a data defect.
    RuleFailed(RuleError),
    /// The rule panicked.
    Panicked {
        /// Panic payload rendered as text.
        message: String,
    },
}

/// Invoke `rule`, catching panics and checking the returned result.
pub fn invoke(
    rule: &dyn Rule,
    command: &Command,
    context: &BusinessContext,
    state: &ProjectedState,
) -> Result<RuleResult, ExecutionFault> {
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| rule.evaluate(command, context, state)));
    let result = match outcome {
        Ok(Ok(result)) => result,
        Ok(Err(err)) => return Err(ExecutionFault::RuleFailed(err)),
        Err(payload) => {
            return Err(ExecutionFault::Panicked {
                message: panic_message(payload.as_ref()),
            })
        }
    };
    check_result(rule, &result)?;
    Ok(result)
}

/// Invoke `rule` and fold any fault into a BLOCK result.
pub fn execute(
    rule: &dyn Rule,
    command: &Command,
    context: &BusinessContext,
    state: &ProjectedState,
) -> RuleResult {
    match invoke(rule, command, context, state) {
        Ok(result) => result,
        Err(fault) => {
            tracing::warn!(
                rule_id = rule.rule_id(),
                rule_version = rule.version(),
                command_type = %command.command_type,
                fault = ?fault,
                "policy rule fault; failing closed"
            );
            fault_result(rule, fault)
        }
    }
}

fn check_result(rule: &dyn Rule, result: &RuleResult) -> Result<(), ExecutionFault> {
    if result.rule_id != rule.rule_id() {
        return Err(ExecutionFault::MalformedResult {
            defect: format!(
                "result rule_id {:?} does not match rule {:?}",
                result.rule_id,
                rule.rule_id()
            ),
        });
    }
    if result.message.trim().is_empty() {
        return Err(ExecutionFault::MalformedResult {
            defect: "result message is empty".to_string(),
        });
    }
    Ok(())
}

/// The synthetic BLOCK result recorded for a fault.
pub fn fault_result(rule: &dyn Rule, fault: ExecutionFault) -> RuleResult {
    let rule_id = rule.rule_id();
    let (message, metadata) = match fault {
        ExecutionFault::MalformedResult { defect } => (
            format!("Rule {rule_id} returned an invalid result: {defect}"),
            json!({
                "error_type": "INVALID_RETURN_TYPE",
                "returned_type": "RuleResult",
                "defect": defect,
            }),
        ),
        ExecutionFault::RuleFailed(err) => (
            format!("Rule {rule_id} failed during evaluation: {err}"),
            json!({
                "error_type": err.kind(),
                "exception": err.to_string(),
                "rule_version": rule.version(),
            }),
        ),
        ExecutionFault::Panicked { message } => (
            format!("Rule {rule_id} panicked during evaluation: {message}"),
            json!({
                "error_type": "Panic",
                "exception": message,
                "rule_version": rule.version(),
            }),
        ),
    };
    RuleResult {
        rule_id: rule_id.to_string(),
        passed: false,
        severity: Severity::Block,
        message,
        metadata: into_metadata(metadata),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
