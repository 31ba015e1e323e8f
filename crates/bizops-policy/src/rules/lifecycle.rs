//! Lifecycle rule: only active businesses may change state.

use bizops_core::{BusinessContext, Command, ProjectedState};
use serde_json::json;

use super::STANDARD_COMMAND_TYPES;
use crate::error::{ContractError, RuleError};
use crate::rule::{Rule, RuleDescriptor, RuleResult, Severity};

/// Id of [`BusinessActiveRule`].
pub const BUSINESS_ACTIVE: &str = "BIZ-001";

/// Blocks every standard command while the business is not active.
#[derive(Debug)]
pub struct BusinessActiveRule {
    descriptor: RuleDescriptor,
}

impl BusinessActiveRule {
    /// Build the rule.
    pub fn new() -> Result<Self, ContractError> {
        Ok(Self {
            descriptor: RuleDescriptor::new(
                BUSINESS_ACTIVE,
                "1.0.0",
                "lifecycle",
                Severity::Block,
                STANDARD_COMMAND_TYPES,
            )?,
        })
    }
}

impl Rule for BusinessActiveRule {
    fn descriptor(&self) -> &RuleDescriptor {
        &self.descriptor
    }

    fn evaluate(
        &self,
        _command: &Command,
        context: &BusinessContext,
        _state: &ProjectedState,
    ) -> Result<RuleResult, RuleError> {
        if context.lifecycle.accepts_commands() {
            return Ok(self.pass("Business is active"));
        }
        Ok(self.fail(
            format!("Business is {}, not ACTIVE", context.lifecycle),
            json!({ "lifecycle": context.lifecycle.as_str() }),
        ))
    }
}
