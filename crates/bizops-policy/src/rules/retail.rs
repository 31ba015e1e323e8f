//! Retail rules: discount escalation and discount bounds.
//!
//! `discount_percent` is a fraction (`0.25` is 25%). The per-business
//! ceiling above which a manager must review comes from projected state as
//! `discount_threshold`.

use bizops_core::{BusinessContext, Command, ProjectedState};
use serde_json::json;

use super::{fact_f64, payload_f64, APPLY_DISCOUNT_REQUEST};
use crate::error::{ContractError, RuleError};
use crate::rule::{Rule, RuleDescriptor, RuleResult, Severity};

/// Id of [`DiscountThresholdRule`].
pub const DISCOUNT_THRESHOLD: &str = "RET-001";
/// Id of [`DiscountBoundsRule`].
pub const DISCOUNT_BOUNDS: &str = "RET-002";

const DOMAIN: &str = "retail";

/// Escalates discounts above the business's threshold.
#[derive(Debug)]
pub struct DiscountThresholdRule {
    descriptor: RuleDescriptor,
}

impl DiscountThresholdRule {
    /// Build the rule.
    pub fn new() -> Result<Self, ContractError> {
        Ok(Self {
            descriptor: RuleDescriptor::new(
                DISCOUNT_THRESHOLD,
                "1.0.0",
                DOMAIN,
                Severity::Escalate,
                [APPLY_DISCOUNT_REQUEST],
            )?,
        })
    }
}

impl Rule for DiscountThresholdRule {
    fn descriptor(&self) -> &RuleDescriptor {
        &self.descriptor
    }

    fn evaluate(
        &self,
        command: &Command,
        _context: &BusinessContext,
        state: &ProjectedState,
    ) -> Result<RuleResult, RuleError> {
        let discount = payload_f64(command, "discount_percent")?;
        let threshold = fact_f64(state, "discount_threshold")?;
        if discount > threshold {
            return Ok(self.fail(
                format!("Discount {discount} exceeds threshold {threshold}; manager review required"),
                json!({
                    "discount_percent": discount,
                    "discount_threshold": threshold,
                }),
            ));
        }
        Ok(self.pass(format!("Discount {discount} within threshold {threshold}")))
    }
}

/// Blocks discounts outside `[0, 1]`.
#[derive(Debug)]
pub struct DiscountBoundsRule {
    descriptor: RuleDescriptor,
}

impl DiscountBoundsRule {
    /// Build the rule.
    pub fn new() -> Result<Self, ContractError> {
        Ok(Self {
            descriptor: RuleDescriptor::new(
                DISCOUNT_BOUNDS,
                "1.0.0",
                DOMAIN,
                Severity::Block,
                [APPLY_DISCOUNT_REQUEST],
            )?,
        })
    }
}

impl Rule for DiscountBoundsRule {
    fn descriptor(&self) -> &RuleDescriptor {
        &self.descriptor
    }

    fn evaluate(
        &self,
        command: &Command,
        _context: &BusinessContext,
        _state: &ProjectedState,
    ) -> Result<RuleResult, RuleError> {
        let discount = payload_f64(command, "discount_percent")?;
        if !(0.0..=1.0).contains(&discount) {
            return Ok(self.fail(
                format!("Discount {discount} must lie between 0 and 1"),
                json!({ "discount_percent": discount }),
            ));
        }
        Ok(self.pass("Discount within bounds"))
    }
}
