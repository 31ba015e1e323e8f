//! Inventory rules: stock availability, positive quantities, reorder warnings.
//!
//! All three read `quantity` from the command payload. Stock facts come from
//! projected state: `available_stock` (required) and `reorder_point`
//! (optional).

use bizops_core::{BusinessContext, Command, ProjectedState};
use serde_json::json;

use super::{fact_i64, optional_fact_i64, payload_i64, STOCK_MOVE_REQUEST, STOCK_RESERVE_REQUEST};
use crate::error::{ContractError, RuleError};
use crate::rule::{Rule, RuleDescriptor, RuleResult, Severity};

/// Id of [`StockAvailabilityRule`].
pub const STOCK_AVAILABILITY: &str = "INV-001";
/// Id of [`PositiveQuantityRule`].
pub const POSITIVE_QUANTITY: &str = "INV-002";
/// Id of [`ReorderPointRule`].
pub const REORDER_POINT: &str = "INV-003";

const DOMAIN: &str = "inventory";

/// Blocks a move or reservation of more units than are on hand.
#[derive(Debug)]
pub struct StockAvailabilityRule {
    descriptor: RuleDescriptor,
}

impl StockAvailabilityRule {
    /// Build the rule.
    pub fn new() -> Result<Self, ContractError> {
        Ok(Self {
            descriptor: RuleDescriptor::new(
                STOCK_AVAILABILITY,
                "1.0.0",
                DOMAIN,
                Severity::Block,
                [STOCK_MOVE_REQUEST, STOCK_RESERVE_REQUEST],
            )?,
        })
    }
}

impl Rule for StockAvailabilityRule {
    fn descriptor(&self) -> &RuleDescriptor {
        &self.descriptor
    }

    fn evaluate(
        &self,
        command: &Command,
        _context: &BusinessContext,
        state: &ProjectedState,
    ) -> Result<RuleResult, RuleError> {
        let requested = payload_i64(command, "quantity")?;
        let available = fact_i64(state, "available_stock")?;
        if requested > available {
            return Ok(self.fail(
                format!("Insufficient stock: requested {requested}, available {available}"),
                json!({
                    "requested": requested,
                    "available": available,
                    "deficit": requested.saturating_sub(available),
                }),
            ));
        }
        Ok(self.pass(format!("Stock sufficient: requested {requested}, available {available}")))
    }
}

/// Blocks zero or negative quantities.
#[derive(Debug)]
pub struct PositiveQuantityRule {
    descriptor: RuleDescriptor,
}

impl PositiveQuantityRule {
    /// Build the rule.
    pub fn new() -> Result<Self, ContractError> {
        Ok(Self {
            descriptor: RuleDescriptor::new(
                POSITIVE_QUANTITY,
                "1.0.0",
                DOMAIN,
                Severity::Block,
                [STOCK_MOVE_REQUEST, STOCK_RESERVE_REQUEST],
            )?,
        })
    }
}

impl Rule for PositiveQuantityRule {
    fn descriptor(&self) -> &RuleDescriptor {
        &self.descriptor
    }

    fn evaluate(
        &self,
        command: &Command,
        _context: &BusinessContext,
        _state: &ProjectedState,
    ) -> Result<RuleResult, RuleError> {
        let quantity = payload_i64(command, "quantity")?;
        if quantity <= 0 {
            return Ok(self.fail(
                format!("Quantity must be positive, got {quantity}"),
                json!({ "quantity": quantity }),
            ));
        }
        Ok(self.pass("Quantity is positive"))
    }
}

/// Warns when a move would leave stock below the reorder point.
///
/// Businesses that have not configured a reorder point always pass.
#[derive(Debug)]
pub struct ReorderPointRule {
    descriptor: RuleDescriptor,
}

impl ReorderPointRule {
    /// Build the rule.
    pub fn new() -> Result<Self, ContractError> {
        Ok(Self {
            descriptor: RuleDescriptor::new(
                REORDER_POINT,
                "1.0.0",
                DOMAIN,
                Severity::Warn,
                [STOCK_MOVE_REQUEST],
            )?,
        })
    }
}

impl Rule for ReorderPointRule {
    fn descriptor(&self) -> &RuleDescriptor {
        &self.descriptor
    }

    fn evaluate(
        &self,
        command: &Command,
        _context: &BusinessContext,
        state: &ProjectedState,
    ) -> Result<RuleResult, RuleError> {
        let Some(reorder_point) = optional_fact_i64(state, "reorder_point")? else {
            return Ok(self.pass("No reorder point configured"));
        };
        let quantity = payload_i64(command, "quantity")?;
        let available = fact_i64(state, "available_stock")?;
        let remaining = available.saturating_sub(quantity);
        if remaining < reorder_point {
            return Ok(self.fail(
                format!("Remaining stock {remaining} falls below reorder point {reorder_point}"),
                json!({
                    "remaining": remaining,
                    "reorder_point": reorder_point,
                }),
            ));
        }
        Ok(self.pass(format!("Remaining stock {remaining} at or above reorder point")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::fixtures::{active, command};

    fn mv(quantity: i64) -> Command {
        command(STOCK_MOVE_REQUEST).with_payload("quantity", quantity)
    }

    #[test]
    fn availability_blocks_with_deficit() {
        let rule = StockAvailabilityRule::new().unwrap();
        let state = ProjectedState::new().with("available_stock", 10);
        let r = rule.evaluate(&mv(100), &active(), &state).unwrap();
        assert!(!r.passed);
        assert_eq!(r.severity, Severity::Block);
        assert_eq!(r.metadata["requested"], json!(100));
        assert_eq!(r.metadata["available"], json!(10));
        assert_eq!(r.metadata["deficit"], json!(90));
    }

    #[test]
    fn availability_deficit_saturates_at_extremes() {
        let rule = StockAvailabilityRule::new().unwrap();
        let state = ProjectedState::new().with("available_stock", -5);
        let r = crate::execution::execute(&rule, &mv(i64::MAX), &active(), &state);
        assert!(!r.passed);
        assert_eq!(r.rule_id, STOCK_AVAILABILITY);
        assert!(r.message.starts_with("Insufficient stock"));
        assert!(r.metadata.get("error_type").is_none());
        assert_eq!(r.metadata["deficit"], json!(i64::MAX));
    }

    #[test]
    fn availability_passes_at_exact_stock() {
        let rule = StockAvailabilityRule::new().unwrap();
        let state = ProjectedState::new().with("available_stock", 10);
        assert!(rule.evaluate(&mv(10), &active(), &state).unwrap().passed);
    }

    #[test]
    fn availability_requires_stock_fact() {
        let rule = StockAvailabilityRule::new().unwrap();
        let err = rule
            .evaluate(&mv(1), &active(), &ProjectedState::new())
            .unwrap_err();
        assert_eq!(
            err,
            RuleError::MissingFact {
                key: "available_stock".into()
            }
        );
    }

    #[test]
    fn positive_quantity() {
        let rule = PositiveQuantityRule::new().unwrap();
        let state = ProjectedState::new();
        assert!(rule.evaluate(&mv(1), &active(), &state).unwrap().passed);
        assert!(!rule.evaluate(&mv(0), &active(), &state).unwrap().passed);
        assert!(!rule.evaluate(&mv(-3), &active(), &state).unwrap().passed);
    }

    #[test]
    fn reorder_point_is_optional() {
        let rule = ReorderPointRule::new().unwrap();
        let state = ProjectedState::new();
        assert!(rule.evaluate(&mv(5), &active(), &state).unwrap().passed);
    }

    #[test]
    fn reorder_point_warns_below_threshold() {
        let rule = ReorderPointRule::new().unwrap();
        let state = ProjectedState::new()
            .with("available_stock", 20)
            .with("reorder_point", 10);
        assert!(rule.evaluate(&mv(10), &active(), &state).unwrap().passed);
        let r = rule.evaluate(&mv(11), &active(), &state).unwrap();
        assert!(!r.passed);
        assert_eq!(r.severity, Severity::Warn);
        assert_eq!(r.metadata["remaining"], json!(9));
    }

    #[test]
    fn reorder_point_applies_to_moves_only() {
        let rule = ReorderPointRule::new().unwrap();
        assert!(rule.descriptor().applies(STOCK_MOVE_REQUEST));
        assert!(!rule.descriptor().applies(STOCK_RESERVE_REQUEST));
    }
}
