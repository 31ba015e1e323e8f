//! # Standard Rule Catalog
//!
//! Rules shipped with the platform, grouped by business domain:
//!
//! | id | domain | severity | fails when |
//! |---|---|---|---|
//! | `INV-001` | inventory | BLOCK | quantity exceeds available stock |
//! | `INV-002` | inventory | BLOCK | quantity is not positive |
//! | `INV-003` | inventory | WARN | remaining stock drops below the reorder point |
//! | `RET-001` | retail | ESCALATE | discount exceeds the business threshold |
//! | `RET-002` | retail | BLOCK | discount lies outside `[0, 1]` |
//! | `BIZ-001` | lifecycle | BLOCK | the business is not active |
//!
//! Missing payload fields and facts surface as [`RuleError`]s and fail
//! closed through the engine.

pub mod inventory;
pub mod lifecycle;
pub mod retail;

use std::sync::Arc;

use bizops_core::{Command, ProjectedState};

use crate::error::{ContractError, RuleError};
use crate::registry::RuleRef;

pub use inventory::{PositiveQuantityRule, ReorderPointRule, StockAvailabilityRule};
pub use lifecycle::BusinessActiveRule;
pub use retail::{DiscountBoundsRule, DiscountThresholdRule};

/// Move stock between locations.
pub const STOCK_MOVE_REQUEST: &str = "inventory.stock.move.request";
/// Reserve stock against an order.
pub const STOCK_RESERVE_REQUEST: &str = "inventory.stock.reserve.request";
/// Apply a discount to a sale.
pub const APPLY_DISCOUNT_REQUEST: &str = "retail.sale.apply_discount.request";

/// Every command type the standard catalog covers.
pub const STANDARD_COMMAND_TYPES: [&str; 3] =
    [STOCK_MOVE_REQUEST, STOCK_RESERVE_REQUEST, APPLY_DISCOUNT_REQUEST];

/// Ids of every standard rule, in catalog order.
pub const STANDARD_RULE_IDS: [&str; 6] = [
    inventory::STOCK_AVAILABILITY,
    inventory::POSITIVE_QUANTITY,
    inventory::REORDER_POINT,
    retail::DISCOUNT_THRESHOLD,
    retail::DISCOUNT_BOUNDS,
    lifecycle::BUSINESS_ACTIVE,
];

/// Build one standard rule by id. `Ok(None)` if the id is not in the catalog.
///
/// # Errors
///
/// Propagates a [`ContractError`] from the rule's descriptor.
pub fn standard_rule(rule_id: &str) -> Result<Option<RuleRef>, ContractError> {
    let rule: RuleRef = match rule_id {
        inventory::STOCK_AVAILABILITY => Arc::new(StockAvailabilityRule::new()?),
        inventory::POSITIVE_QUANTITY => Arc::new(PositiveQuantityRule::new()?),
        inventory::REORDER_POINT => Arc::new(ReorderPointRule::new()?),
        retail::DISCOUNT_THRESHOLD => Arc::new(DiscountThresholdRule::new()?),
        retail::DISCOUNT_BOUNDS => Arc::new(DiscountBoundsRule::new()?),
        lifecycle::BUSINESS_ACTIVE => Arc::new(BusinessActiveRule::new()?),
        _ => return Ok(None),
    };
    Ok(Some(rule))
}

/// Build the full standard catalog, in catalog order.
///
/// # Errors
///
/// Propagates a [`ContractError`] from any rule's descriptor.
pub fn standard_rules() -> Result<Vec<RuleRef>, ContractError> {
    let mut rules = Vec::with_capacity(STANDARD_RULE_IDS.len());
    for rule_id in STANDARD_RULE_IDS {
        if let Some(rule) = standard_rule(rule_id)? {
            rules.push(rule);
        }
    }
    Ok(rules)
}

// ---------------------------------------------------------------------------
// Input helpers
// ---------------------------------------------------------------------------

pub(crate) fn payload_i64(command: &Command, field: &str) -> Result<i64, RuleError> {
    match command.payload_value(field) {
        None => Err(RuleError::MissingPayloadField {
            field: field.to_string(),
        }),
        Some(v) => v.as_i64().ok_or_else(|| invalid(field, "integer")),
    }
}

pub(crate) fn payload_f64(command: &Command, field: &str) -> Result<f64, RuleError> {
    match command.payload_value(field) {
        None => Err(RuleError::MissingPayloadField {
            field: field.to_string(),
        }),
        Some(v) => v.as_f64().ok_or_else(|| invalid(field, "number")),
    }
}

pub(crate) fn fact_i64(state: &ProjectedState, key: &str) -> Result<i64, RuleError> {
    optional_fact_i64(state, key)?.ok_or_else(|| RuleError::MissingFact {
        key: key.to_string(),
    })
}

pub(crate) fn optional_fact_i64(state: &ProjectedState, key: &str) -> Result<Option<i64>, RuleError> {
    match state.get(key) {
        None => Ok(None),
        Some(v) => v.as_i64().map(Some).ok_or_else(|| invalid(key, "integer")),
    }
}

pub(crate) fn fact_f64(state: &ProjectedState, key: &str) -> Result<f64, RuleError> {
    match state.get(key) {
        None => Err(RuleError::MissingFact {
            key: key.to_string(),
        }),
        Some(v) => v.as_f64().ok_or_else(|| invalid(key, "number")),
    }
}

fn invalid(field: &str, expected: &str) -> RuleError {
    RuleError::InvalidValue {
        field: field.to_string(),
        expected: expected.to_string(),
    }
}
