//! # Structural Validation
//!
//! The first stage of dispatch. A [`CommandValidator`] checks that a command
//! is well-formed and addressed to the business in `context` before any
//! policy rule runs. Failures are business rejections, not errors.
//!
//! [`StructuralValidator`] rejects inactive businesses itself
//! (`BUSINESS_NOT_ACTIVE`), so rule `BIZ-001` only fires behind a validator
//! that lets them through.

use std::fmt;

use bizops_core::{BusinessContext, Command};
use serde::{Deserialize, Serialize};

/// Command type is empty or not dotted lowercase segments.
pub const MALFORMED_COMMAND_TYPE: &str = "MALFORMED_COMMAND_TYPE";
/// Command tenant differs from the context tenant.
pub const TENANT_MISMATCH: &str = "TENANT_MISMATCH";
/// Command business differs from the context business.
pub const BUSINESS_MISMATCH: &str = "BUSINESS_MISMATCH";
/// Business lifecycle does not accept commands.
pub const BUSINESS_NOT_ACTIVE: &str = "BUSINESS_NOT_ACTIVE";

/// Why a command was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectionReason {
    /// Machine-readable code, e.g. `POLICY_INV-001`.
    pub code: String,
    /// Human-readable explanation.
    pub message: String,
}

impl RejectionReason {
    /// Build a rejection.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

/// Structural and context validation run before policy evaluation.
pub trait CommandValidator: Send + Sync {
    /// Accept or reject `command` for `context`.
    fn validate(&self, command: &Command, context: &BusinessContext) -> Result<(), RejectionReason>;
}

impl<F> CommandValidator for F
where
    F: Fn(&Command, &BusinessContext) -> Result<(), RejectionReason> + Send + Sync,
{
    fn validate(&self, command: &Command, context: &BusinessContext) -> Result<(), RejectionReason> {
        self(command, context)
    }
}

/// Reference validator.
///
/// Checks, in order: command type shape (`domain.entity.action.request`
/// style, at least two dot-separated segments of `[a-z0-9_]`), tenant,
/// business, lifecycle.
#[derive(Debug, Clone, Copy, Default)]
pub struct StructuralValidator;

impl CommandValidator for StructuralValidator {
    fn validate(&self, command: &Command, context: &BusinessContext) -> Result<(), RejectionReason> {
        if !is_well_formed_command_type(&command.command_type) {
            return Err(RejectionReason::new(
                MALFORMED_COMMAND_TYPE,
                format!("Malformed command type {:?}", command.command_type),
            ));
        }
        if command.tenant_id != context.tenant_id {
            return Err(RejectionReason::new(
                TENANT_MISMATCH,
                format!(
                    "Command tenant {} does not own business context tenant {}",
                    command.tenant_id, context.tenant_id
                ),
            ));
        }
        if command.business_id != context.business_id {
            return Err(RejectionReason::new(
                BUSINESS_MISMATCH,
                format!(
                    "Command targets business {} but context is for {}",
                    command.business_id, context.business_id
                ),
            ));
        }
        if !context.lifecycle.accepts_commands() {
            return Err(RejectionReason::new(
                BUSINESS_NOT_ACTIVE,
                format!("Business is {}", context.lifecycle),
            ));
        }
        Ok(())
    }
}

fn is_well_formed_command_type(command_type: &str) -> bool {
    let segments: Vec<&str> = command_type.split('.').collect();
    segments.len() >= 2
        && segments.iter().all(|s| {
            !s.is_empty()
                && s.bytes()
                    .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'_')
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use bizops_core::{BusinessId, BusinessLifecycleState, TenantId, Timestamp};

    fn pair(command_type: &str) -> (Command, BusinessContext) {
        let tenant = TenantId::new("acme").unwrap();
        let business = BusinessId::new();
        let command = Command::new(
            tenant.clone(),
            business,
            command_type,
            Timestamp::parse("2026-02-01T09:00:00Z").unwrap(),
        )
        .unwrap();
        (
            command,
            BusinessContext::new(tenant, business, BusinessLifecycleState::Active),
        )
    }

    fn code(r: Result<(), RejectionReason>) -> String {
        r.unwrap_err().code
    }

    #[test]
    fn accepts_well_formed_command() {
        let (cmd, ctx) = pair("retail.sale.apply_discount.request");
        assert!(StructuralValidator.validate(&cmd, &ctx).is_ok());
    }

    #[test]
    fn rejects_malformed_types() {
        for bad in ["single", "a..b", "Retail.sale", "a.b c", ".a", "a."] {
            let (mut cmd, ctx) = pair("x.y");
            cmd.command_type = bad.to_string();
            assert_eq!(code(StructuralValidator.validate(&cmd, &ctx)), MALFORMED_COMMAND_TYPE, "{bad}");
        }
    }

    #[test]
    fn rejects_tenant_and_business_mismatch() {
        let (cmd, mut ctx) = pair("x.y");
        ctx.tenant_id = TenantId::new("globex").unwrap();
        assert_eq!(code(StructuralValidator.validate(&cmd, &ctx)), TENANT_MISMATCH);

        let (cmd, mut ctx) = pair("x.y");
        ctx.business_id = BusinessId::new();
        assert_eq!(code(StructuralValidator.validate(&cmd, &ctx)), BUSINESS_MISMATCH);
    }

    #[test]
    fn rejects_inactive_business() {
        let (cmd, mut ctx) = pair("x.y");
        ctx.lifecycle = BusinessLifecycleState::Suspended;
        let reason = StructuralValidator.validate(&cmd, &ctx).unwrap_err();
        assert_eq!(reason.code, BUSINESS_NOT_ACTIVE);
        assert!(reason.message.contains("SUSPENDED"));
    }

    #[test]
    fn closures_are_validators() {
        let reject_all = |_: &Command, _: &BusinessContext| -> Result<(), RejectionReason> {
            Err(RejectionReason::new("NOPE", "no"))
        };
        let (cmd, ctx) = pair("x.y");
        assert_eq!(reject_all.validate(&cmd, &ctx).unwrap_err().to_string(), "NOPE: no");
    }
}
