//! # Command Dispatcher
//!
//! The pipeline every business command passes through:
//!
//! 1. **Validation.** The [`CommandValidator`] rejects malformed or
//!    misaddressed commands. No policy rule runs for them.
//! 2. **Policy evaluation.** If an engine is configured, the command is
//!    evaluated with `evaluation_time = command.issued_at`. Any BLOCK
//!    violation rejects with code `POLICY_<rule_id>` of the first
//!    violation.
//! 3. **Legacy checks.** Ad-hoc checks that predate the rule catalog run in
//!    registration order; the first rejection wins.
//! 4. Otherwise the command is accepted.
//!
//! ## Hard Block vs. Soft Signals
//!
//! Only BLOCK violations stop a command. WARN results ride along in the
//! decision; ESCALATE results let the command through but mark its event
//! REVIEW_REQUIRED (see [`CommandOutcome::enforced_event_status`]).

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use bizops_core::{BusinessContext, Command, ProjectedState};
use bizops_policy::PolicyEngine;

use crate::outcome::CommandOutcome;
use crate::validation::{CommandValidator, RejectionReason};

/// An ad-hoc check run after policy evaluation.
pub type LegacyPolicy =
    Arc<dyn Fn(&Command, &BusinessContext) -> Option<RejectionReason> + Send + Sync>;

/// Rejection code recorded when a legacy check panics.
pub const LEGACY_POLICY_FAULT: &str = "LEGACY_POLICY_FAULT";

/// Runs commands through validation, policy evaluation and legacy checks.
#[derive(Clone)]
pub struct CommandDispatcher {
    validator: Arc<dyn CommandValidator>,
    policy_engine: Option<PolicyEngine>,
    legacy_policies: Vec<LegacyPolicy>,
}

impl fmt::Debug for CommandDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandDispatcher")
            .field("policy_engine", &self.policy_engine)
            .field("legacy_policies", &self.legacy_policies.len())
            .finish_non_exhaustive()
    }
}

impl CommandDispatcher {
    /// A dispatcher with no policy engine and no legacy checks.
    pub fn new(validator: impl CommandValidator + 'static) -> Self {
        Self {
            validator: Arc::new(validator),
            policy_engine: None,
            legacy_policies: Vec::new(),
        }
    }

    /// Evaluate commands against `engine` after validation.
    pub fn with_policy_engine(mut self, engine: PolicyEngine) -> Self {
        self.policy_engine = Some(engine);
        self
    }

    /// Append a legacy check.
    pub fn with_legacy_policy<F>(mut self, check: F) -> Self
    where
        F: Fn(&Command, &BusinessContext) -> Option<RejectionReason> + Send + Sync + 'static,
    {
        self.legacy_policies.push(Arc::new(check));
        self
    }

    /// The configured engine, if any.
    pub fn policy_engine(&self) -> Option<&PolicyEngine> {
        self.policy_engine.as_ref()
    }

    /// Dispatch one command.
    pub fn dispatch(
        &self,
        command: &Command,
        context: &BusinessContext,
        projected_state: Option<&ProjectedState>,
        policy_version: Option<&str>,
    ) -> CommandOutcome {
        if let Err(reason) = self.validator.validate(command, context) {
            return reject(command, reason, None);
        }

        let decision = self.policy_engine.as_ref().map(|engine| {
            engine.evaluate(
                command,
                context,
                projected_state,
                policy_version,
                Some(command.issued_at),
            )
        });

        if let Some(first) = decision.as_ref().and_then(|d| d.violations().first()) {
            let reason =
                RejectionReason::new(format!("POLICY_{}", first.rule_id), first.message.clone());
            return reject(command, reason, decision);
        }

        for check in &self.legacy_policies {
            if let Some(reason) = run_legacy(check, command, context) {
                return reject(command, reason, decision);
            }
        }

        let outcome = CommandOutcome::accepted(command.command_id, decision);
        tracing::debug!(
            command_id = %command.command_id,
            command_type = %command.command_type,
            event_status = outcome.enforced_event_status().as_str(),
            "command accepted"
        );
        outcome
    }
}

fn run_legacy(
    check: &LegacyPolicy,
    command: &Command,
    context: &BusinessContext,
) -> Option<RejectionReason> {
    match panic::catch_unwind(AssertUnwindSafe(|| check(command, context))) {
        Ok(result) => result,
        Err(_) => {
            tracing::warn!(
                command_id = %command.command_id,
                command_type = %command.command_type,
                "legacy policy check panicked; rejecting"
            );
            Some(RejectionReason::new(
                LEGACY_POLICY_FAULT,
                "A legacy policy check failed unexpectedly",
            ))
        }
    }
}

fn reject(
    command: &Command,
    reason: RejectionReason,
    decision: Option<bizops_policy::PolicyDecision>,
) -> CommandOutcome {
    tracing::info!(
        command_id = %command.command_id,
        command_type = %command.command_type,
        code = %reason.code,
        "command rejected"
    );
    CommandOutcome::rejected(command.command_id, reason, decision)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outcome::{EventStatus, OutcomeStatus};
    use crate::validation::{StructuralValidator, TENANT_MISMATCH};
    use bizops_core::{BusinessId, BusinessLifecycleState, TenantId, Timestamp};
    use bizops_policy::rules::{APPLY_DISCOUNT_REQUEST, STOCK_MOVE_REQUEST};
    use bizops_policy::{PolicyVersion, RegistryBuilder};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn engine() -> PolicyEngine {
        let builder = RegistryBuilder::new();
        for rule in bizops_policy::rules::standard_rules().unwrap() {
            builder.register_rule(rule).unwrap();
        }
        let v = PolicyVersion::new("1.0.0", Timestamp::parse("2026-01-01T00:00:00Z").unwrap(), "")
            .unwrap();
        PolicyEngine::new(Arc::new(builder.lock(Some(v))))
    }

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

    #[test]
    fn validation_failure_skips_policy() {
        let (cmd, mut ctx) = pair(STOCK_MOVE_REQUEST);
        ctx.tenant_id = TenantId::new("globex").unwrap();
        let out = CommandDispatcher::new(StructuralValidator)
            .with_policy_engine(engine())
            .dispatch(&cmd, &ctx, None, None);
        assert_eq!(out.status(), OutcomeStatus::Rejected);
        assert_eq!(out.rejection().unwrap().code, TENANT_MISMATCH);
        assert!(out.decision().is_none());
    }

    #[test]
    fn violation_rejects_with_policy_code() {
        let (cmd, ctx) = pair(STOCK_MOVE_REQUEST);
        let cmd = cmd.with_payload("quantity", 100);
        let state = ProjectedState::new().with("available_stock", 10);
        let out = CommandDispatcher::new(StructuralValidator)
            .with_policy_engine(engine())
            .dispatch(&cmd, &ctx, Some(&state), None);
        let reason = out.rejection().unwrap();
        assert_eq!(reason.code, "POLICY_INV-001");
        assert!(reason.message.contains("Insufficient stock"));
        assert_eq!(out.enforced_event_status(), EventStatus::Final);
        assert_eq!(
            out.decision().unwrap().explanation_tree().evaluation_time.as_deref(),
            Some("2026-02-01T09:00:00Z")
        );
    }

    #[test]
    fn escalation_accepts_for_review() {
        let (cmd, ctx) = pair(APPLY_DISCOUNT_REQUEST);
        let cmd = cmd.with_payload("discount_percent", 0.60);
        let state = ProjectedState::new().with("discount_threshold", 0.30);
        let out = CommandDispatcher::new(StructuralValidator)
            .with_policy_engine(engine())
            .dispatch(&cmd, &ctx, Some(&state), None);
        assert!(out.is_accepted());
        assert_eq!(out.enforced_event_status(), EventStatus::ReviewRequired);
    }

    #[test]
    fn legacy_checks_run_in_order_after_policy() {
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);
        let (cmd, ctx) = pair("crm.contact.create.request");
        let out = CommandDispatcher::new(StructuralValidator)
            .with_policy_engine(engine())
            .with_legacy_policy(|_, _| Some(RejectionReason::new("LEGACY_A", "first")))
            .with_legacy_policy(move |_, _| {
                seen.fetch_add(1, Ordering::SeqCst);
                Some(RejectionReason::new("LEGACY_B", "second"))
            })
            .dispatch(&cmd, &ctx, None, None);
        assert_eq!(out.rejection().unwrap().code, "LEGACY_A");
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(out.decision().unwrap().allowed());
    }

    #[test]
    fn legacy_checks_skipped_on_policy_rejection() {
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);
        let (cmd, ctx) = pair(STOCK_MOVE_REQUEST);
        let out = CommandDispatcher::new(StructuralValidator)
            .with_policy_engine(engine())
            .with_legacy_policy(move |_, _| {
                seen.fetch_add(1, Ordering::SeqCst);
                None
            })
            .dispatch(&cmd, &ctx, None, None);
        // No quantity, no stock: fails closed.
        assert!(!out.is_accepted());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn no_engine_runs_legacy_only() {
        let (cmd, ctx) = pair(STOCK_MOVE_REQUEST);
        let out = CommandDispatcher::new(StructuralValidator)
            .with_legacy_policy(|_, _| None)
            .dispatch(&cmd, &ctx, None, None);
        assert!(out.is_accepted());
        assert!(out.decision().is_none());
        assert_eq!(out.enforced_event_status(), EventStatus::Final);
    }

    #[test]
    fn panicking_legacy_check_rejects() {
        let (cmd, ctx) = pair(STOCK_MOVE_REQUEST);
        let out = CommandDispatcher::new(StructuralValidator)
            .with_legacy_policy(|_, _| panic!("legacy bug"))
            .dispatch(&cmd, &ctx, None, None);
        assert_eq!(out.rejection().unwrap().code, LEGACY_POLICY_FAULT);
    }
}
