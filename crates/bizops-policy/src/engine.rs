//! # Policy Engine
//!
//! Evaluates a command against the rules of one policy version and returns
//! a [`PolicyDecision`].
//!
//! ## Guarantees
//!
//! - **Never fails.** `evaluate` returns a decision for every input. Rule
//!   errors, panics and malformed results are isolated per rule and counted
//!   as BLOCK violations (see [`crate::execution`]).
//! - **Deterministic.** Rules come from a frozen snapshot in `rule_id`
//!   order; the engine holds no mutable state, performs no I/O and reads no
//!   clock. `evaluation_time` is supplied by the caller and only rendered
//!   into the explanation tree. Same inputs, same decision, same digest.
//! - **Fail-safe on unknown versions.** A version the registry never froze
//!   yields no rules; the decision is allowed with `rules_evaluated = 0`.

use std::sync::Arc;

use bizops_core::{BusinessContext, Command, ProjectedState, Timestamp};

use crate::bootstrap::build_registry;
use crate::config::PolicyConfig;
use crate::decision::PolicyDecision;
use crate::error::BootstrapError;
use crate::execution;
use crate::registry::LockedRegistry;
use crate::version::INITIAL_POLICY_VERSION;

/// Stateless evaluator over a locked registry. Cheap to clone and share.
#[derive(Debug, Clone)]
pub struct PolicyEngine {
    registry: Arc<LockedRegistry>,
    default_version: String,
}

impl PolicyEngine {
    /// Engine over `registry` defaulting to [`INITIAL_POLICY_VERSION`].
    pub fn new(registry: Arc<LockedRegistry>) -> Self {
        Self {
            registry,
            default_version: INITIAL_POLICY_VERSION.to_string(),
        }
    }

    /// Override the version used when the caller names none.
    pub fn with_default_version(mut self, version_id: impl Into<String>) -> Self {
        self.default_version = version_id.into();
        self
    }

    /// Build the registry described by `config` and an engine over it.
    ///
    /// # Errors
    ///
    /// Propagates any [`BootstrapError`] from [`build_registry`].
    pub fn from_config(config: &PolicyConfig) -> Result<Self, BootstrapError> {
        let registry = build_registry(config)?;
        Ok(Self::new(Arc::new(registry)).with_default_version(&config.default_policy_version))
    }

    /// The registry rules are drawn from.
    pub fn registry(&self) -> &Arc<LockedRegistry> {
        &self.registry
    }

    /// Version evaluated when the caller names none.
    pub fn default_version(&self) -> &str {
        &self.default_version
    }

    /// Evaluate `command` under `policy_version` (default: the engine's
    /// default version). A missing `projected_state` is treated as empty.
    pub fn evaluate(
        &self,
        command: &Command,
        business_context: &BusinessContext,
        projected_state: Option<&ProjectedState>,
        policy_version: Option<&str>,
        evaluation_time: Option<Timestamp>,
    ) -> PolicyDecision {
        let version = policy_version.unwrap_or(&self.default_version);
        let empty = ProjectedState::new();
        let state = projected_state.unwrap_or(&empty);

        let rules = self
            .registry
            .get_rules_for_command(&command.command_type, Some(version));

        let results: Vec<_> = rules
            .iter()
            .map(|rule| {
                let result = execution::execute(rule.as_ref(), command, business_context, state);
                tracing::debug!(
                    rule_id = %result.rule_id,
                    passed = result.passed,
                    severity = %result.severity,
                    "policy rule evaluated"
                );
                result
            })
            .collect();

        let decision =
            PolicyDecision::from_results(&command.command_type, version, evaluation_time, results);

        let tree = decision.explanation_tree();
        tracing::debug!(
            command_id = %command.command_id,
            command_type = %command.command_type,
            policy_version = version,
            allowed = decision.allowed(),
            rules_evaluated = tree.rules_evaluated,
            block_count = tree.block_count,
            warn_count = tree.warn_count,
            escalate_count = tree.escalate_count,
            "policy evaluation complete"
        );
        decision
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RuleError;
    use crate::registry::RegistryBuilder;
    use crate::rule::{Rule, RuleDescriptor, RuleResult, Severity};
    use crate::version::PolicyVersion;
    use bizops_core::{BusinessId, BusinessLifecycleState, TenantId};
    use serde_json::json;

    const CMD: &str = "test.thing.do.request";

    #[derive(Debug, Clone, Copy)]
    enum Outcome {
        Pass,
        Fail,
        Error,
        Malformed,
    }

    #[derive(Debug)]
    struct Scripted {
        descriptor: RuleDescriptor,
        outcome: Outcome,
    }

    impl Scripted {
        fn arc(rule_id: &str, severity: Severity, outcome: Outcome) -> Arc<dyn Rule> {
            Arc::new(Self {
                descriptor: RuleDescriptor::new(rule_id, "1.0.0", "test", severity, [CMD]).unwrap(),
                outcome,
            })
        }
    }

    impl Rule for Scripted {
        fn descriptor(&self) -> &RuleDescriptor {
            &self.descriptor
        }

        fn evaluate(
            &self,
            _command: &Command,
            _context: &BusinessContext,
            state: &ProjectedState,
        ) -> Result<RuleResult, RuleError> {
            match self.outcome {
                Outcome::Pass => Ok(self.pass("ok")),
                Outcome::Fail => Ok(self.fail("not ok", json!({"facts": state.len()}))),
                Outcome::Error => Err(RuleError::Internal("bad data".into())),
                Outcome::Malformed => Ok(self.pass(" ")),
            }
        }
    }

    fn engine(rules: Vec<Arc<dyn Rule>>) -> PolicyEngine {
        let builder = RegistryBuilder::new();
        for rule in rules {
            builder.register_rule(rule).unwrap();
        }
        let version = PolicyVersion::new(
            INITIAL_POLICY_VERSION,
            Timestamp::parse("2026-01-01T00:00:00Z").unwrap(),
            "initial",
        )
        .unwrap();
        PolicyEngine::new(Arc::new(builder.lock(Some(version))))
    }

    fn fixtures() -> (Command, BusinessContext) {
        let tenant = TenantId::new("acme").unwrap();
        let business = BusinessId::new();
        let command = Command::new(
            tenant.clone(),
            business,
            CMD,
            Timestamp::parse("2026-02-01T09:00:00Z").unwrap(),
        )
        .unwrap();
        let context = BusinessContext::new(tenant, business, BusinessLifecycleState::Active);
        (command, context)
    }

    #[test]
    fn no_rules_is_allowed() {
        let (command, context) = fixtures();
        let d = engine(vec![]).evaluate(&command, &context, None, None, None);
        assert!(d.allowed());
        assert_eq!(d.explanation_tree().rules_evaluated, 0);
        assert_eq!(d.policy_version(), "1.0.0");
    }

    #[test]
    fn unknown_version_evaluates_nothing() {
        let (command, context) = fixtures();
        let e = engine(vec![Scripted::arc("A", Severity::Block, Outcome::Fail)]);
        let d = e.evaluate(&command, &context, None, Some("99.99.99"), None);
        assert!(d.allowed());
        assert_eq!(d.explanation_tree().rules_evaluated, 0);
        assert_eq!(d.policy_version(), "99.99.99");
    }

    #[test]
    fn buckets_and_orders_by_rule_id() {
        let (command, context) = fixtures();
        let e = engine(vec![
            Scripted::arc("C", Severity::Escalate, Outcome::Fail),
            Scripted::arc("A", Severity::Warn, Outcome::Fail),
            Scripted::arc("B", Severity::Block, Outcome::Pass),
        ]);
        let d = e.evaluate(&command, &context, None, None, None);
        assert!(d.allowed());
        assert_eq!(d.warnings().len(), 1);
        assert_eq!(d.escalations().len(), 1);
        let order: Vec<&str> = d
            .explanation_tree()
            .details
            .iter()
            .map(|x| x.rule_id.as_str())
            .collect();
        assert_eq!(order, vec!["A", "B", "C"]);
    }

    #[test]
    fn faults_block_and_evaluation_continues() {
        let (command, context) = fixtures();
        let e = engine(vec![
            Scripted::arc("A", Severity::Warn, Outcome::Error),
            Scripted::arc("B", Severity::Warn, Outcome::Malformed),
            Scripted::arc("C", Severity::Warn, Outcome::Pass),
        ]);
        let d = e.evaluate(&command, &context, None, None, None);
        assert!(!d.allowed());
        assert_eq!(d.violations().len(), 2);
        assert_eq!(d.explanation_tree().rules_evaluated, 3);
        assert_eq!(d.explanation_tree().rules_passed, 1);
    }

    #[test]
    fn evaluation_time_is_rendered_not_read() {
        let (command, context) = fixtures();
        let e = engine(vec![]);
        let d = e.evaluate(&command, &context, None, None, Some(command.issued_at));
        assert_eq!(
            d.explanation_tree().evaluation_time.as_deref(),
            Some("2026-02-01T09:00:00Z")
        );
        assert_eq!(e.evaluate(&command, &context, None, None, None).explanation_tree().evaluation_time, None);
    }

    #[test]
    fn projected_state_reaches_rules() {
        let (command, context) = fixtures();
        let e = engine(vec![Scripted::arc("A", Severity::Warn, Outcome::Fail)]);
        let state = ProjectedState::new().with("x", 1).with("y", 2);
        let d = e.evaluate(&command, &context, Some(&state), None, None);
        assert_eq!(d.warnings()[0].metadata["facts"], json!(2));
        let d = e.evaluate(&command, &context, None, None, None);
        assert_eq!(d.warnings()[0].metadata["facts"], json!(0));
    }

    #[test]
    fn repeated_evaluation_is_identical() {
        let (command, context) = fixtures();
        let e = engine(vec![
            Scripted::arc("A", Severity::Block, Outcome::Fail),
            Scripted::arc("B", Severity::Escalate, Outcome::Error),
        ]);
        let t = Some(command.issued_at);
        let a = e.evaluate(&command, &context, None, None, t);
        let b = e.evaluate(&command, &context, None, None, t);
        assert_eq!(a, b);
        assert_eq!(a.explanation_digest().unwrap(), b.explanation_digest().unwrap());
    }

    #[test]
    fn default_version_override() {
        let (command, context) = fixtures();
        let e = engine(vec![Scripted::arc("A", Severity::Block, Outcome::Fail)])
            .with_default_version("2.0.0");
        assert_eq!(e.default_version(), "2.0.0");
        // 2.0.0 was never frozen.
        assert!(e.evaluate(&command, &context, None, None, None).allowed());
        assert!(!e.evaluate(&command, &context, None, Some("1.0.0"), None).allowed());
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        fn severity() -> impl Strategy<Value = Severity> {
            prop_oneof![
                Just(Severity::Block),
                Just(Severity::Warn),
                Just(Severity::Escalate)
            ]
        }

        fn outcome() -> impl Strategy<Value = Outcome> {
            prop_oneof![
                Just(Outcome::Pass),
                Just(Outcome::Fail),
                Just(Outcome::Error),
                Just(Outcome::Malformed)
            ]
        }

        proptest! {
            #[test]
            fn allowed_iff_no_violations(
                specs in proptest::collection::vec((severity(), outcome()), 0..12)
            ) {
                let rules = specs
                    .iter()
                    .enumerate()
                    .map(|(i, (s, o))| Scripted::arc(&format!("R-{i:03}"), *s, *o))
                    .collect();
                let (command, context) = fixtures();
                let d = engine(rules).evaluate(&command, &context, None, None, None);

                prop_assert_eq!(d.allowed(), d.violations().is_empty());

                let expect_block = specs.iter().any(|(s, o)| match o {
                    Outcome::Pass => false,
                    Outcome::Fail => *s == Severity::Block,
                    Outcome::Error | Outcome::Malformed => true,
                });
                prop_assert_eq!(d.allowed(), !expect_block);

                let tree = d.explanation_tree();
                prop_assert_eq!(tree.rules_evaluated, specs.len());
                prop_assert_eq!(tree.rules_passed + tree.rules_failed, tree.rules_evaluated);
                prop_assert_eq!(
                    tree.block_count + tree.warn_count + tree.escalate_count,
                    tree.rules_failed
                );
            }
        }
    }
}
