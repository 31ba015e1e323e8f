//! # Policy Registry
//!
//! Catalog of rules keyed by `(rule_id, version)` with indexes by command
//! type and by domain, plus frozen per-version snapshots.
//!
//! ## Two Phases
//!
//! The registry is a typestate:
//!
//! - [`RegistryBuilder`] accepts registrations. `register_rule` takes `&self`
//!   and serialises on a single `parking_lot::Mutex`, so bootstrap code may
//!   register from several threads.
//! - [`RegistryBuilder::lock`] consumes the builder and returns a
//!   [`LockedRegistry`]. The locked registry has no registration method at
//!   all, is immutable, and can be shared behind an `Arc` without locking.
//!
//! ```compile_fail
//! use std::sync::Arc;
//! use bizops_policy::registry::RegistryBuilder;
//! use bizops_policy::rules::lifecycle::BusinessActiveRule;
//!
//! let locked = RegistryBuilder::new().lock(None);
//! locked.register_rule(Arc::new(BusinessActiveRule::new().unwrap()));
//! ```
//!
//! ## Snapshots
//!
//! Locking with a version (and every later [`LockedRegistry::freeze`])
//! records, for each indexed command type, the applicable rules sorted by
//! `rule_id`. The sort is stable, so registration order breaks ties between
//! two versions of the same rule. Historical replays name a version and get
//! exactly that tuple back.
//!
//! Asking for an unknown version yields no rules. This is a fail-safe for
//! replay, not an error, and is logged at `warn`.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::RegistryError;
use crate::rule::Rule;
use crate::version::PolicyVersion;

/// Shared handle to a registered rule.
pub type RuleRef = Arc<dyn Rule>;

type Snapshot = BTreeMap<String, Arc<[RuleRef]>>;

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct Catalog {
    rules: BTreeMap<(String, String), RuleRef>,
    by_command: BTreeMap<String, Vec<RuleRef>>,
    by_domain: BTreeMap<String, Vec<RuleRef>>,
}

impl Catalog {
    fn insert(&mut self, rule: RuleRef) -> Result<(), RegistryError> {
        let key = (rule.rule_id().to_string(), rule.version().to_string());
        if self.rules.contains_key(&key) {
            return Err(RegistryError::DuplicateRule {
                rule_id: key.0,
                version: key.1,
            });
        }
        for command_type in rule.applies_to() {
            self.by_command
                .entry(command_type.clone())
                .or_default()
                .push(Arc::clone(&rule));
        }
        self.by_domain
            .entry(rule.domain().to_string())
            .or_default()
            .push(Arc::clone(&rule));
        self.rules.insert(key, rule);
        Ok(())
    }

    fn live_rules_for(&self, command_type: &str) -> Vec<RuleRef> {
        let mut rules = self.by_command.get(command_type).cloned().unwrap_or_default();
        sort_by_rule_id(&mut rules);
        rules
    }

    fn by_domain(&self, domain: &str) -> Vec<RuleRef> {
        let mut rules = self.by_domain.get(domain).cloned().unwrap_or_default();
        sort_by_rule_id(&mut rules);
        rules
    }

    fn all(&self) -> Vec<RuleRef> {
        self.rules.values().cloned().collect()
    }

    fn get(&self, rule_id: &str, version: &str) -> Option<RuleRef> {
        self.rules
            .get(&(rule_id.to_string(), version.to_string()))
            .cloned()
    }

    fn snapshot(&self) -> Snapshot {
        self.by_command
            .keys()
            .map(|command_type| {
                let rules: Arc<[RuleRef]> = self.live_rules_for(command_type).into();
                (command_type.clone(), rules)
            })
            .collect()
    }
}

fn sort_by_rule_id(rules: &mut [RuleRef]) {
    rules.sort_by(|a, b| a.rule_id().cmp(b.rule_id()));
}

// ---------------------------------------------------------------------------
// RegistryBuilder
// ---------------------------------------------------------------------------

/// Unlocked registry. Accepts registrations until [`lock`](Self::lock).
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    catalog: Mutex<Catalog>,
}

impl RegistryBuilder {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a rule.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::DuplicateRule`] if a rule with the same
    /// `(rule_id, version)` is already registered.
    pub fn register_rule(&self, rule: RuleRef) -> Result<(), RegistryError> {
        let rule_id = rule.rule_id().to_string();
        let version = rule.version().to_string();
        self.catalog.lock().insert(rule)?;
        tracing::debug!(rule_id = %rule_id, version = %version, "registered policy rule");
        Ok(())
    }

    /// Rules for a command type. Before lock there are no snapshots, so a
    /// named version always yields no rules.
    pub fn get_rules_for_command(
        &self,
        command_type: &str,
        policy_version: Option<&str>,
    ) -> Vec<RuleRef> {
        match policy_version {
            Some(version_id) => {
                tracing::warn!(
                    command_type,
                    policy_version = version_id,
                    "policy version requested before registry lock; no rules apply"
                );
                Vec::new()
            }
            None => self.catalog.lock().live_rules_for(command_type),
        }
    }

    /// Rules in a domain, sorted by `rule_id`.
    pub fn get_rules_by_domain(&self, domain: &str) -> Vec<RuleRef> {
        self.catalog.lock().by_domain(domain)
    }

    /// Every rule, ordered by `(rule_id, version)`.
    pub fn get_all_rules(&self) -> Vec<RuleRef> {
        self.catalog.lock().all()
    }

    /// Look up one rule.
    pub fn get_rule(&self, rule_id: &str, version: &str) -> Option<RuleRef> {
        self.catalog.lock().get(rule_id, version)
    }

    /// Number of registered rules.
    pub fn rule_count(&self) -> usize {
        self.catalog.lock().rules.len()
    }

    /// Always `false`: snapshots only exist after lock.
    pub fn has_version(&self, _version_id: &str) -> bool {
        false
    }

    /// Close registration. If `version` is given, its snapshot is frozen.
    pub fn lock(self, version: Option<PolicyVersion>) -> LockedRegistry {
        let mut locked = LockedRegistry {
            catalog: self.catalog.into_inner(),
            snapshots: BTreeMap::new(),
        };
        tracing::info!(
            rule_count = locked.rule_count(),
            policy_version = version.as_ref().map(PolicyVersion::version_id),
            "policy registry locked"
        );
        if let Some(version) = version {
            locked.freeze(version);
        }
        locked
    }
}

// ---------------------------------------------------------------------------
// LockedRegistry
// ---------------------------------------------------------------------------

#[derive(Debug)]
struct VersionSnapshot {
    version: PolicyVersion,
    rules: Snapshot,
}

/// Frozen registry. Immutable apart from [`freeze`](Self::freeze), which
/// only adds snapshot labels over the unchanged rule set.
#[derive(Debug)]
pub struct LockedRegistry {
    catalog: Catalog,
    snapshots: BTreeMap<String, VersionSnapshot>,
}

impl LockedRegistry {
    /// Freeze the current rule set under another version label.
    ///
    /// The rule set cannot change after lock, so re-freezing an existing
    /// id rebuilds an identical snapshot and only refreshes its label.
    pub fn freeze(&mut self, version: PolicyVersion) {
        let rules = self.catalog.snapshot();
        tracing::info!(
            policy_version = version.version_id(),
            command_types = rules.len(),
            "froze policy version snapshot"
        );
        self.snapshots.insert(
            version.version_id().to_string(),
            VersionSnapshot { version, rules },
        );
    }

    /// Rules to evaluate for `command_type`.
    ///
    /// With a version: that snapshot's tuple, empty if the command type is
    /// not covered or the version is unknown. Without: the live index,
    /// sorted by `rule_id`.
    pub fn get_rules_for_command(
        &self,
        command_type: &str,
        policy_version: Option<&str>,
    ) -> Vec<RuleRef> {
        let Some(version_id) = policy_version else {
            return self.catalog.live_rules_for(command_type);
        };
        match self.snapshots.get(version_id) {
            Some(snapshot) => snapshot
                .rules
                .get(command_type)
                .map(|rules| rules.to_vec())
                .unwrap_or_default(),
            None => {
                tracing::warn!(
                    command_type,
                    policy_version = version_id,
                    "unknown policy version; no rules apply"
                );
                Vec::new()
            }
        }
    }

    /// Rules in a domain, sorted by `rule_id`.
    pub fn get_rules_by_domain(&self, domain: &str) -> Vec<RuleRef> {
        self.catalog.by_domain(domain)
    }

    /// Every rule, ordered by `(rule_id, version)`.
    pub fn get_all_rules(&self) -> Vec<RuleRef> {
        self.catalog.all()
    }

    /// Look up one rule.
    pub fn get_rule(&self, rule_id: &str, version: &str) -> Option<RuleRef> {
        self.catalog.get(rule_id, version)
    }

    /// Number of registered rules.
    pub fn rule_count(&self) -> usize {
        self.catalog.rules.len()
    }

    /// Whether a snapshot exists for `version_id`.
    pub fn has_version(&self, version_id: &str) -> bool {
        self.snapshots.contains_key(version_id)
    }

    /// Label of a frozen snapshot.
    pub fn policy_version(&self, version_id: &str) -> Option<&PolicyVersion> {
        self.snapshots.get(version_id).map(|s| &s.version)
    }

    /// All frozen version labels, ordered by id.
    pub fn versions(&self) -> Vec<&PolicyVersion> {
        self.snapshots.values().map(|s| &s.version).collect()
    }
}
