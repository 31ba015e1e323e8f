//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use bizops_core::{BusinessContext, BusinessId, BusinessLifecycleState, Command, TenantId, Timestamp};
use bizops_policy::{rules, PolicyEngine, PolicyVersion, RegistryBuilder};
use tracing_subscriber::EnvFilter;

/// Install a test-writer subscriber once. Honors `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn ts(s: &str) -> Timestamp {
    Timestamp::parse(s).unwrap()
}

pub fn version(id: &str) -> PolicyVersion {
    PolicyVersion::new(id, ts("2026-01-01T00:00:00Z"), format!("policy {id}")).unwrap()
}

/// A command and an active context for the same tenant and business.
pub fn command_for(command_type: &str) -> (Command, BusinessContext) {
    let tenant = TenantId::new("acme-retail").unwrap();
    let business = BusinessId::new();
    let command = Command::new(
        tenant.clone(),
        business,
        command_type,
        ts("2026-02-01T09:30:00Z"),
    )
    .unwrap()
    .with_actor("user-42");
    let context = BusinessContext::new(tenant, business, BusinessLifecycleState::Active);
    (command, context)
}

/// Engine over the full standard catalog frozen as `1.0.0`.
pub fn standard_engine() -> PolicyEngine {
    let builder = RegistryBuilder::new();
    for rule in rules::standard_rules().unwrap() {
        builder.register_rule(rule).unwrap();
    }
    PolicyEngine::new(Arc::new(builder.lock(Some(version("1.0.0")))))
}
