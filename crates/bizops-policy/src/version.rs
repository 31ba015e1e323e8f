//! # Policy Versions
//!
//! A `PolicyVersion` labels a frozen snapshot of the rule catalog inside the
//! registry. It holds no rules itself. `created_at` is supplied by whoever
//! declares the version; nothing here reads a clock.

use bizops_core::Timestamp;
use serde::Serialize;

use crate::error::ContractError;

/// The version evaluated when the caller names none.
pub const INITIAL_POLICY_VERSION: &str = "1.0.0";

/// Immutable label for a frozen rule-set snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PolicyVersion {
    version_id: String,
    created_at: Timestamp,
    description: String,
}

impl PolicyVersion {
    /// Declare a version.
    ///
    /// # Errors
    ///
    /// Returns [`ContractError::EmptyPolicyVersionId`] for a blank id.
    pub fn new(
        version_id: impl Into<String>,
        created_at: Timestamp,
        description: impl Into<String>,
    ) -> Result<Self, ContractError> {
        let version_id = version_id.into();
        if version_id.trim().is_empty() {
            return Err(ContractError::EmptyPolicyVersionId);
        }
        Ok(Self {
            version_id,
            created_at,
            description: description.into(),
        })
    }

    /// Version identifier, e.g. `1.0.0`.
    pub fn version_id(&self) -> &str {
        &self.version_id
    }

    /// When the version was declared.
    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    /// Free-text description.
    pub fn description(&self) -> &str {
        &self.description
    }
}

impl std::fmt::Display for PolicyVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.version_id)
    }
}
