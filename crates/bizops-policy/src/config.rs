//! # Policy Configuration
//!
//! Declares which policy versions exist, which one is evaluated by default,
//! and which standard rules are registered. Loaded from YAML:
//!
//! ```yaml
//! default_policy_version: "2.0.0"
//! versions:
//!   - version_id: "1.0.0"
//!     created_at: "2026-01-01T00:00:00Z"
//!     description: "Initial catalog"
//!   - version_id: "2.0.0"
//!     created_at: "2026-03-01T00:00:00Z"
//!     description: "Retail discount escalation"
//! standard_rules: ["INV-001", "RET-001"]
//! ```
//!
//! Omitting `standard_rules` registers the whole standard catalog. Unknown
//! keys are rejected so a misspelt field never silently falls back to a
//! default.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::version::INITIAL_POLICY_VERSION;

/// Top-level policy configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PolicyConfig {
    /// Version evaluated when a caller names none.
    #[serde(default = "default_policy_version")]
    pub default_policy_version: String,
    /// Versions to freeze, in declaration order. The first locks the registry.
    pub versions: Vec<VersionConfig>,
    /// Standard rule ids to register. `None` registers all of them.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub standard_rules: Option<Vec<String>>,
}

/// One declared policy version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VersionConfig {
    /// Version identifier.
    pub version_id: String,
    /// UTC timestamp with `Z` suffix.
    pub created_at: String,
    /// Free-text description.
    #[serde(default)]
    pub description: String,
}

fn default_policy_version() -> String {
    INITIAL_POLICY_VERSION.to_string()
}

impl PolicyConfig {
    /// Parse a YAML document.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(yaml).map_err(|e| ConfigError::YamlParse {
            path: "<inline>".into(),
            source: e,
        })
    }

    /// Load a YAML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::FileNotFound {
                    path: path.to_path_buf(),
                }
            } else {
                ConfigError::Io {
                    path: path.to_path_buf(),
                    source: e,
                }
            }
        })?;
        serde_yaml::from_str(&content).map_err(|e| ConfigError::YamlParse {
            path: path.to_path_buf(),
            source: e,
        })
    }
}
