//! # Error Types: Structured Error Hierarchy
//!
//! Errors raised while constructing the foundational value types. All
//! errors use `thiserror` and carry the rejected input so that a bad
//! command or fixture can be diagnosed from the message alone.

use thiserror::Error;

/// Error during canonical serialization.
#[derive(Error, Debug)]
pub enum CanonicalizationError {
    /// JSON serialization failed.
    #[error("serialization failed: {0}")]
    SerializationFailed(#[from] serde_json::Error),
}

/// Validation errors for identifier and timestamp newtypes.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Tenant identifier is empty or whitespace.
    #[error("invalid tenant ID: must be non-empty")]
    EmptyTenantId,

    /// Command type is empty or whitespace.
    #[error("invalid command type: must be non-empty")]
    EmptyCommandType,

    /// Timestamp string is not valid UTC ISO 8601.
    #[error("invalid timestamp: \"{value}\" ({reason})")]
    InvalidTimestamp {
        /// The string that failed to parse.
        value: String,
        /// Why it was rejected.
        reason: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_tenant_id_display() {
        let msg = format!("{}", ValidationError::EmptyTenantId);
        assert!(msg.contains("tenant"));
    }

    #[test]
    fn canonicalization_error_wraps_serde() {
        let source = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = CanonicalizationError::from(source);
        assert!(format!("{err}").starts_with("serialization failed"));
    }

    #[test]
    fn invalid_timestamp_carries_input() {
        let err = ValidationError::InvalidTimestamp {
            value: "not-a-date".to_string(),
            reason: "parse failed".to_string(),
        };
        let msg = format!("{err}");
        assert!(msg.contains("not-a-date"));
        assert!(msg.contains("parse failed"));
    }

    #[test]
    fn empty_command_type_display() {
        assert!(format!("{}", ValidationError::EmptyCommandType).contains("non-empty"));
    }
}
