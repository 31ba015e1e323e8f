//! # Temporal Types: UTC-Only Timestamps
//!
//! `Timestamp` is the only time type that crosses crate boundaries. Commands
//! carry the time they were issued; the policy engine renders that value
//! into its explanation tree and never consults a clock of its own. Two
//! evaluations of the same command therefore render the same string, which
//! is what makes persisted explanation trees comparable on replay.
//!
//! Values are UTC and truncated to whole seconds. The rendered form is
//! always `YYYY-MM-DDTHH:MM:SSZ`.

use chrono::{DateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// A UTC-only timestamp, truncated to seconds precision.
///
/// # Construction
///
/// - [`Timestamp::from_utc()`]: from a `DateTime<Utc>`, truncating sub-seconds.
/// - [`Timestamp::parse()`]: from an ISO8601 string, rejecting non-UTC offsets.
/// - [`Timestamp::from_epoch_secs()`]: from Unix seconds.
///
/// No `now()`: whoever builds a command decides what
/// time it was issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Create a timestamp from a `chrono::DateTime<Utc>`, truncating sub-seconds.
    pub fn from_utc(dt: DateTime<Utc>) -> Self {
        Self(truncate_to_seconds(dt))
    }

    /// Parse a timestamp from an RFC 3339 string with a `Z` suffix.
    ///
    /// Explicit offsets, including `+00:00`, are rejected.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::InvalidTimestamp` if the string is not valid
    /// RFC 3339 or does not use the `Z` suffix.
    pub fn parse(s: &str) -> Result<Self, ValidationError> {
        if !s.ends_with('Z') {
            return Err(ValidationError::InvalidTimestamp {
                value: s.to_string(),
                reason: "must use Z suffix (UTC only)".to_string(),
            });
        }
        let dt = DateTime::parse_from_rfc3339(s).map_err(|e| ValidationError::InvalidTimestamp {
            value: s.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self(truncate_to_seconds(dt.with_timezone(&Utc))))
    }

    /// Create a timestamp from a Unix epoch timestamp (seconds).
    pub fn from_epoch_secs(secs: i64) -> Result<Self, ValidationError> {
        DateTime::from_timestamp(secs, 0)
            .map(Self)
            .ok_or_else(|| ValidationError::InvalidTimestamp {
                value: secs.to_string(),
                reason: "out of range for a UTC datetime".to_string(),
            })
    }

    /// Access the inner `DateTime<Utc>`.
    pub fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }

    /// Returns the Unix epoch timestamp in seconds.
    pub fn epoch_secs(&self) -> i64 {
        self.0.timestamp()
    }

    /// Render as ISO8601 with Z suffix (e.g., `2026-01-15T12:00:00Z`).
    pub fn to_iso8601(&self) -> String {
        self.0.format("%Y-%m-%dT%H:%M:%SZ").to_string()
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_iso8601())
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(dt: DateTime<Utc>) -> Self {
        Self::from_utc(dt)
    }
}

fn truncate_to_seconds(dt: DateTime<Utc>) -> DateTime<Utc> {
    dt.with_nanosecond(0).unwrap_or(dt)
}
