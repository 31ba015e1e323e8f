//! # Canonical Serialization: JCS Byte Production
//!
//! `CanonicalBytes` is the only input accepted by [`crate::sha256_digest`].
//! Replay verification compares digests of explanation trees produced years
//! apart, so the byte sequence for a value must never depend on map
//! iteration order, whitespace, or number formatting.
//!
//! ## Rules
//!
//! Serialization uses `serde_jcs` (RFC 8785): sorted object keys, compact
//! separators, ECMAScript number formatting. Floats are permitted because
//! JCS fixes their textual form; rule metadata routinely carries ratios
//! such as discount percentages. Non-finite floats cannot occur because
//! `serde_json` has no representation for them.

use serde::Serialize;

use crate::error::CanonicalizationError;

/// Bytes produced exclusively by JCS canonicalization.
///
/// The inner `Vec<u8>` is private; the only constructor is
/// [`CanonicalBytes::new`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CanonicalBytes(Vec<u8>);

impl CanonicalBytes {
    /// Construct canonical bytes from any serializable value.
    ///
    /// # Errors
    ///
    /// Returns `CanonicalizationError::SerializationFailed` if the value
    /// cannot be represented as JSON (e.g. a map with non-string keys).
    pub fn new(obj: &impl Serialize) -> Result<Self, CanonicalizationError> {
        let value = serde_json::to_value(obj)?;
        let s = serde_jcs::to_string(&value)?;
        Ok(Self(s.into_bytes()))
    }

    /// Access the canonical bytes for digest computation.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Returns the length of the canonical byte sequence.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the canonical byte sequence is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl AsRef<[u8]> for CanonicalBytes {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}
