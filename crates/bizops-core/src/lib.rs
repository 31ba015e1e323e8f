#![deny(missing_docs)]

//! # bizops-core: Foundational Types for the Business Operations Platform
//!
//! This crate defines the value types every other crate in the workspace
//! depends on. It depends on nothing internal.
//!
//! ## Key Design Principles
//!
//! 1. **Newtype wrappers for identifiers.** `TenantId`, `BusinessId` and
//!    `CommandId` are distinct types with validated constructors. You cannot
//!    pass a business identifier where a command identifier is expected.
//!
//! 2. **Callers supply time.** `Timestamp` is UTC-only and truncated to
//!    seconds. Nothing downstream of a [`Command`] reads the wall clock; the
//!    command's `issued_at` is the only time the policy pipeline sees.
//!
//! 3. **Read-only inputs.** [`Command`], [`BusinessContext`] and
//!    [`ProjectedState`] are handed to policy rules by shared reference and
//!    expose typed getters over their JSON fields.
//!
//! 4. **`CanonicalBytes` is the sole path to digest computation.** Decision
//!    digests used for replay verification flow through
//!    `CanonicalBytes::new()` (RFC 8785 JCS) and then [`sha256_digest`].
//!
//! ## Crate Policy
//!
//! - No dependencies on other `bizops-*` crates (this is the leaf of the DAG).
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod canonical;
pub mod command;
pub mod digest;
pub mod error;
pub mod identity;
pub mod state;
pub mod temporal;

// Re-export primary types for ergonomic imports.
pub use canonical::CanonicalBytes;
pub use command::{BusinessContext, BusinessLifecycleState, Command};
pub use digest::{sha256_digest, sha256_hex, ContentDigest};
pub use error::{CanonicalizationError, ValidationError};
pub use identity::{BusinessId, CommandId, TenantId};
pub use state::ProjectedState;
pub use temporal::Timestamp;
