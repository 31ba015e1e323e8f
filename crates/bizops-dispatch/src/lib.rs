//! # bizops-dispatch: Command Dispatch Pipeline
//!
//! Wires the policy engine into command handling. A command is validated,
//! evaluated against the active policy version, checked by any legacy
//! ad-hoc policies, and turned into a [`CommandOutcome`] whose enforced
//! event status tells the event store whether human review is required.
//!
//! - **Validation** (`validation.rs`): `CommandValidator` trait and the
//!   reference `StructuralValidator`.
//! - **Dispatcher** (`dispatcher.rs`): the pipeline itself.
//! - **Outcome** (`outcome.rs`): accepted/rejected outcome, event status,
//!   and the event payload.

pub mod dispatcher;
pub mod outcome;
pub mod validation;

pub use dispatcher::{CommandDispatcher, LegacyPolicy};
pub use outcome::{CommandOutcome, EventStatus, OutcomeStatus};
pub use validation::{CommandValidator, RejectionReason, StructuralValidator};
