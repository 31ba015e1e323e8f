//! # Command Outcomes
//!
//! What dispatch hands back: ACCEPTED or REJECTED, the rejection reason,
//! and the policy decision when the engine ran. The enforced event status
//! tells the event store whether the resulting event is final or must wait
//! for review.

use bizops_core::CommandId;
use bizops_policy::PolicyDecision;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::validation::RejectionReason;

/// Whether a command was accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OutcomeStatus {
    /// The command may proceed.
    Accepted,
    /// The command was stopped.
    Rejected,
}

/// Status stamped on the event recorded for a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventStatus {
    /// No further action.
    Final,
    /// A human must review before the event takes effect.
    ReviewRequired,
}

impl OutcomeStatus {
    /// Wire form.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Accepted => "ACCEPTED",
            Self::Rejected => "REJECTED",
        }
    }
}

impl EventStatus {
    /// Wire form.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Final => "FINAL",
            Self::ReviewRequired => "REVIEW_REQUIRED",
        }
    }
}

/// Result of dispatching one command.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandOutcome {
    command_id: CommandId,
    status: OutcomeStatus,
    rejection: Option<RejectionReason>,
    decision: Option<PolicyDecision>,
}

impl CommandOutcome {
    /// An accepted outcome.
    pub fn accepted(command_id: CommandId, decision: Option<PolicyDecision>) -> Self {
        Self {
            command_id,
            status: OutcomeStatus::Accepted,
            rejection: None,
            decision,
        }
    }

    /// A rejected outcome.
    pub fn rejected(
        command_id: CommandId,
        reason: RejectionReason,
        decision: Option<PolicyDecision>,
    ) -> Self {
        Self {
            command_id,
            status: OutcomeStatus::Rejected,
            rejection: Some(reason),
            decision,
        }
    }

    /// Command this outcome belongs to.
    pub fn command_id(&self) -> CommandId {
        self.command_id
    }

    /// ACCEPTED or REJECTED.
    pub fn status(&self) -> OutcomeStatus {
        self.status
    }

    /// Shorthand for `status() == Accepted`.
    pub fn is_accepted(&self) -> bool {
        self.status == OutcomeStatus::Accepted
    }

    /// Why the command was rejected.
    pub fn rejection(&self) -> Option<&RejectionReason> {
        self.rejection.as_ref()
    }

    /// The policy decision, if the engine ran.
    pub fn decision(&self) -> Option<&PolicyDecision> {
        self.decision.as_ref()
    }

    /// REVIEW_REQUIRED only for an accepted command with escalations.
    pub fn enforced_event_status(&self) -> EventStatus {
        let escalated = self
            .decision
            .as_ref()
            .is_some_and(PolicyDecision::requires_review);
        match self.status {
            OutcomeStatus::Accepted if escalated => EventStatus::ReviewRequired,
            _ => EventStatus::Final,
        }
    }

    /// JSON object recorded alongside the command's event.
    pub fn to_event_payload(&self) -> Value {
        json!({
            "command_id": self.command_id.to_string(),
            "status": self.status.as_str(),
            "event_status": self.enforced_event_status().as_str(),
            "rejection": self.rejection,
            "policy_decision": self.decision.as_ref().map(PolicyDecision::to_payload),
        })
    }
}
