//! # Commands and Business Context
//!
//! A [`Command`] is a request to change business state, e.g.
//! `inventory.stock.move.request`. The policy engine reads only its
//! `command_type`; rules read the JSON `payload`. The dispatcher reads
//! `issued_at` and uses it as the evaluation time.
//!
//! [`BusinessContext`] describes the business the command targets. It is
//! produced by the (external) tenant layer and queried by rules, e.g. "is
//! this business currently active?".

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ValidationError;
use crate::identity::{BusinessId, CommandId, TenantId};
use crate::temporal::Timestamp;

/// A business command submitted for policy evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Command {
    /// Unique id of this submission.
    pub command_id: CommandId,
    /// Tenant that submitted the command.
    pub tenant_id: TenantId,
    /// Business the command targets.
    pub business_id: BusinessId,
    /// Dotted command type, e.g. `retail.sale.apply_discount.request`.
    pub command_type: String,
    /// When the command was issued. The only time the pipeline observes.
    pub issued_at: Timestamp,
    /// Actor that issued the command, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actor_id: Option<String>,
    /// Command-specific fields, read only by rules.
    #[serde(default)]
    pub payload: Map<String, Value>,
}

impl Command {
    /// Create a command with a fresh `CommandId` and an empty payload.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::EmptyCommandType` if `command_type` is blank.
    pub fn new(
        tenant_id: TenantId,
        business_id: BusinessId,
        command_type: impl Into<String>,
        issued_at: Timestamp,
    ) -> Result<Self, ValidationError> {
        let command_type = command_type.into();
        if command_type.trim().is_empty() {
            return Err(ValidationError::EmptyCommandType);
        }
        Ok(Self {
            command_id: CommandId::new(),
            tenant_id,
            business_id,
            command_type,
            issued_at,
            actor_id: None,
            payload: Map::new(),
        })
    }

    /// Set a payload field.
    pub fn with_payload(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.payload.insert(key.into(), value.into());
        self
    }

    /// Set the issuing actor.
    pub fn with_actor(mut self, actor_id: impl Into<String>) -> Self {
        self.actor_id = Some(actor_id.into());
        self
    }

    /// Raw payload field.
    pub fn payload_value(&self, key: &str) -> Option<&Value> {
        self.payload.get(key)
    }

    /// Payload field as an integer. `None` if absent or not an integer.
    pub fn payload_i64(&self, key: &str) -> Option<i64> {
        self.payload.get(key).and_then(Value::as_i64)
    }

    /// Payload field as a float. Integers are widened.
    pub fn payload_f64(&self, key: &str) -> Option<f64> {
        self.payload.get(key).and_then(Value::as_f64)
    }

    /// Payload field as a string slice.
    pub fn payload_str(&self, key: &str) -> Option<&str> {
        self.payload.get(key).and_then(Value::as_str)
    }
}

/// Lifecycle state of a business, as reported by the tenant layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BusinessLifecycleState {
    /// Business is being onboarded.
    Setup,
    /// Business is trading normally.
    Active,
    /// Operations temporarily suspended.
    Suspended,
    /// Business has been closed. Terminal.
    Closed,
}

impl BusinessLifecycleState {
    /// Return the string value used in serialization and rule metadata.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Setup => "SETUP",
            Self::Active => "ACTIVE",
            Self::Suspended => "SUSPENDED",
            Self::Closed => "CLOSED",
        }
    }

    /// Whether commands that change business state may be accepted.
    pub fn accepts_commands(&self) -> bool {
        matches!(self, Self::Active)
    }
}

impl std::fmt::Display for BusinessLifecycleState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The business a command targets, as seen by policy rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusinessContext {
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// The business.
    pub business_id: BusinessId,
    /// Current lifecycle state.
    pub lifecycle: BusinessLifecycleState,
    /// Free-form attributes (plan tier, region, ...).
    #[serde(default)]
    pub attributes: Map<String, Value>,
}

impl BusinessContext {
    /// Create a context with no attributes.
    pub fn new(
        tenant_id: TenantId,
        business_id: BusinessId,
        lifecycle: BusinessLifecycleState,
    ) -> Self {
        Self {
            tenant_id,
            business_id,
            lifecycle,
            attributes: Map::new(),
        }
    }

    /// Set an attribute.
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Look up an attribute.
    pub fn attribute(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }
}
