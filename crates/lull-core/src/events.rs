use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::message::MessagePriority;
use crate::strategy::DelayStrategy;

/// Every triage decision produces an Event.
/// Hosts poll the engine's log; the core never pushes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    MessageReceived {
        message_id: String,
        at: DateTime<Utc>,
    },
    MessageClassified {
        message_id: String,
        priority: MessagePriority,
        confidence: Option<f32>,
        /// True when the classifier failed and the fallback assigned normal.
        fallback: bool,
        at: DateTime<Utc>,
    },
    /// A deferred plan was registered with the delivery transport.
    PlanScheduled {
        message_id: String,
        strategy: DelayStrategy,
        target_time: DateTime<Utc>,
        reason: String,
        at: DateTime<Utc>,
    },
    /// A plan was handed to the transport for immediate presentation.
    PlanDelivered {
        message_id: String,
        strategy: DelayStrategy,
        critical: bool,
        at: DateTime<Utc>,
    },
    /// A plan was recorded without any transport call.
    PlanSuppressed {
        message_id: String,
        reason: String,
        at: DateTime<Utc>,
    },
    /// The transport rejected a plan. The message stays processed; no retry.
    DeliveryFailed {
        message_id: String,
        strategy: DelayStrategy,
        error: String,
        at: DateTime<Utc>,
    },
}

impl Event {
    pub fn message_id(&self) -> &str {
        match self {
            Event::MessageReceived { message_id, .. }
            | Event::MessageClassified { message_id, .. }
            | Event::PlanScheduled { message_id, .. }
            | Event::PlanDelivered { message_id, .. }
            | Event::PlanSuppressed { message_id, .. }
            | Event::DeliveryFailed { message_id, .. } => message_id,
        }
    }
}
