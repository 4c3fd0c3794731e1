//! Message types and the per-message triage lifecycle.
//!
//! Every inbound message moves through a strict one-way lifecycle:
//!
//!   RECEIVED ──> CLASSIFIED ──> SCHEDULED ──> DELIVERED
//!                                   |
//!                                   ├──> SUPPRESSED
//!                                   └──> DELIVERY_FAILED
//!
//! Valid transitions:
//! - RECEIVED → CLASSIFIED (priority assigned, possibly by fallback)
//! - CLASSIFIED → SCHEDULED (delivery plan issued)
//! - SCHEDULED → DELIVERED (delivered now, or host-reported firing)
//! - SCHEDULED → SUPPRESSED (plan recorded with no delivery)
//! - SCHEDULED → DELIVERY_FAILED (transport rejected the plan)
//!
//! There is no transition back to CLASSIFIED (no re-classification) and
//! no cancellation once SCHEDULED. The three right-hand states are
//! terminal.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::classify::Classification;
use crate::scheduler::DeliveryPlan;

/// Classifier-assigned urgency level of a message.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum MessagePriority {
    /// Needs attention now, regardless of context
    Urgent,
    /// Matters, but can wait for a better moment
    Important,
    /// Ordinary traffic
    Normal,
    /// Digest material
    Low,
    /// The classifier could not assign a level
    Unknown,
}

impl MessagePriority {
    /// Severity rank for display ordering (higher is more severe).
    /// Strategy selection never consults this; it names levels explicitly.
    pub fn severity(&self) -> u8 {
        match self {
            MessagePriority::Urgent => 4,
            MessagePriority::Important => 3,
            MessagePriority::Normal => 2,
            MessagePriority::Low => 1,
            MessagePriority::Unknown => 0,
        }
    }

    /// Parse a classifier label, case-insensitive.
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().as_str() {
            "urgent" => Some(MessagePriority::Urgent),
            "important" => Some(MessagePriority::Important),
            "normal" => Some(MessagePriority::Normal),
            "low" => Some(MessagePriority::Low),
            "unknown" => Some(MessagePriority::Unknown),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            MessagePriority::Urgent => "urgent",
            MessagePriority::Important => "important",
            MessagePriority::Normal => "normal",
            MessagePriority::Low => "low",
            MessagePriority::Unknown => "unknown",
        }
    }
}

impl Default for MessagePriority {
    fn default() -> Self {
        MessagePriority::Unknown
    }
}

impl fmt::Display for MessagePriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// An inbound message awaiting a triage decision.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Unique identifier
    pub id: String,
    /// Display title for the eventual notification (sender or subject)
    pub title: String,
    /// Message body, shown in the notification and fed to the classifier
    pub body: String,
    /// Originating channel or app, when known
    pub source: Option<String>,
    /// Arrival timestamp
    pub received_at: DateTime<Utc>,
}

impl Message {
    /// Create a new message with a generated id.
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        let now = Utc::now();
        Message {
            id: format!("msg-{}-{}", now.timestamp(), uuid::Uuid::new_v4()),
            title: title.into(),
            body: body.into(),
            source: None,
            received_at: now,
        }
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }
}

/// Message lifecycle state.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MessageState {
    /// Arrived, not yet classified (initial state)
    Received,
    /// Priority assigned
    Classified,
    /// Delivery plan issued and registered
    Scheduled,
    /// Presented to the user (terminal state)
    Delivered,
    /// Plan recorded, nothing presented (terminal state)
    Suppressed,
    /// Transport rejected the plan (terminal state)
    DeliveryFailed,
}

impl MessageState {
    /// Check if a transition is valid.
    pub fn can_transition_to(&self, to: &MessageState) -> bool {
        match self {
            MessageState::Received => matches!(to, MessageState::Classified),
            MessageState::Classified => matches!(to, MessageState::Scheduled),
            MessageState::Scheduled => matches!(
                to,
                MessageState::Delivered | MessageState::Suppressed | MessageState::DeliveryFailed
            ),
            // Terminal states
            MessageState::Delivered | MessageState::Suppressed | MessageState::DeliveryFailed => {
                false
            }
        }
    }

    /// Get valid next states for this state.
    pub fn valid_transitions(&self) -> &[MessageState] {
        match self {
            MessageState::Received => &[MessageState::Classified],
            MessageState::Classified => &[MessageState::Scheduled],
            MessageState::Scheduled => &[
                MessageState::Delivered,
                MessageState::Suppressed,
                MessageState::DeliveryFailed,
            ],
            MessageState::Delivered | MessageState::Suppressed | MessageState::DeliveryFailed => {
                &[]
            }
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.valid_transitions().is_empty()
    }
}

impl Default for MessageState {
    fn default() -> Self {
        MessageState::Received
    }
}

/// A message plus everything the pipeline has decided about it.
///
/// One record per processed message, kept in the engine's history for the
/// lifetime of the engine. The record only ever moves forward through the
/// lifecycle; a terminal state is final.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriagedMessage {
    pub message: Message,
    /// Current lifecycle state
    pub state: MessageState,
    /// Assigned priority, set when classified
    pub priority: Option<MessagePriority>,
    /// Full classifier output when the call succeeded
    pub classification: Option<Classification>,
    /// True when the priority came from the local fallback
    pub classified_by_fallback: bool,
    /// Issued delivery plan, set when scheduled
    pub plan: Option<DeliveryPlan>,
    /// Last transition timestamp
    pub updated_at: DateTime<Utc>,
    /// Timestamp of reaching a terminal state
    pub resolved_at: Option<DateTime<Utc>>,
}

impl TriagedMessage {
    pub fn new(message: Message) -> Self {
        let now = Utc::now();
        TriagedMessage {
            message,
            state: MessageState::Received,
            priority: None,
            classification: None,
            classified_by_fallback: false,
            plan: None,
            updated_at: now,
            resolved_at: None,
        }
    }

    /// Record the classification outcome and move to CLASSIFIED.
    ///
    /// `classification` is None when the collaborator failed and `priority`
    /// came from the fallback instead.
    pub fn record_classification(
        &mut self,
        priority: MessagePriority,
        classification: Option<Classification>,
        fallback: bool,
    ) -> Result<(), StateTransitionError> {
        self.transition_to(MessageState::Classified)?;
        self.priority = Some(priority);
        self.classification = classification;
        self.classified_by_fallback = fallback;
        Ok(())
    }

    /// Attach the issued plan and move to SCHEDULED.
    pub fn attach_plan(&mut self, plan: DeliveryPlan) -> Result<(), StateTransitionError> {
        self.transition_to(MessageState::Scheduled)?;
        self.plan = Some(plan);
        Ok(())
    }

    /// Transition to a new state.
    ///
    /// Returns an error if the transition is invalid.
    pub fn transition_to(&mut self, new_state: MessageState) -> Result<(), StateTransitionError> {
        if !self.state.can_transition_to(&new_state) {
            return Err(StateTransitionError {
                from: self.state,
                to: new_state,
            });
        }

        let now = Utc::now();
        if new_state.is_terminal() {
            self.resolved_at = Some(now);
        }
        self.state = new_state;
        self.updated_at = now;
        Ok(())
    }
}

/// Error returned when an invalid lifecycle transition is attempted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StateTransitionError {
    pub from: MessageState,
    pub to: MessageState,
}

impl fmt::Display for StateTransitionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Invalid state transition: {:?} → {:?} (valid: {:?})",
            self.from,
            self.to,
            self.from.valid_transitions()
        )
    }
}

impl std::error::Error for StateTransitionError {}
