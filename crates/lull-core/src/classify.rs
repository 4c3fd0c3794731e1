//! Priority classification boundary.
//!
//! Classification is the one asynchronous step of the pipeline. The
//! collaborator behind [`Classifier`] may be remote and may fail; the
//! engine absorbs failures by falling back to normal priority, so nothing
//! here is allowed to stall or abort triage.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::context::ContextSnapshot;
use crate::error::ClassifyError;
use crate::message::{Message, MessagePriority};

/// Classifier output: the assigned priority plus whatever the collaborator
/// can say about its own judgment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Classification {
    pub priority: MessagePriority,
    /// Collaborator's confidence in the label, 0.0 to 1.0
    pub confidence: f32,
    /// Collaborator-provided reasoning text, when available
    pub reasoning: Option<String>,
}

impl Classification {
    pub fn new(priority: MessagePriority, confidence: f32) -> Self {
        Classification {
            priority,
            confidence,
            reasoning: None,
        }
    }

    pub fn with_reasoning(mut self, reasoning: impl Into<String>) -> Self {
        self.reasoning = Some(reasoning.into());
        self
    }
}

/// The classification collaborator.
///
/// `classify` is the only suspension point in the triage pipeline. A
/// returned error is not fatal: the engine proceeds with normal priority
/// and records that the fallback fired.
#[async_trait]
pub trait Classifier: Send + Sync {
    async fn classify(
        &self,
        message: &Message,
        context: &ContextSnapshot,
    ) -> Result<Classification, ClassifyError>;
}

#[async_trait]
impl Classifier for Box<dyn Classifier> {
    async fn classify(
        &self,
        message: &Message,
        context: &ContextSnapshot,
    ) -> Result<Classification, ClassifyError> {
        (**self).classify(message, context).await
    }
}

/// Fixed-answer classifier for tests and priority-forcing CLI runs.
#[derive(Debug, Clone)]
pub struct StaticClassifier {
    priority: MessagePriority,
    confidence: f32,
}

impl StaticClassifier {
    pub fn new(priority: MessagePriority) -> Self {
        StaticClassifier {
            priority,
            confidence: 1.0,
        }
    }

    pub fn with_confidence(mut self, confidence: f32) -> Self {
        self.confidence = confidence;
        self
    }
}

#[async_trait]
impl Classifier for StaticClassifier {
    async fn classify(
        &self,
        _message: &Message,
        _context: &ContextSnapshot,
    ) -> Result<Classification, ClassifyError> {
        Ok(Classification::new(self.priority, self.confidence))
    }
}

/// Classifier that always fails. Exercises the engine's fallback path.
#[derive(Debug, Clone, Default)]
pub struct FailingClassifier;

#[async_trait]
impl Classifier for FailingClassifier {
    async fn classify(
        &self,
        _message: &Message,
        _context: &ContextSnapshot,
    ) -> Result<Classification, ClassifyError> {
        Err(ClassifyError::Unavailable("classifier offline".to_string()))
    }
}
