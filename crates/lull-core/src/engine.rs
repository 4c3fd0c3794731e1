//! The triage pipeline: snapshot, classify, schedule.
//!
//! [`TriageEngine`] is the single consumer of classification completions.
//! Every mutation of scheduling state happens through `&mut self` on one
//! control flow, so the core needs no internal locking. The await on the
//! classifier is the only suspension point; no shared state is touched
//! while it is outstanding. Messages are processed independently, and no
//! ordering is guaranteed between concurrently submitted messages.

use chrono::{DateTime, Utc};

use crate::classify::Classifier;
use crate::context::ContextSource;
use crate::delay::DelayRules;
use crate::deliver::DeliverySink;
use crate::error::{Result, TriageError};
use crate::events::Event;
use crate::message::{Message, MessagePriority, MessageState, TriagedMessage};
use crate::scheduler::{DeliveryOutcome, DeliveryPlan, PendingNotification, Scheduler};

/// Orchestrates classification and scheduling for incoming messages.
///
/// Owns the scheduler, the processed-message history, and the event log.
/// Hosts poll `pending`, `history`, and `drain_events`; nothing is pushed
/// outward.
pub struct TriageEngine<C, X, S>
where
    C: Classifier,
    X: ContextSource,
    S: DeliverySink,
{
    classifier: C,
    context: X,
    scheduler: Scheduler<S>,
    history: Vec<TriagedMessage>,
    events: Vec<Event>,
}

impl<C, X, S> TriageEngine<C, X, S>
where
    C: Classifier,
    X: ContextSource,
    S: DeliverySink,
{
    pub fn new(classifier: C, context: X, sink: S) -> Self {
        TriageEngine {
            classifier,
            context,
            scheduler: Scheduler::new(sink),
            history: Vec::new(),
            events: Vec::new(),
        }
    }

    pub fn with_rules(classifier: C, context: X, sink: S, rules: DelayRules) -> Self {
        TriageEngine {
            classifier,
            context,
            scheduler: Scheduler::with_rules(sink, rules),
            history: Vec::new(),
            events: Vec::new(),
        }
    }

    /// Run one message through the full pipeline at the current time.
    pub async fn process(&mut self, message: Message) -> Result<DeliveryPlan> {
        self.process_at(message, Utc::now()).await
    }

    /// Run one message through the full pipeline with an explicit decision
    /// time.
    ///
    /// A fresh context snapshot is taken per message. Classification
    /// failure is absorbed: the message proceeds with normal priority,
    /// never unknown, so a silent collaborator failure cannot route real
    /// traffic into Suppress. A transport failure is returned as an error
    /// after the record (state DELIVERY_FAILED, plan attached) is kept in
    /// history; there is no retry.
    pub async fn process_at(&mut self, message: Message, now: DateTime<Utc>) -> Result<DeliveryPlan> {
        let mut record = TriagedMessage::new(message);
        self.events.push(Event::MessageReceived {
            message_id: record.message.id.clone(),
            at: now,
        });

        let snapshot = self.context.current_context();

        // The only suspension point in the pipeline.
        let (priority, classification, fallback) =
            match self.classifier.classify(&record.message, &snapshot).await {
                Ok(c) => (c.priority, Some(c), false),
                Err(_) => (MessagePriority::Normal, None, true),
            };

        record.record_classification(priority, classification, fallback)?;
        self.events.push(Event::MessageClassified {
            message_id: record.message.id.clone(),
            priority,
            confidence: record.classification.as_ref().map(|c| c.confidence),
            fallback,
            at: now,
        });

        let context = &self.context;
        let outcome = self.scheduler.schedule(
            &record.message,
            priority,
            &snapshot,
            || context.next_free_time(),
            now,
        );

        record.attach_plan(outcome.plan.clone())?;
        let plan = outcome.plan;

        match outcome.delivery {
            DeliveryOutcome::DeliveredNow { critical } => {
                record.transition_to(MessageState::Delivered)?;
                self.events.push(Event::PlanDelivered {
                    message_id: plan.message_id.clone(),
                    strategy: plan.strategy,
                    critical,
                    at: now,
                });
                self.history.push(record);
                Ok(plan)
            }
            DeliveryOutcome::Registered => {
                // Deferred plans stay SCHEDULED until the host reports the
                // transport fired.
                self.events.push(Event::PlanScheduled {
                    message_id: plan.message_id.clone(),
                    strategy: plan.strategy,
                    target_time: plan.target_time,
                    reason: plan.reason.clone(),
                    at: now,
                });
                self.history.push(record);
                Ok(plan)
            }
            DeliveryOutcome::Suppressed => {
                record.transition_to(MessageState::Suppressed)?;
                self.events.push(Event::PlanSuppressed {
                    message_id: plan.message_id.clone(),
                    reason: plan.reason.clone(),
                    at: now,
                });
                self.history.push(record);
                Ok(plan)
            }
            DeliveryOutcome::Failed(e) => {
                record.transition_to(MessageState::DeliveryFailed)?;
                self.events.push(Event::DeliveryFailed {
                    message_id: plan.message_id.clone(),
                    strategy: plan.strategy,
                    error: e.to_string(),
                    at: now,
                });
                self.history.push(record);
                Err(TriageError::Delivery(e))
            }
        }
    }

    // ── Queries ─────────────────────────────────────────────────────────

    /// Deferred plans ordered by target time.
    pub fn pending(&self) -> Vec<PendingNotification> {
        self.scheduler.pending()
    }

    pub fn pending_count(&self) -> usize {
        self.scheduler.pending_count()
    }

    /// Every processed message with its final state and plan, in
    /// processing-completion order.
    pub fn history(&self) -> &[TriagedMessage] {
        &self.history
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Drain the accumulated event log.
    pub fn drain_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    // ── Maintenance ─────────────────────────────────────────────────────

    /// Host-reported transport firing for a deferred plan. Moves the
    /// history record to DELIVERED and drops the pending entry. Returns
    /// false when no pending entry matched.
    pub fn mark_delivered(&mut self, message_id: &str, at: DateTime<Utc>) -> bool {
        if !self.scheduler.mark_delivered(message_id) {
            return false;
        }
        if let Some(record) = self
            .history
            .iter_mut()
            .find(|r| r.message.id == message_id)
        {
            if record.transition_to(MessageState::Delivered).is_ok() {
                if let Some(plan) = &record.plan {
                    self.events.push(Event::PlanDelivered {
                        message_id: message_id.to_string(),
                        strategy: plan.strategy,
                        critical: false,
                        at,
                    });
                }
            }
        }
        true
    }

    /// Drop pending entries whose target has passed. History records are
    /// untouched; only the display registry shrinks.
    pub fn prune_fired(&mut self, now: DateTime<Utc>) -> usize {
        self.scheduler.prune_fired(now)
    }
}
