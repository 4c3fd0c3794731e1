//! Delivery scheduling.
//!
//! The scheduler turns a classified message plus a context snapshot into
//! a finalized [`DeliveryPlan`] and makes exactly one transport call per
//! message: `deliver_now` for immediate delivery, `deliver_at` for a
//! deferred target, and no call at all for a suppressed plan. A failed
//! call is surfaced once and never retried.
//!
//! Everything here is synchronous. Registering with the transport is a
//! fast local call, so scheduling is safe to invoke directly once a
//! priority is known.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::context::ContextSnapshot;
use crate::delay::{compute_target, DelayRules};
use crate::deliver::DeliverySink;
use crate::error::DeliveryError;
use crate::message::{Message, MessagePriority};
use crate::strategy::{decide, DelayStrategy};

/// The finalized decision for one message.
///
/// Created once, immutable afterwards, consumed exactly once by the
/// delivery transport. A plan is never re-evaluated: a registered target
/// fires even if the user's context changes before it does.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DeliveryPlan {
    pub message_id: String,
    pub strategy: DelayStrategy,
    /// Concrete delivery time. Equal to the decision time for Immediate,
    /// Suppress, and deferred targets that had already passed.
    pub target_time: DateTime<Utc>,
    /// The selection rule that fired, verbatim
    pub reason: String,
    pub created_at: DateTime<Utc>,
}

/// A deferred plan registered with the transport, kept for display.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingNotification {
    pub plan: DeliveryPlan,
    pub title: String,
}

/// How the transport handled one plan.
#[derive(Debug)]
pub enum DeliveryOutcome {
    /// `deliver_now` succeeded
    DeliveredNow { critical: bool },
    /// `deliver_at` succeeded; the transport fires later
    Registered,
    /// Suppress: no transport call was made
    Suppressed,
    /// The transport rejected the plan; not retried
    Failed(DeliveryError),
}

/// Result of scheduling one message. The plan exists even when the
/// transport call failed, so callers can always record the decision.
#[derive(Debug)]
pub struct ScheduleOutcome {
    pub plan: DeliveryPlan,
    pub delivery: DeliveryOutcome,
}

/// Issues delivery plans and tracks deferred ones.
///
/// Single-writer by construction: all mutations go through `&mut self`,
/// so a concurrent host must route every schedule call through one owner.
pub struct Scheduler<S: DeliverySink> {
    sink: S,
    rules: DelayRules,
    pending: Vec<PendingNotification>,
}

impl<S: DeliverySink> Scheduler<S> {
    pub fn new(sink: S) -> Self {
        Scheduler {
            sink,
            rules: DelayRules::default(),
            pending: Vec::new(),
        }
    }

    pub fn with_rules(sink: S, rules: DelayRules) -> Self {
        Scheduler {
            sink,
            rules,
            pending: Vec::new(),
        }
    }

    /// Schedule one classified message at the given decision time.
    ///
    /// Runs the selector, then the interval calculator for deferred
    /// strategies. The `next_free` lookup is passed through lazily; it is
    /// only invoked on the paths that need a calendar answer.
    ///
    /// A deferred target that is not in the future (the digest slot after
    /// its hour, zero-delay holds) is delivered immediately instead of
    /// being registered in the past.
    pub fn schedule<F>(
        &mut self,
        message: &Message,
        priority: MessagePriority,
        snapshot: &ContextSnapshot,
        next_free: F,
        now: DateTime<Utc>,
    ) -> ScheduleOutcome
    where
        F: FnOnce() -> Option<DateTime<Utc>>,
    {
        let decision = decide(priority, snapshot.is_focused, snapshot.work_status);

        match decision.strategy {
            DelayStrategy::Immediate => {
                let critical = priority == MessagePriority::Urgent;
                self.deliver_immediately(message, decision.strategy, decision.reason, critical, now)
            }
            DelayStrategy::Suppress => ScheduleOutcome {
                plan: build_plan(message, decision.strategy, now, decision.reason, now),
                delivery: DeliveryOutcome::Suppressed,
            },
            strategy => {
                let target =
                    compute_target(strategy, snapshot.work_status, next_free, now, &self.rules);
                if target <= now {
                    return self.deliver_immediately(message, strategy, decision.reason, false, now);
                }

                let plan = build_plan(message, strategy, target, decision.reason, now);
                match self.sink.deliver_at(
                    &message.id,
                    &message.title,
                    &message.body,
                    target,
                    &plan.reason,
                ) {
                    Ok(()) => {
                        self.pending.push(PendingNotification {
                            plan: plan.clone(),
                            title: message.title.clone(),
                        });
                        ScheduleOutcome {
                            plan,
                            delivery: DeliveryOutcome::Registered,
                        }
                    }
                    Err(e) => ScheduleOutcome {
                        plan,
                        delivery: DeliveryOutcome::Failed(e),
                    },
                }
            }
        }
    }

    fn deliver_immediately(
        &mut self,
        message: &Message,
        strategy: DelayStrategy,
        reason: &str,
        critical: bool,
        now: DateTime<Utc>,
    ) -> ScheduleOutcome {
        let plan = build_plan(message, strategy, now, reason, now);
        let delivery = match self
            .sink
            .deliver_now(&message.id, &message.title, &message.body, critical)
        {
            Ok(()) => DeliveryOutcome::DeliveredNow { critical },
            Err(e) => DeliveryOutcome::Failed(e),
        };
        ScheduleOutcome { plan, delivery }
    }

    // ── Pending registry ────────────────────────────────────────────────

    /// Read-only snapshot of deferred plans, ordered by target time.
    ///
    /// Classification completions can finish out of submission order, so
    /// arrival order is meaningless; ordering happens here, at read time.
    pub fn pending(&self) -> Vec<PendingNotification> {
        let mut out = self.pending.clone();
        out.sort_by_key(|p| p.plan.target_time);
        out
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Host-reported transport firing: drop the matching pending entry.
    /// Returns whether an entry was found. The core never verifies firing
    /// on its own.
    pub fn mark_delivered(&mut self, message_id: &str) -> bool {
        let before = self.pending.len();
        self.pending.retain(|p| p.plan.message_id != message_id);
        self.pending.len() != before
    }

    /// Drop pending entries whose target has passed. The transport owns
    /// firing at or after the target, so these entries are spent. Returns
    /// the number removed.
    pub fn prune_fired(&mut self, now: DateTime<Utc>) -> usize {
        let before = self.pending.len();
        self.pending.retain(|p| p.plan.target_time > now);
        before - self.pending.len()
    }
}

fn build_plan(
    message: &Message,
    strategy: DelayStrategy,
    target_time: DateTime<Utc>,
    reason: &str,
    now: DateTime<Utc>,
) -> DeliveryPlan {
    DeliveryPlan {
        message_id: message.id.clone(),
        strategy,
        target_time,
        reason: reason.to_string(),
        created_at: now,
    }
}
