//! Delay strategy selection.
//!
//! [`select_strategy`] is the decision core of the pipeline: a pure, total
//! function over every (priority, focus, work status) combination. Rules
//! apply in order, first match wins:
//!
//! 1. Urgent traffic breaks through, whatever the context.
//! 2. Focus mode is the strongest suppressive signal after urgency.
//! 3. Meeting occupancy suppresses only when focus mode is off.
//! 4. With no suppressive signal, deliver immediately.
//!
//! Unknown priority maps to Suppress under rules 2 and 3 so that
//! misclassified traffic is never surfaced into a protected context.
//! The function has no side effects and reads no clock; identical inputs
//! always produce identical output.

use serde::{Deserialize, Serialize};

use crate::context::WorkStatus;
use crate::message::MessagePriority;

/// Terminal outcome of strategy selection.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum DelayStrategy {
    /// Present the notification now
    Immediate,
    /// Hold until the user's next free moment
    DelayUntilFree,
    /// Hold until the current meeting ends
    DelayUntilMeetingEnd,
    /// Fold into the end-of-day digest
    BatchEndOfDay,
    /// Record the decision, present nothing
    Suppress,
}

impl DelayStrategy {
    /// Whether the interval calculator runs for this strategy.
    pub fn is_deferred(&self) -> bool {
        matches!(
            self,
            DelayStrategy::DelayUntilFree
                | DelayStrategy::DelayUntilMeetingEnd
                | DelayStrategy::BatchEndOfDay
        )
    }

    pub fn name(&self) -> &'static str {
        match self {
            DelayStrategy::Immediate => "immediate",
            DelayStrategy::DelayUntilFree => "delay_until_free",
            DelayStrategy::DelayUntilMeetingEnd => "delay_until_meeting_end",
            DelayStrategy::BatchEndOfDay => "batch_end_of_day",
            DelayStrategy::Suppress => "suppress",
        }
    }
}

/// A selected strategy paired with its human-readable reason.
///
/// The reason travels into the delivery plan unchanged, so the audit
/// trail always reflects the rule that fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StrategyDecision {
    pub strategy: DelayStrategy,
    pub reason: &'static str,
}

/// Select a delay strategy for the given inputs.
///
/// Thin wrapper over [`decide`] for callers that only need the strategy.
pub fn select_strategy(
    priority: MessagePriority,
    is_focused: bool,
    work_status: WorkStatus,
) -> DelayStrategy {
    decide(priority, is_focused, work_status).strategy
}

/// Select a delay strategy and its reason for the given inputs.
///
/// Every arm is written out against the closed enums, so totality over
/// the whole input space is checked by the compiler. Arm order encodes
/// rule precedence; the catch-all last arm is the "no suppressive
/// signal" rule.
pub fn decide(
    priority: MessagePriority,
    is_focused: bool,
    work_status: WorkStatus,
) -> StrategyDecision {
    use DelayStrategy::*;
    use MessagePriority::*;

    let (strategy, reason) = match (priority, is_focused, work_status) {
        // Rule 1: urgency overrides focus and meeting state.
        (Urgent, _, _) => (Immediate, "urgent priority overrides all context"),

        // Rule 2: focus mode.
        (Important, true, WorkStatus::InMeeting) => {
            (DelayUntilMeetingEnd, "focus mode, held until the meeting ends")
        }
        (Important, true, _) => (DelayUntilFree, "focus mode, held until free"),
        (Normal, true, _) => (DelayUntilFree, "focus mode, held until free"),
        (Low, true, _) => (BatchEndOfDay, "focus mode, batched for the evening digest"),
        (Unknown, true, _) => (Suppress, "unclassified during focus, suppressed"),

        // Rule 3: meeting occupancy, focus mode off.
        (Important, false, WorkStatus::InMeeting) => {
            (DelayUntilMeetingEnd, "in a meeting, held until it ends")
        }
        (Normal | Low, false, WorkStatus::InMeeting) => {
            (DelayUntilFree, "in a meeting, held until free")
        }
        (Unknown, false, WorkStatus::InMeeting) => {
            (Suppress, "unclassified during a meeting, suppressed")
        }

        // Rule 4: no suppressive signal.
        (_, false, _) => (Immediate, "no suppressive signal, delivered immediately"),
    };

    StrategyDecision { strategy, reason }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const PRIORITIES: [MessagePriority; 5] = [
        MessagePriority::Urgent,
        MessagePriority::Important,
        MessagePriority::Normal,
        MessagePriority::Low,
        MessagePriority::Unknown,
    ];

    const STATUSES: [WorkStatus; 5] = [
        WorkStatus::Working,
        WorkStatus::InMeeting,
        WorkStatus::Resting,
        WorkStatus::Free,
        WorkStatus::Unknown,
    ];

    fn any_priority() -> impl Strategy<Value = MessagePriority> {
        prop_oneof![
            Just(MessagePriority::Urgent),
            Just(MessagePriority::Important),
            Just(MessagePriority::Normal),
            Just(MessagePriority::Low),
            Just(MessagePriority::Unknown),
        ]
    }

    fn any_status() -> impl Strategy<Value = WorkStatus> {
        prop_oneof![
            Just(WorkStatus::Working),
            Just(WorkStatus::InMeeting),
            Just(WorkStatus::Resting),
            Just(WorkStatus::Free),
            Just(WorkStatus::Unknown),
        ]
    }

    #[test]
    fn urgent_wins_everywhere() {
        for focused in [false, true] {
            for status in STATUSES {
                assert_eq!(
                    select_strategy(MessagePriority::Urgent, focused, status),
                    DelayStrategy::Immediate,
                    "urgent must break through focused={focused} status={status:?}"
                );
            }
        }
    }

    #[test]
    fn focus_mode_table() {
        assert_eq!(
            select_strategy(MessagePriority::Important, true, WorkStatus::InMeeting),
            DelayStrategy::DelayUntilMeetingEnd
        );
        assert_eq!(
            select_strategy(MessagePriority::Important, true, WorkStatus::Working),
            DelayStrategy::DelayUntilFree
        );
        assert_eq!(
            select_strategy(MessagePriority::Normal, true, WorkStatus::Free),
            DelayStrategy::DelayUntilFree
        );
        assert_eq!(
            select_strategy(MessagePriority::Low, true, WorkStatus::Resting),
            DelayStrategy::BatchEndOfDay
        );
        assert_eq!(
            select_strategy(MessagePriority::Unknown, true, WorkStatus::Free),
            DelayStrategy::Suppress
        );
    }

    #[test]
    fn meeting_without_focus_table() {
        assert_eq!(
            select_strategy(MessagePriority::Important, false, WorkStatus::InMeeting),
            DelayStrategy::DelayUntilMeetingEnd
        );
        assert_eq!(
            select_strategy(MessagePriority::Normal, false, WorkStatus::InMeeting),
            DelayStrategy::DelayUntilFree
        );
        assert_eq!(
            select_strategy(MessagePriority::Low, false, WorkStatus::InMeeting),
            DelayStrategy::DelayUntilFree
        );
        assert_eq!(
            select_strategy(MessagePriority::Unknown, false, WorkStatus::InMeeting),
            DelayStrategy::Suppress
        );
    }

    #[test]
    fn quiet_context_delivers_immediately() {
        for priority in [
            MessagePriority::Important,
            MessagePriority::Normal,
            MessagePriority::Low,
        ] {
            for status in [WorkStatus::Working, WorkStatus::Resting, WorkStatus::Free] {
                assert_eq!(
                    select_strategy(priority, false, status),
                    DelayStrategy::Immediate
                );
            }
        }
    }

    #[test]
    fn every_combination_has_a_reason() {
        for priority in PRIORITIES {
            for focused in [false, true] {
                for status in STATUSES {
                    let decision = decide(priority, focused, status);
                    assert!(!decision.reason.is_empty());
                    assert_eq!(
                        decision.strategy,
                        select_strategy(priority, focused, status)
                    );
                }
            }
        }
    }

    #[test]
    fn unknown_priority_suppressed_under_any_protective_signal() {
        for status in STATUSES {
            assert_eq!(
                select_strategy(MessagePriority::Unknown, true, status),
                DelayStrategy::Suppress
            );
        }
        assert_eq!(
            select_strategy(MessagePriority::Unknown, false, WorkStatus::InMeeting),
            DelayStrategy::Suppress
        );
    }

    // Suppression needs a protective signal. Unclassifiable traffic in a
    // quiet context surfaces like any other message.
    #[test]
    fn unknown_without_suppressive_signal_is_immediate() {
        for status in [
            WorkStatus::Working,
            WorkStatus::Resting,
            WorkStatus::Free,
            WorkStatus::Unknown,
        ] {
            assert_eq!(
                select_strategy(MessagePriority::Unknown, false, status),
                DelayStrategy::Immediate
            );
        }
    }

    #[test]
    fn deferred_marker_matches_variants() {
        assert!(!DelayStrategy::Immediate.is_deferred());
        assert!(!DelayStrategy::Suppress.is_deferred());
        assert!(DelayStrategy::DelayUntilFree.is_deferred());
        assert!(DelayStrategy::DelayUntilMeetingEnd.is_deferred());
        assert!(DelayStrategy::BatchEndOfDay.is_deferred());
    }

    proptest! {
        #[test]
        fn selection_is_pure(p in any_priority(), f in any::<bool>(), s in any_status()) {
            let first = decide(p, f, s);
            let second = decide(p, f, s);
            prop_assert_eq!(first.strategy, second.strategy);
            prop_assert_eq!(first.reason, second.reason);
        }

        #[test]
        fn urgent_always_immediate(f in any::<bool>(), s in any_status()) {
            prop_assert_eq!(
                select_strategy(MessagePriority::Urgent, f, s),
                DelayStrategy::Immediate
            );
        }

        #[test]
        fn suppress_only_for_unknown_priority(p in any_priority(), f in any::<bool>(), s in any_status()) {
            if select_strategy(p, f, s) == DelayStrategy::Suppress {
                prop_assert_eq!(p, MessagePriority::Unknown);
            }
        }
    }
}
