//! Delay interval calculation for deferred strategies.
//!
//! Targets are wall-clock, minute-coarse timestamps. Clock-of-day
//! constants (the digest hour, the next-morning resume hour) are applied
//! to the caller-supplied `now`, so the caller owns the time frame.
//! Monotonic precision is not a goal at this granularity.

use chrono::{DateTime, Duration, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::context::WorkStatus;
use crate::strategy::DelayStrategy;

/// Tunable delay constants. The defaults are the shipped triage behavior.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DelayRules {
    /// Hold while actively working (minutes)
    #[serde(default = "default_working_hold")]
    pub working_hold_min: i64,
    /// Hold when in a meeting and no free slot is known (minutes)
    #[serde(default = "default_meeting_fallback")]
    pub meeting_fallback_min: i64,
    /// Hold while resting between events (minutes)
    #[serde(default = "default_resting_hold")]
    pub resting_hold_min: i64,
    /// Hour of the end-of-day digest (0-23)
    #[serde(default = "default_batch_hour")]
    pub batch_hour: u32,
    /// Minute within the digest hour
    #[serde(default)]
    pub batch_minute: u32,
    /// Resume hour on the following day when a meeting's end is unknown
    #[serde(default = "default_resume_hour")]
    pub next_day_resume_hour: u32,
}

fn default_working_hold() -> i64 {
    15
}

fn default_meeting_fallback() -> i64 {
    30
}

fn default_resting_hold() -> i64 {
    5
}

fn default_batch_hour() -> u32 {
    18
}

fn default_resume_hour() -> u32 {
    9
}

impl Default for DelayRules {
    fn default() -> Self {
        DelayRules {
            working_hold_min: default_working_hold(),
            meeting_fallback_min: default_meeting_fallback(),
            resting_hold_min: default_resting_hold(),
            batch_hour: default_batch_hour(),
            batch_minute: 0,
            next_day_resume_hour: default_resume_hour(),
        }
    }
}

/// Compute the concrete delivery target for a strategy.
///
/// Immediate and Suppress return `now` untouched; the deferred strategies
/// produce a target per their rules. The `next_free` lookup is invoked
/// lazily and at most once: never for DelayUntilFree while working or
/// resting, so a slow or wrong lookup cannot disturb those paths.
///
/// The lookup collaborator owns the "starts too soon to count" exclusion.
/// A returned value is trusted as-is, even one earlier than
/// `now + 5 minutes`; the calculator does not re-filter.
///
/// A returned target may lie in the past (the digest slot after its hour
/// has passed). The scheduler routes that case to immediate delivery
/// instead of registering a notification in the past.
pub fn compute_target<F>(
    strategy: DelayStrategy,
    work_status: WorkStatus,
    next_free: F,
    now: DateTime<Utc>,
    rules: &DelayRules,
) -> DateTime<Utc>
where
    F: FnOnce() -> Option<DateTime<Utc>>,
{
    match strategy {
        DelayStrategy::Immediate | DelayStrategy::Suppress => now,
        DelayStrategy::DelayUntilFree => match work_status {
            WorkStatus::Working => now + Duration::minutes(rules.working_hold_min),
            WorkStatus::InMeeting => next_free()
                .unwrap_or_else(|| now + Duration::minutes(rules.meeting_fallback_min)),
            WorkStatus::Resting => now + Duration::minutes(rules.resting_hold_min),
            // Zero hold: effectively immediate.
            WorkStatus::Free | WorkStatus::Unknown => now,
        },
        DelayStrategy::DelayUntilMeetingEnd => {
            next_free().unwrap_or_else(|| next_day_resume(now, rules))
        }
        DelayStrategy::BatchEndOfDay => batch_slot(now, rules),
    }
}

/// Today's digest slot at the configured hour.
fn batch_slot(now: DateTime<Utc>, rules: &DelayRules) -> DateTime<Utc> {
    now.with_hour(rules.batch_hour)
        .and_then(|t| t.with_minute(rules.batch_minute))
        .and_then(|t| t.with_second(0))
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(now)
}

/// The configured resume hour on the following calendar day. Conservative
/// fallback when a meeting's end cannot be named.
fn next_day_resume(now: DateTime<Utc>, rules: &DelayRules) -> DateTime<Utc> {
    let tomorrow = now + Duration::days(1);
    tomorrow
        .with_hour(rules.next_day_resume_hour)
        .and_then(|t| t.with_minute(0))
        .and_then(|t| t.with_second(0))
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(tomorrow)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, TimeZone};
    use proptest::prelude::*;
    use std::cell::Cell;

    fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 12, hour, minute, 0).unwrap()
    }

    #[test]
    fn working_hold_is_fifteen_minutes() {
        let now = at(10, 0);
        let target = compute_target(
            DelayStrategy::DelayUntilFree,
            WorkStatus::Working,
            || Some(at(16, 0)),
            now,
            &DelayRules::default(),
        );
        assert_eq!(target, now + Duration::minutes(15));
    }

    #[test]
    fn next_free_lookup_skipped_while_working() {
        let now = at(10, 0);
        let called = Cell::new(false);
        compute_target(
            DelayStrategy::DelayUntilFree,
            WorkStatus::Working,
            || {
                called.set(true);
                Some(at(16, 0))
            },
            now,
            &DelayRules::default(),
        );
        assert!(!called.get(), "working hold must not consult the calendar");
    }

    #[test]
    fn meeting_hold_uses_lookup_when_present() {
        let now = at(10, 0);
        let free_at = at(11, 30);
        let target = compute_target(
            DelayStrategy::DelayUntilFree,
            WorkStatus::InMeeting,
            || Some(free_at),
            now,
            &DelayRules::default(),
        );
        assert_eq!(target, free_at);
    }

    #[test]
    fn meeting_hold_falls_back_to_thirty_minutes() {
        let now = at(10, 0);
        let target = compute_target(
            DelayStrategy::DelayUntilFree,
            WorkStatus::InMeeting,
            || None,
            now,
            &DelayRules::default(),
        );
        assert_eq!(target, now + Duration::minutes(30));
    }

    #[test]
    fn resting_hold_is_five_minutes() {
        let now = at(10, 0);
        let target = compute_target(
            DelayStrategy::DelayUntilFree,
            WorkStatus::Resting,
            || None,
            now,
            &DelayRules::default(),
        );
        assert_eq!(target, now + Duration::minutes(5));
    }

    #[test]
    fn free_and_unknown_have_zero_hold() {
        let now = at(10, 0);
        for status in [WorkStatus::Free, WorkStatus::Unknown] {
            let target = compute_target(
                DelayStrategy::DelayUntilFree,
                status,
                || None,
                now,
                &DelayRules::default(),
            );
            assert_eq!(target, now);
        }
    }

    #[test]
    fn meeting_end_targets_lookup_value() {
        let now = at(14, 0);
        let free_at = at(15, 0);
        let target = compute_target(
            DelayStrategy::DelayUntilMeetingEnd,
            WorkStatus::InMeeting,
            || Some(free_at),
            now,
            &DelayRules::default(),
        );
        assert_eq!(target, free_at);
    }

    #[test]
    fn meeting_end_without_lookup_resumes_next_morning() {
        let now = at(14, 0);
        let target = compute_target(
            DelayStrategy::DelayUntilMeetingEnd,
            WorkStatus::InMeeting,
            || None,
            now,
            &DelayRules::default(),
        );
        assert_eq!(target.hour(), 9);
        assert_eq!(target.minute(), 0);
        assert_eq!(target.day(), now.day() + 1);
    }

    // The free-time signal is the start of the next calendar event, and the
    // lookup collaborator owns the too-soon exclusion. A value inside the
    // five-minute window is still trusted here, not re-filtered.
    #[test]
    fn meeting_end_trusts_too_soon_lookup_value() {
        let now = at(14, 0);
        let barely_ahead = now + Duration::minutes(2);
        let target = compute_target(
            DelayStrategy::DelayUntilMeetingEnd,
            WorkStatus::InMeeting,
            || Some(barely_ahead),
            now,
            &DelayRules::default(),
        );
        assert_eq!(target, barely_ahead);
    }

    #[test]
    fn batch_targets_today_at_eighteen() {
        let now = at(10, 17);
        let target = compute_target(
            DelayStrategy::BatchEndOfDay,
            WorkStatus::Free,
            || None,
            now,
            &DelayRules::default(),
        );
        assert_eq!(target.hour(), 18);
        assert_eq!(target.minute(), 0);
        assert_eq!(target.day(), now.day());
    }

    #[test]
    fn batch_after_digest_hour_yields_past_target() {
        let now = at(20, 0);
        let target = compute_target(
            DelayStrategy::BatchEndOfDay,
            WorkStatus::Free,
            || None,
            now,
            &DelayRules::default(),
        );
        assert!(target < now, "the past slot is the scheduler's cue to deliver now");
        assert_eq!(target.hour(), 18);
    }

    #[test]
    fn immediate_and_suppress_pass_now_through() {
        let now = at(10, 0);
        for strategy in [DelayStrategy::Immediate, DelayStrategy::Suppress] {
            let target = compute_target(
                strategy,
                WorkStatus::Working,
                || Some(at(16, 0)),
                now,
                &DelayRules::default(),
            );
            assert_eq!(target, now);
        }
    }

    #[test]
    fn custom_rules_are_honored() {
        let now = at(10, 0);
        let rules = DelayRules {
            working_hold_min: 40,
            batch_hour: 21,
            batch_minute: 30,
            ..DelayRules::default()
        };
        let held = compute_target(
            DelayStrategy::DelayUntilFree,
            WorkStatus::Working,
            || None,
            now,
            &rules,
        );
        assert_eq!(held, now + Duration::minutes(40));

        let batched = compute_target(DelayStrategy::BatchEndOfDay, WorkStatus::Free, || None, now, &rules);
        assert_eq!((batched.hour(), batched.minute()), (21, 30));
    }

    proptest! {
        // Without a lookup result, no DelayUntilFree hold may point backwards.
        #[test]
        fn free_holds_never_precede_now(hour in 0u32..24, minute in 0u32..60) {
            let now = at(hour, minute);
            for status in [
                WorkStatus::Working,
                WorkStatus::InMeeting,
                WorkStatus::Resting,
                WorkStatus::Free,
                WorkStatus::Unknown,
            ] {
                let target = compute_target(
                    DelayStrategy::DelayUntilFree,
                    status,
                    || None,
                    now,
                    &DelayRules::default(),
                );
                prop_assert!(target >= now);
            }
        }

        // The next-morning fallback is always strictly ahead of now.
        #[test]
        fn next_day_resume_is_always_ahead(hour in 0u32..24) {
            let now = at(hour, 0);
            let target = compute_target(
                DelayStrategy::DelayUntilMeetingEnd,
                WorkStatus::InMeeting,
                || None,
                now,
                &DelayRules::default(),
            );
            prop_assert!(target > now);
        }
    }
}
