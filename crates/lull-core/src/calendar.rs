//! Calendar occupancy and the calendar-backed context source.
//!
//! Work status is derived from event coverage: a work event covering now
//! means working, any other current event means in a meeting, an event
//! starting within the next hour means resting, otherwise free. Unknown
//! is reserved for sources with no calendar access at all.
//!
//! The free-time signal is the start of the next event at least five
//! minutes out. It is a proxy, not the end of the current event, and the
//! delay calculator consumes it as-is; see the module tests for the edge
//! this produces.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::context::{ContextSnapshot, ContextSource, WorkStatus};

/// Minutes ahead an event may start and still put the user in resting.
const RESTING_WINDOW_MIN: i64 = 60;
/// Events starting sooner than this never count as a free-time signal.
const FREE_SIGNAL_EXCLUSION_MIN: i64 = 5;

/// What kind of calendar entry an event is.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    /// Focused work blocks (deep work, coding, writing)
    Work,
    /// Meetings and calls
    Meeting,
    /// Everything else (errands, personal)
    Personal,
}

/// A calendar event, reduced to what occupancy derivation needs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalendarEvent {
    #[serde(default = "generate_event_id")]
    pub id: String,
    pub title: String,
    pub kind: EventKind,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

fn generate_event_id() -> String {
    format!("evt-{}", uuid::Uuid::new_v4())
}

impl CalendarEvent {
    pub fn new(
        title: impl Into<String>,
        kind: EventKind,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
    ) -> Self {
        CalendarEvent {
            id: generate_event_id(),
            title: title.into(),
            kind,
            start_time,
            end_time,
        }
    }

    /// Whether this event covers the given instant.
    pub fn covers(&self, at: DateTime<Utc>) -> bool {
        self.start_time <= at && at < self.end_time
    }
}

/// Derive occupancy from an event list at the given instant.
///
/// When several events cover now, the earliest-starting one decides.
pub fn derive_work_status(events: &[CalendarEvent], now: DateTime<Utc>) -> WorkStatus {
    if let Some(current) = events
        .iter()
        .filter(|e| e.covers(now))
        .min_by_key(|e| e.start_time)
    {
        return match current.kind {
            EventKind::Work => WorkStatus::Working,
            EventKind::Meeting | EventKind::Personal => WorkStatus::InMeeting,
        };
    }

    let horizon = now + Duration::minutes(RESTING_WINDOW_MIN);
    let starting_soon = events
        .iter()
        .any(|e| e.start_time > now && e.start_time <= horizon);
    if starting_soon {
        WorkStatus::Resting
    } else {
        WorkStatus::Free
    }
}

/// The free-time signal: start of the next event at least five minutes
/// out. None when nothing qualifies.
///
/// This is the upstream calendar service's own notion of "next free
/// time", preserved for parity: the start of the next event, not the end
/// of the current one.
pub fn next_free_after(events: &[CalendarEvent], now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let cutoff = now + Duration::minutes(FREE_SIGNAL_EXCLUSION_MIN);
    events
        .iter()
        .filter(|e| e.start_time >= cutoff)
        .map(|e| e.start_time)
        .min()
}

/// Context source backed by a calendar event list and the platform focus
/// flag. Events are loaded up front; both trait calls are local reads.
#[derive(Debug, Clone)]
pub struct CalendarContextSource {
    events: Vec<CalendarEvent>,
    is_focused: bool,
}

impl CalendarContextSource {
    pub fn new(events: Vec<CalendarEvent>, is_focused: bool) -> Self {
        CalendarContextSource { events, is_focused }
    }

    /// Snapshot at an explicit instant.
    pub fn snapshot_at(&self, now: DateTime<Utc>) -> ContextSnapshot {
        let mut upcoming: Vec<&CalendarEvent> =
            self.events.iter().filter(|e| e.start_time > now).collect();
        upcoming.sort_by_key(|e| e.start_time);

        ContextSnapshot {
            work_status: derive_work_status(&self.events, now),
            is_focused: self.is_focused,
            captured_at: now,
            upcoming_event_titles: upcoming.iter().map(|e| e.title.clone()).collect(),
        }
    }

    pub fn next_free_at(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        next_free_after(&self.events, now)
    }
}

impl ContextSource for CalendarContextSource {
    fn current_context(&self) -> ContextSnapshot {
        self.snapshot_at(Utc::now())
    }

    fn next_free_time(&self) -> Option<DateTime<Utc>> {
        self.next_free_at(Utc::now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 12, hour, minute, 0).unwrap()
    }

    fn make_event(title: &str, kind: EventKind, start: DateTime<Utc>, end: DateTime<Utc>) -> CalendarEvent {
        CalendarEvent::new(title, kind, start, end)
    }

    #[test]
    fn work_event_covering_now_means_working() {
        let events = vec![make_event("deep work", EventKind::Work, at(9, 0), at(11, 0))];
        assert_eq!(derive_work_status(&events, at(10, 0)), WorkStatus::Working);
    }

    #[test]
    fn non_work_event_covering_now_means_in_meeting() {
        let meeting = vec![make_event("standup", EventKind::Meeting, at(9, 30), at(10, 30))];
        assert_eq!(derive_work_status(&meeting, at(10, 0)), WorkStatus::InMeeting);

        let personal = vec![make_event("dentist", EventKind::Personal, at(9, 30), at(10, 30))];
        assert_eq!(derive_work_status(&personal, at(10, 0)), WorkStatus::InMeeting);
    }

    #[test]
    fn upcoming_event_within_the_hour_means_resting() {
        let events = vec![make_event("1:1", EventKind::Meeting, at(10, 45), at(11, 15))];
        assert_eq!(derive_work_status(&events, at(10, 0)), WorkStatus::Resting);
    }

    #[test]
    fn distant_or_no_events_mean_free() {
        let distant = vec![make_event("review", EventKind::Meeting, at(14, 0), at(15, 0))];
        assert_eq!(derive_work_status(&distant, at(10, 0)), WorkStatus::Free);
        assert_eq!(derive_work_status(&[], at(10, 0)), WorkStatus::Free);
    }

    #[test]
    fn event_end_is_exclusive() {
        let events = vec![make_event("standup", EventKind::Meeting, at(9, 0), at(10, 0))];
        // 10:00 itself is past the event, and nothing else is near.
        assert_eq!(derive_work_status(&events, at(10, 0)), WorkStatus::Free);
    }

    #[test]
    fn overlapping_events_resolved_by_earliest_start() {
        let events = vec![
            make_event("standup", EventKind::Meeting, at(9, 50), at(10, 20)),
            make_event("deep work", EventKind::Work, at(9, 0), at(12, 0)),
        ];
        // The work block started first, so it decides.
        assert_eq!(derive_work_status(&events, at(10, 0)), WorkStatus::Working);
    }

    // The signal is the start of the NEXT event, not the end of the
    // current one. A meeting-end hold computed from it lands on the start
    // of an unrelated later event when the calendar is back to back.
    #[test]
    fn next_free_signal_is_next_event_start() {
        let events = vec![
            make_event("current", EventKind::Meeting, at(9, 0), at(10, 30)),
            make_event("later", EventKind::Meeting, at(11, 0), at(12, 0)),
        ];
        assert_eq!(next_free_after(&events, at(10, 0)), Some(at(11, 0)));
    }

    #[test]
    fn next_free_excludes_events_starting_within_five_minutes() {
        let events = vec![
            make_event("imminent", EventKind::Meeting, at(10, 3), at(10, 30)),
            make_event("later", EventKind::Meeting, at(11, 0), at(12, 0)),
        ];
        assert_eq!(next_free_after(&events, at(10, 0)), Some(at(11, 0)));
    }

    #[test]
    fn next_free_boundary_at_exactly_five_minutes_counts() {
        let events = vec![make_event("soon", EventKind::Meeting, at(10, 5), at(10, 30))];
        assert_eq!(next_free_after(&events, at(10, 0)), Some(at(10, 5)));
    }

    #[test]
    fn next_free_none_when_calendar_runs_out() {
        let events = vec![make_event("past", EventKind::Meeting, at(8, 0), at(9, 0))];
        assert_eq!(next_free_after(&events, at(10, 0)), None);
        assert_eq!(next_free_after(&[], at(10, 0)), None);
    }

    #[test]
    fn snapshot_lists_upcoming_titles_soonest_first() {
        let source = CalendarContextSource::new(
            vec![
                make_event("afternoon review", EventKind::Meeting, at(14, 0), at(15, 0)),
                make_event("lunch", EventKind::Personal, at(12, 0), at(13, 0)),
                make_event("yesterday", EventKind::Work, at(7, 0), at(8, 0)),
            ],
            false,
        );
        let snapshot = source.snapshot_at(at(10, 0));
        assert_eq!(
            snapshot.upcoming_event_titles,
            vec!["lunch".to_string(), "afternoon review".to_string()]
        );
        assert_eq!(snapshot.work_status, WorkStatus::Free);
    }

    #[test]
    fn focus_flag_passes_through_snapshot() {
        let source = CalendarContextSource::new(Vec::new(), true);
        assert!(source.snapshot_at(at(10, 0)).is_focused);
    }
}
