//! User context types and the context collaborator seam.
//!
//! A [`ContextSnapshot`] is assembled fresh for every incoming message.
//! Context can change between messages, so a snapshot is captured once at
//! decision time and never reused or mutated afterwards.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Occupancy state derived from calendar data.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum WorkStatus {
    /// A work-related event covers the current time
    Working,
    /// A non-work event covers the current time
    InMeeting,
    /// Nothing now, but an event starts within the resting window
    Resting,
    /// No current or near-future event
    Free,
    /// Occupancy could not be determined (no calendar access)
    Unknown,
}

impl WorkStatus {
    pub fn name(&self) -> &'static str {
        match self {
            WorkStatus::Working => "working",
            WorkStatus::InMeeting => "in_meeting",
            WorkStatus::Resting => "resting",
            WorkStatus::Free => "free",
            WorkStatus::Unknown => "unknown",
        }
    }

    /// Parse a status label, case-insensitive. Accepts both snake_case
    /// and the bare word for the meeting state.
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().as_str() {
            "working" => Some(WorkStatus::Working),
            "in_meeting" | "meeting" | "inmeeting" => Some(WorkStatus::InMeeting),
            "resting" => Some(WorkStatus::Resting),
            "free" => Some(WorkStatus::Free),
            "unknown" => Some(WorkStatus::Unknown),
            _ => None,
        }
    }
}

impl Default for WorkStatus {
    fn default() -> Self {
        WorkStatus::Unknown
    }
}

/// Immutable record of the user's context at decision time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextSnapshot {
    /// Calendar occupancy at capture time
    pub work_status: WorkStatus,
    /// Whether the platform focus / do-not-disturb mode is active
    pub is_focused: bool,
    /// Capture timestamp
    pub captured_at: DateTime<Utc>,
    /// Titles of upcoming events, soonest first (display only)
    #[serde(default)]
    pub upcoming_event_titles: Vec<String>,
}

impl ContextSnapshot {
    pub fn new(work_status: WorkStatus, is_focused: bool) -> Self {
        ContextSnapshot {
            work_status,
            is_focused,
            captured_at: Utc::now(),
            upcoming_event_titles: Vec::new(),
        }
    }

    pub fn with_upcoming_titles(mut self, titles: Vec<String>) -> Self {
        self.upcoming_event_titles = titles;
        self
    }
}

/// Context collaborator: supplies occupancy and the free-time signal.
///
/// Both calls must be cheap local reads. Implementations refresh their
/// own calendar data out of band; the engine never asks them to block.
pub trait ContextSource: Send + Sync {
    /// Snapshot the user's current context.
    fn current_context(&self) -> ContextSnapshot;

    /// The next point at which the user becomes free, if the calendar can
    /// name one. Implementations must exclude events starting within
    /// 5 minutes of now; the delay calculator trusts the returned value
    /// as-is.
    fn next_free_time(&self) -> Option<DateTime<Utc>>;
}

impl<T: ContextSource + ?Sized> ContextSource for Box<T> {
    fn current_context(&self) -> ContextSnapshot {
        (**self).current_context()
    }

    fn next_free_time(&self) -> Option<DateTime<Utc>> {
        (**self).next_free_time()
    }
}

/// Fixed-value context source for tests and flag-driven CLI runs.
#[derive(Debug, Clone)]
pub struct FixedContext {
    pub work_status: WorkStatus,
    pub is_focused: bool,
    pub next_free: Option<DateTime<Utc>>,
}

impl FixedContext {
    pub fn new(work_status: WorkStatus, is_focused: bool) -> Self {
        FixedContext {
            work_status,
            is_focused,
            next_free: None,
        }
    }

    pub fn with_next_free(mut self, at: DateTime<Utc>) -> Self {
        self.next_free = Some(at);
        self
    }
}

impl ContextSource for FixedContext {
    fn current_context(&self) -> ContextSnapshot {
        ContextSnapshot::new(self.work_status, self.is_focused)
    }

    fn next_free_time(&self) -> Option<DateTime<Utc>> {
        self.next_free
    }
}
