use std::path::PathBuf;

use chrono::Utc;
use clap::Args;
use lull_core::{CalendarContextSource, CalendarEvent};

use crate::common::parse_rfc3339;

#[derive(Args)]
pub struct ContextArgs {
    /// Calendar events file (JSON array)
    #[arg(long)]
    pub calendar: PathBuf,
    /// Focus session active
    #[arg(long)]
    pub focused: bool,
    /// Evaluation time, RFC 3339 (defaults to now)
    #[arg(long)]
    pub at: Option<String>,
}

pub fn run(args: ContextArgs) -> Result<(), Box<dyn std::error::Error>> {
    let text = std::fs::read_to_string(&args.calendar)?;
    let events: Vec<CalendarEvent> = serde_json::from_str(&text)?;
    let now = match &args.at {
        Some(value) => parse_rfc3339(value)?,
        None => Utc::now(),
    };

    let source = CalendarContextSource::new(events, args.focused);
    let snapshot = source.snapshot_at(now);
    let next_free = source.next_free_at(now);

    let json = serde_json::json!({
        "work_status": snapshot.work_status.name(),
        "is_focused": snapshot.is_focused,
        "captured_at": snapshot.captured_at.to_rfc3339(),
        "upcoming_event_titles": snapshot.upcoming_event_titles,
        "next_free_time": next_free.map(|t| t.to_rfc3339()),
    });
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
