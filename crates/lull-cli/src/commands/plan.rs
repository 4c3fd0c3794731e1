use chrono::Utc;
use clap::Args;
use lull_core::{compute_target, decide, Config, MessagePriority, WorkStatus};

use crate::common::{parse_rfc3339, PRIORITY_LABELS, STATUS_LABELS};

#[derive(Args)]
pub struct PlanArgs {
    /// Message priority
    #[arg(long, value_parser = PRIORITY_LABELS)]
    pub priority: String,
    /// Current work status
    #[arg(long, value_parser = STATUS_LABELS, default_value = "unknown")]
    pub status: String,
    /// Focus session active
    #[arg(long)]
    pub focused: bool,
    /// Next free slot, RFC 3339 (what a calendar lookup would report)
    #[arg(long)]
    pub next_free: Option<String>,
    /// Decision time, RFC 3339 (defaults to now)
    #[arg(long)]
    pub at: Option<String>,
}

pub fn run(args: PlanArgs) -> Result<(), Box<dyn std::error::Error>> {
    let priority = MessagePriority::from_label(&args.priority).unwrap_or_default();
    let status = WorkStatus::from_label(&args.status).unwrap_or_default();
    let now = match &args.at {
        Some(value) => parse_rfc3339(value)?,
        None => Utc::now(),
    };
    let next_free = match &args.next_free {
        Some(value) => Some(parse_rfc3339(value)?),
        None => None,
    };

    let rules = Config::load_or_default().delays;
    let decision = decide(priority, args.focused, status);
    let target = compute_target(decision.strategy, status, || next_free, now, &rules);

    let json = serde_json::json!({
        "priority": priority.name(),
        "work_status": status.name(),
        "is_focused": args.focused,
        "strategy": decision.strategy.name(),
        "reason": decision.reason,
        "target_time": target.to_rfc3339(),
    });
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
