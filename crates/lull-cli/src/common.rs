//! Shared helpers for CLI commands.

use chrono::{DateTime, Utc};
use lull_core::{DeliveryError, DeliverySink};

/// Accepted priority labels, in the order shown in help output.
pub const PRIORITY_LABELS: [&str; 5] = ["urgent", "important", "normal", "low", "unknown"];

/// Accepted work status labels.
pub const STATUS_LABELS: [&str; 5] = ["working", "in_meeting", "resting", "free", "unknown"];

/// Parse an RFC 3339 timestamp into UTC.
pub fn parse_rfc3339(value: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(value).map(|dt| dt.with_timezone(&Utc))
}

/// Transport that prints each call as a JSON line on stdout.
pub struct StdoutSink;

impl DeliverySink for StdoutSink {
    fn deliver_now(
        &self,
        message_id: &str,
        title: &str,
        body: &str,
        is_critical: bool,
    ) -> Result<(), DeliveryError> {
        println!(
            "{}",
            serde_json::json!({
                "action": "deliver_now",
                "message_id": message_id,
                "title": title,
                "body": body,
                "is_critical": is_critical,
            })
        );
        Ok(())
    }

    fn deliver_at(
        &self,
        message_id: &str,
        title: &str,
        body: &str,
        target_time: DateTime<Utc>,
        reason: &str,
    ) -> Result<(), DeliveryError> {
        println!(
            "{}",
            serde_json::json!({
                "action": "deliver_at",
                "message_id": message_id,
                "title": title,
                "body": body,
                "target_time": target_time.to_rfc3339(),
                "reason": reason,
            })
        );
        Ok(())
    }
}
