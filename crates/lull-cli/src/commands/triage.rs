use std::path::PathBuf;

use clap::Args;
use lull_core::{
    CalendarContextSource, CalendarEvent, Classifier, Config, ContextSource, DeliverySink,
    FixedContext, LlmClassifier, MemorySink, Message, MessagePriority, SinkCall, StaticClassifier,
    TriageEngine, WorkStatus,
};

use crate::common::{parse_rfc3339, StdoutSink, PRIORITY_LABELS, STATUS_LABELS};

#[derive(Args)]
pub struct TriageArgs {
    /// Notification title
    #[arg(long)]
    pub title: String,
    /// Notification body
    #[arg(long, default_value = "")]
    pub body: String,
    /// Originating app or channel
    #[arg(long)]
    pub source: Option<String>,
    /// Skip the classifier and use this priority
    #[arg(long, value_parser = PRIORITY_LABELS)]
    pub priority: Option<String>,
    /// Calendar events file (JSON array) to derive context from
    #[arg(long)]
    pub calendar: Option<PathBuf>,
    /// Work status when no calendar file is given
    #[arg(long, value_parser = STATUS_LABELS, default_value = "unknown")]
    pub status: String,
    /// Focus session active
    #[arg(long)]
    pub focused: bool,
    /// Next free slot, RFC 3339, when no calendar file is given
    #[arg(long)]
    pub next_free: Option<String>,
    /// Record transport calls instead of delivering to stdout
    #[arg(long)]
    pub dry_run: bool,
}

pub fn run(args: TriageArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load_or_default();

    let classifier: Box<dyn Classifier> = match &args.priority {
        Some(label) => Box::new(StaticClassifier::new(
            MessagePriority::from_label(label).unwrap_or_default(),
        )),
        None => Box::new(LlmClassifier::from_config(&config.classifier)?),
    };

    let context: Box<dyn ContextSource> = match &args.calendar {
        Some(path) => {
            let text = std::fs::read_to_string(path)?;
            let events: Vec<CalendarEvent> = serde_json::from_str(&text)?;
            Box::new(CalendarContextSource::new(events, args.focused))
        }
        None => {
            let status = WorkStatus::from_label(&args.status).unwrap_or_default();
            let mut fixed = FixedContext::new(status, args.focused);
            if let Some(value) = &args.next_free {
                fixed = fixed.with_next_free(parse_rfc3339(value)?);
            }
            Box::new(fixed)
        }
    };

    let recorder = MemorySink::new();
    let handle = recorder.clone();
    let sink: Box<dyn DeliverySink> = if args.dry_run {
        Box::new(recorder)
    } else {
        Box::new(StdoutSink)
    };

    let mut message = Message::new(args.title, args.body);
    if let Some(source) = args.source {
        message = message.with_source(source);
    }

    let mut engine = TriageEngine::with_rules(classifier, context, sink, config.delays);
    let runtime = tokio::runtime::Runtime::new()?;
    let plan = runtime.block_on(engine.process(message))?;

    println!("{}", serde_json::to_string_pretty(&plan)?);

    let pending = engine.pending();
    if !pending.is_empty() {
        println!("{}", serde_json::to_string_pretty(&pending)?);
    }
    for event in engine.drain_events() {
        println!("{}", serde_json::to_string(&event)?);
    }

    if args.dry_run {
        for call in handle.calls() {
            let line = match call {
                SinkCall::Now {
                    message_id,
                    title,
                    is_critical,
                    ..
                } => serde_json::json!({
                    "action": "deliver_now",
                    "message_id": message_id,
                    "title": title,
                    "is_critical": is_critical,
                }),
                SinkCall::At {
                    message_id,
                    title,
                    target_time,
                    reason,
                    ..
                } => serde_json::json!({
                    "action": "deliver_at",
                    "message_id": message_id,
                    "title": title,
                    "target_time": target_time.to_rfc3339(),
                    "reason": reason,
                }),
            };
            println!("{line}");
        }
    }
    Ok(())
}
