//! # Lull Core Library
//!
//! This library provides the core business logic for Lull, a notification
//! triage engine: incoming messages are classified by urgency, and their
//! delivery is timed around the user's calendar occupancy and focus state.
//! All operations are available through a standalone CLI binary; any GUI
//! host is a thin layer over the same core library.
//!
//! ## Architecture
//!
//! - **Strategy Selector**: a pure, total decision table from (priority,
//!   focus, work status) to one of five delay strategies
//! - **Delay Calculator**: turns a deferred strategy into a concrete
//!   wall-clock target, consulting the calendar lazily
//! - **Scheduler**: issues one immutable delivery plan per message and
//!   makes exactly one transport call, with no retries
//! - **Collaborator seams**: classifier, context source, and delivery
//!   sink traits; the engine works against any combination of them
//!
//! ## Key Components
//!
//! - [`TriageEngine`]: the async snapshot-classify-schedule pipeline
//! - [`Scheduler`]: synchronous plan issuing and the pending registry
//! - [`select_strategy`]: the decision table
//! - [`Config`]: application configuration management

pub mod calendar;
pub mod classify;
pub mod context;
pub mod delay;
pub mod deliver;
pub mod engine;
pub mod error;
pub mod events;
pub mod integrations;
pub mod message;
pub mod scheduler;
pub mod storage;
pub mod strategy;

pub use calendar::{CalendarContextSource, CalendarEvent, EventKind};
pub use classify::{Classification, Classifier, FailingClassifier, StaticClassifier};
pub use context::{ContextSnapshot, ContextSource, FixedContext, WorkStatus};
pub use delay::{compute_target, DelayRules};
pub use deliver::{DeliverySink, MemorySink, SinkCall};
pub use engine::TriageEngine;
pub use error::{ClassifyError, ConfigError, DeliveryError, Result, TriageError};
pub use events::Event;
pub use integrations::LlmClassifier;
pub use message::{Message, MessagePriority, MessageState, StateTransitionError, TriagedMessage};
pub use scheduler::{DeliveryOutcome, DeliveryPlan, PendingNotification, ScheduleOutcome, Scheduler};
pub use storage::{data_dir, ClassifierConfig, Config};
pub use strategy::{decide, select_strategy, DelayStrategy, StrategyDecision};
