//! Delivery sink boundary: the local notification transport.
//!
//! Both entry points are synchronous. Registering a notification with the
//! platform is a fast local call; implementations must not block on
//! network I/O. The transport owns firing: a deferred registration fires
//! exactly once at or after its target time, and the core never verifies
//! that it actually did.

use chrono::{DateTime, Utc};
use std::sync::{Arc, Mutex};

use crate::error::DeliveryError;

/// Notification transport.
pub trait DeliverySink: Send + Sync {
    /// Present a notification immediately. `is_critical` marks urgent
    /// traffic that may bypass platform focus filters.
    fn deliver_now(
        &self,
        message_id: &str,
        title: &str,
        body: &str,
        is_critical: bool,
    ) -> Result<(), DeliveryError>;

    /// Register a notification to fire at `target_time`.
    fn deliver_at(
        &self,
        message_id: &str,
        title: &str,
        body: &str,
        target_time: DateTime<Utc>,
        reason: &str,
    ) -> Result<(), DeliveryError>;
}

impl<T: DeliverySink + ?Sized> DeliverySink for Box<T> {
    fn deliver_now(
        &self,
        message_id: &str,
        title: &str,
        body: &str,
        is_critical: bool,
    ) -> Result<(), DeliveryError> {
        (**self).deliver_now(message_id, title, body, is_critical)
    }

    fn deliver_at(
        &self,
        message_id: &str,
        title: &str,
        body: &str,
        target_time: DateTime<Utc>,
        reason: &str,
    ) -> Result<(), DeliveryError> {
        (**self).deliver_at(message_id, title, body, target_time, reason)
    }
}

/// One recorded transport call.
#[derive(Debug, Clone, PartialEq)]
pub enum SinkCall {
    Now {
        message_id: String,
        title: String,
        body: String,
        is_critical: bool,
    },
    At {
        message_id: String,
        title: String,
        body: String,
        target_time: DateTime<Utc>,
        reason: String,
    },
}

impl SinkCall {
    pub fn message_id(&self) -> &str {
        match self {
            SinkCall::Now { message_id, .. } => message_id,
            SinkCall::At { message_id, .. } => message_id,
        }
    }
}

/// In-memory transport that records every call. Used as the test double
/// and as the dry-run transport in the CLI.
///
/// Clones share the same call log, so a handle kept aside observes calls
/// made through the clone handed to the scheduler.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    calls: Arc<Mutex<Vec<SinkCall>>>,
    fail: Arc<Mutex<Option<String>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the recorded calls, in call order.
    pub fn calls(&self) -> Vec<SinkCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Make every subsequent call fail with the given message.
    pub fn fail_with(&self, message: impl Into<String>) {
        *self.fail.lock().unwrap() = Some(message.into());
    }

    /// Clear a previously injected failure.
    pub fn recover(&self) {
        *self.fail.lock().unwrap() = None;
    }

    fn check_failure(&self) -> Result<(), DeliveryError> {
        match self.fail.lock().unwrap().as_ref() {
            Some(message) => Err(DeliveryError::Unavailable(message.clone())),
            None => Ok(()),
        }
    }
}

impl DeliverySink for MemorySink {
    fn deliver_now(
        &self,
        message_id: &str,
        title: &str,
        body: &str,
        is_critical: bool,
    ) -> Result<(), DeliveryError> {
        self.check_failure()?;
        self.calls.lock().unwrap().push(SinkCall::Now {
            message_id: message_id.to_string(),
            title: title.to_string(),
            body: body.to_string(),
            is_critical,
        });
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
        self.check_failure()?;
        self.calls.lock().unwrap().push(SinkCall::At {
            message_id: message_id.to_string(),
            title: title.to_string(),
            body: body.to_string(),
            target_time,
            reason: reason.to_string(),
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn memory_sink_records_calls_in_order() {
        let sink = MemorySink::new();
        sink.deliver_now("m1", "Alice", "hello", false).unwrap();
        sink.deliver_at("m2", "Bob", "later", Utc::now() + Duration::hours(1), "held")
            .unwrap();

        let calls = sink.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].message_id(), "m1");
        assert_eq!(calls[1].message_id(), "m2");
        assert!(matches!(calls[0], SinkCall::Now { .. }));
        assert!(matches!(calls[1], SinkCall::At { .. }));
    }

    #[test]
    fn clones_share_the_call_log() {
        let sink = MemorySink::new();
        let handle = sink.clone();
        sink.deliver_now("m1", "Alice", "hello", true).unwrap();
        assert_eq!(handle.call_count(), 1);
    }

    #[test]
    fn injected_failure_blocks_and_recovers() {
        let sink = MemorySink::new();
        sink.fail_with("transport down");
        let err = sink.deliver_now("m1", "Alice", "hello", false).unwrap_err();
        assert!(err.to_string().contains("transport down"));
        assert_eq!(sink.call_count(), 0);

        sink.recover();
        sink.deliver_now("m1", "Alice", "hello", false).unwrap();
        assert_eq!(sink.call_count(), 1);
    }
}
