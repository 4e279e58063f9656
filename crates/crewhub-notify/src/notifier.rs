//! Fan-out primitive — one notification record per recipient.
//!
//! A failed store write is logged and recorded in the outcome, never
//! raised to the caller: notification delivery can never fail or roll
//! back the business operation that triggered it.

use std::collections::HashSet;
use std::sync::Arc;

use crewhub_core::model::{Notification, Severity};
use crewhub_core::traits::NotificationSink;

/// Result of a fan-out: who got a record, who didn't and why.
/// Callers log it; they never surface it as an error.
#[derive(Debug, Default)]
pub struct FanoutOutcome {
    pub delivered: Vec<Notification>,
    pub failed: Vec<(String, String)>,
}

impl FanoutOutcome {
    /// True when every recipient got a record.
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Stateless fan-out over a notification sink.
#[derive(Clone)]
pub struct Notifier {
    sink: Arc<dyn NotificationSink>,
}

impl Notifier {
    pub fn new(sink: Arc<dyn NotificationSink>) -> Self {
        Self { sink }
    }

    /// Create one notification for one recipient.
    /// Returns None (after logging) if the store write fails.
    pub async fn notify_one(
        &self,
        recipient_id: &str,
        title: &str,
        message: &str,
        severity: Severity,
        link: Option<&str>,
    ) -> Option<Notification> {
        let notification = Notification::new(recipient_id, title, message, severity, link);
        match self.sink.insert(&notification).await {
            Ok(()) => Some(notification),
            Err(e) => {
                tracing::warn!("⚠️ Notification write for {recipient_id} failed: {e}");
                None
            }
        }
    }

    /// Create one notification per distinct recipient.
    ///
    /// An empty recipient set is a no-op returning an empty outcome.
    /// Writes are issued per recipient so one failure cannot abort the
    /// rest of the batch; failures land in `FanoutOutcome::failed`.
    pub async fn notify_many(
        &self,
        recipient_ids: &[String],
        title: &str,
        message: &str,
        severity: Severity,
        link: Option<&str>,
    ) -> FanoutOutcome {
        let mut outcome = FanoutOutcome::default();
        let mut seen = HashSet::new();
        for recipient_id in recipient_ids {
            if !seen.insert(recipient_id.as_str()) {
                continue;
            }
            let notification = Notification::new(recipient_id, title, message, severity, link);
            match self.sink.insert(&notification).await {
                Ok(()) => outcome.delivered.push(notification),
                Err(e) => {
                    tracing::warn!("⚠️ Notification write for {recipient_id} failed: {e}");
                    outcome.failed.push((recipient_id.clone(), e.to_string()));
                }
            }
        }
        outcome
    }
}
