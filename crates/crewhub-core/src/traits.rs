//! Store-facing traits. The Notifier fans out through `NotificationSink`
//! so delivery can be tested without a real database.

use async_trait::async_trait;

use crate::error::Result;
use crate::model::Notification;

/// Durable destination for notification records.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    /// Append one notification record. Creation is append-only; a failed
    /// insert must not leave a partial record behind.
    async fn insert(&self, notification: &Notification) -> Result<()>;
}
