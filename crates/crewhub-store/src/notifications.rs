//! Notification store — durable per-recipient notification records.
//!
//! Creation is append-only and goes through `NotificationSink::insert`
//! (the Notifier is the only producer). Everything else is the accessor
//! surface the user-facing API consumes: list, unread count, mark read,
//! delete.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{Connection, params};
use std::path::Path;
use std::sync::Mutex;

use crewhub_core::error::{CrewHubError, Result};
use crewhub_core::model::{Notification, Severity};
use crewhub_core::traits::NotificationSink;

/// SQLite-backed notification store.
pub struct NotificationStore {
    conn: Mutex<Connection>,
}

impl NotificationStore {
    /// Open the store at the given database path.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = super::db::open(path)?;
        Ok(Self { conn: Mutex::new(conn) })
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| CrewHubError::Store(format!("Lock: {e}")))
    }

    /// List a recipient's notifications, newest first.
    pub fn list_for_user(
        &self,
        user_id: &str,
        unread_only: bool,
        limit: usize,
    ) -> Result<Vec<Notification>> {
        let conn = self.lock()?;
        let sql = if unread_only {
            "SELECT id, recipient_id, title, message, severity, link, read, created_at
             FROM notifications WHERE recipient_id = ?1 AND read = 0
             ORDER BY created_at DESC LIMIT ?2"
        } else {
            "SELECT id, recipient_id, title, message, severity, link, read, created_at
             FROM notifications WHERE recipient_id = ?1
             ORDER BY created_at DESC LIMIT ?2"
        };
        let mut stmt = conn
            .prepare(sql)
            .map_err(|e| CrewHubError::Store(format!("List: {e}")))?;
        let rows = stmt
            .query_map(params![user_id, limit as i64], map_notification_row)
            .map_err(|e| CrewHubError::Store(format!("List: {e}")))?;
        Ok(rows.filter_map(|r| r.ok()).collect())
    }

    /// Unread count — always recomputed from the records, never cached.
    pub fn unread_count(&self, user_id: &str) -> Result<u64> {
        let conn = self.lock()?;
        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM notifications WHERE recipient_id = ?1 AND read = 0",
                params![user_id],
                |r| r.get(0),
            )
            .map_err(|e| CrewHubError::Store(format!("Unread count: {e}")))?;
        Ok(count as u64)
    }

    /// Mark one notification read. Errors if the id does not exist.
    pub fn mark_read(&self, id: &str) -> Result<()> {
        let conn = self.lock()?;
        let changed = conn
            .execute("UPDATE notifications SET read = 1 WHERE id = ?1", params![id])
            .map_err(|e| CrewHubError::Store(format!("Mark read: {e}")))?;
        if changed == 0 {
            return Err(CrewHubError::NotFound(format!("notification {id}")));
        }
        Ok(())
    }

    /// Mark all of a recipient's notifications read. Returns how many changed.
    pub fn mark_all_read(&self, user_id: &str) -> Result<u64> {
        let conn = self.lock()?;
        let changed = conn
            .execute(
                "UPDATE notifications SET read = 1 WHERE recipient_id = ?1 AND read = 0",
                params![user_id],
            )
            .map_err(|e| CrewHubError::Store(format!("Mark all read: {e}")))?;
        Ok(changed as u64)
    }

    /// Delete one notification. Errors if the id does not exist.
    pub fn delete(&self, id: &str) -> Result<()> {
        let conn = self.lock()?;
        let changed = conn
            .execute("DELETE FROM notifications WHERE id = ?1", params![id])
            .map_err(|e| CrewHubError::Store(format!("Delete: {e}")))?;
        if changed == 0 {
            return Err(CrewHubError::NotFound(format!("notification {id}")));
        }
        Ok(())
    }

    /// Delete every record owned by a recipient (user-deletion cascade).
    pub fn delete_for_user(&self, user_id: &str) -> Result<u64> {
        let conn = self.lock()?;
        let changed = conn
            .execute(
                "DELETE FROM notifications WHERE recipient_id = ?1",
                params![user_id],
            )
            .map_err(|e| CrewHubError::Store(format!("Delete for user: {e}")))?;
        Ok(changed as u64)
    }
}

#[async_trait]
impl NotificationSink for NotificationStore {
    async fn insert(&self, n: &Notification) -> Result<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO notifications (id, recipient_id, title, message, severity, link, read, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                n.id,
                n.recipient_id,
                n.title,
                n.message,
                n.severity.as_str(),
                n.link,
                n.read as i32,
                n.created_at.to_rfc3339(),
            ],
        )
        .map_err(|e| CrewHubError::Store(format!("Insert notification: {e}")))?;
        Ok(())
    }
}

fn map_notification_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Notification> {
    let severity: String = row.get(4)?;
    let created_at: String = row.get(7)?;
    Ok(Notification {
        id: row.get(0)?,
        recipient_id: row.get(1)?,
        title: row.get(2)?,
        message: row.get(3)?,
        severity: Severity::parse(&severity),
        link: row.get(5)?,
        read: row.get::<_, i32>(6)? != 0,
        created_at: DateTime::parse_from_rfc3339(&created_at)
            .map(|d| d.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store(name: &str) -> (NotificationStore, std::path::PathBuf) {
        let dir = std::env::temp_dir().join(name);
        std::fs::create_dir_all(&dir).ok();
        let store = NotificationStore::open(&dir.join("test.db")).unwrap();
        (store, dir)
    }

    #[tokio::test]
    async fn test_insert_and_list() {
        let (store, dir) = temp_store("crewhub-notif-insert");
        let n = Notification::new("u1", "Task overdue", "Do it", Severity::Warning, None);
        store.insert(&n).await.unwrap();

        let listed = store.list_for_user("u1", false, 50).unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].title, "Task overdue");
        assert_eq!(listed[0].severity, Severity::Warning);
        assert!(!listed[0].read);

        // Other users see nothing
        assert!(store.list_for_user("u2", false, 50).unwrap().is_empty());
        std::fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn test_unread_count_and_mark_read() {
        let (store, dir) = temp_store("crewhub-notif-read");
        let a = Notification::new("u1", "A", "a", Severity::Info, None);
        let b = Notification::new("u1", "B", "b", Severity::Info, None);
        store.insert(&a).await.unwrap();
        store.insert(&b).await.unwrap();
        assert_eq!(store.unread_count("u1").unwrap(), 2);

        store.mark_read(&a.id).unwrap();
        assert_eq!(store.unread_count("u1").unwrap(), 1);
        assert_eq!(store.list_for_user("u1", true, 50).unwrap().len(), 1);

        assert_eq!(store.mark_all_read("u1").unwrap(), 1);
        assert_eq!(store.unread_count("u1").unwrap(), 0);
        std::fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn test_delete_and_cascade() {
        let (store, dir) = temp_store("crewhub-notif-delete");
        let a = Notification::new("u1", "A", "a", Severity::Info, None);
        let b = Notification::new("u1", "B", "b", Severity::Info, None);
        let c = Notification::new("u2", "C", "c", Severity::Info, None);
        for n in [&a, &b, &c] {
            store.insert(n).await.unwrap();
        }

        store.delete(&a.id).unwrap();
        assert_eq!(store.list_for_user("u1", false, 50).unwrap().len(), 1);
        assert!(store.delete(&a.id).is_err()); // already gone

        assert_eq!(store.delete_for_user("u1").unwrap(), 1);
        assert!(store.list_for_user("u1", false, 50).unwrap().is_empty());
        assert_eq!(store.list_for_user("u2", false, 50).unwrap().len(), 1);
        std::fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn test_mark_read_unknown_id() {
        let (store, dir) = temp_store("crewhub-notif-unknown");
        assert!(store.mark_read("nope").is_err());
        std::fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn test_list_limit() {
        let (store, dir) = temp_store("crewhub-notif-limit");
        for i in 0..5 {
            let n = Notification::new("u1", &format!("N{i}"), "x", Severity::Info, None);
            store.insert(&n).await.unwrap();
        }
        assert_eq!(store.list_for_user("u1", false, 3).unwrap().len(), 3);
        std::fs::remove_dir_all(&dir).ok();
    }
}
