//! Database bootstrap — open the CrewHub SQLite file and run migrations.
//!
//! All timestamps are stored as RFC 3339 TEXT in UTC. The notification
//! store and the domain store each hold their own connection to the same
//! file; WAL mode keeps concurrent readers cheap.

use rusqlite::Connection;
use std::path::Path;

use crewhub_core::error::{CrewHubError, Result};

/// Open (or create) the database at `path` and ensure the schema exists.
pub fn open(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let conn = Connection::open(path)
        .map_err(|e| CrewHubError::Store(format!("DB open: {e}")))?;

    // WAL mode for better concurrent read performance
    conn.execute_batch("PRAGMA journal_mode=WAL;").ok();

    migrate(&conn)?;
    tracing::debug!("💾 Database ready at {}", path.display());
    Ok(conn)
}

/// Run migrations to create tables.
fn migrate(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS users (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            email TEXT,
            created_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS projects (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            creator_id TEXT NOT NULL,
            created_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS tasks (
            id TEXT PRIMARY KEY,
            project_id TEXT,
            title TEXT NOT NULL,
            description TEXT NOT NULL DEFAULT '',
            due_date TEXT,
            status TEXT NOT NULL DEFAULT 'pending',
            creator_id TEXT NOT NULL,
            assignee_id TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        -- Multi-assignee set; tasks.assignee_id is the optional primary
        -- assignee kept alongside it.
        CREATE TABLE IF NOT EXISTS task_assignees (
            task_id TEXT NOT NULL,
            user_id TEXT NOT NULL,
            PRIMARY KEY (task_id, user_id)
        );

        CREATE TABLE IF NOT EXISTS events (
            id TEXT PRIMARY KEY,
            project_id TEXT,
            title TEXT NOT NULL,
            start_date TEXT NOT NULL,
            is_online INTEGER NOT NULL DEFAULT 0,
            online_platform TEXT,
            location TEXT,
            creator_id TEXT NOT NULL,
            created_at TEXT NOT NULL
        );

        -- Per-recipient notification records. Append-only except for the
        -- read flag; deleted only by recipient action or user cascade.
        CREATE TABLE IF NOT EXISTS notifications (
            id TEXT PRIMARY KEY,
            recipient_id TEXT NOT NULL,
            title TEXT NOT NULL,
            message TEXT NOT NULL,
            severity TEXT NOT NULL DEFAULT 'info',
            link TEXT,
            read INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_notifications_recipient
            ON notifications(recipient_id, read);
        CREATE INDEX IF NOT EXISTS idx_tasks_status_due
            ON tasks(status, due_date);
        CREATE INDEX IF NOT EXISTS idx_events_start
            ON events(start_date);
        ",
    )
    .map_err(|e| CrewHubError::Store(format!("Migration: {e}")))?;

    Ok(())
}
