//! Domain store — the read side the reminder sweeps evaluate, plus the
//! thin CRUD writes collaborators and tests use to populate state.
//!
//! Every query resolves assignee identities (union of the assignee set
//! and the optional primary assignee) and the project name, so the
//! evaluators never issue follow-up lookups per task.

use chrono::{DateTime, Utc};
use rusqlite::{Connection, params};
use std::path::Path;
use std::sync::Mutex;

use crewhub_core::error::{CrewHubError, Result};
use crewhub_core::model::{Event, Project, Task, TaskStatus, User};

/// A task with resolved assignees and project name.
#[derive(Debug, Clone)]
pub struct TaskRecord {
    pub id: String,
    pub title: String,
    pub due_date: Option<DateTime<Utc>>,
    pub status: TaskStatus,
    pub creator_id: String,
    pub project_name: Option<String>,
    /// Union of the assignee set and the primary assignee, deduplicated.
    pub assignees: Vec<String>,
}

/// An event with resolved project name.
#[derive(Debug, Clone)]
pub struct EventRecord {
    pub id: String,
    pub title: String,
    pub start_date: DateTime<Utc>,
    pub is_online: bool,
    pub online_platform: Option<String>,
    pub location: Option<String>,
    pub creator_id: String,
    pub project_name: Option<String>,
}

/// SQLite-backed domain store.
pub struct DomainStore {
    conn: Mutex<Connection>,
}

const TASK_SELECT: &str = "SELECT t.id, t.title, t.due_date, t.status, t.creator_id, t.assignee_id, p.name
     FROM tasks t LEFT JOIN projects p ON p.id = t.project_id";

impl DomainStore {
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

    // ─── Evaluator queries ──────────────────────────────────────

    /// Open tasks whose due date has passed.
    pub fn overdue_tasks(&self, now: DateTime<Utc>) -> Result<Vec<TaskRecord>> {
        let conn = self.lock()?;
        let sql = format!(
            "{TASK_SELECT} WHERE t.status IN ('pending', 'in_progress')
             AND t.due_date IS NOT NULL AND t.due_date < ?1"
        );
        collect_tasks(&conn, &sql, params![now.to_rfc3339()])
    }

    /// Open tasks due within [start, end] (both inclusive).
    pub fn tasks_due_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<TaskRecord>> {
        let conn = self.lock()?;
        let sql = format!(
            "{TASK_SELECT} WHERE t.status IN ('pending', 'in_progress')
             AND t.due_date IS NOT NULL AND t.due_date >= ?1 AND t.due_date <= ?2"
        );
        collect_tasks(&conn, &sql, params![start.to_rfc3339(), end.to_rfc3339()])
    }

    /// Pending tasks with a due date still in the future.
    pub fn pending_tasks_with_due(&self, now: DateTime<Utc>) -> Result<Vec<TaskRecord>> {
        let conn = self.lock()?;
        let sql = format!(
            "{TASK_SELECT} WHERE t.status = 'pending'
             AND t.due_date IS NOT NULL AND t.due_date > ?1"
        );
        collect_tasks(&conn, &sql, params![now.to_rfc3339()])
    }

    /// Open tasks that have at least one assignee.
    pub fn assigned_open_tasks(&self) -> Result<Vec<TaskRecord>> {
        let conn = self.lock()?;
        let sql = format!("{TASK_SELECT} WHERE t.status IN ('pending', 'in_progress')");
        let tasks = collect_tasks(&conn, &sql, params![])?;
        Ok(tasks.into_iter().filter(|t| !t.assignees.is_empty()).collect())
    }

    /// Tasks completed (status flipped) at or after `cutoff`.
    pub fn tasks_completed_since(&self, cutoff: DateTime<Utc>) -> Result<Vec<TaskRecord>> {
        let conn = self.lock()?;
        let sql = format!(
            "{TASK_SELECT} WHERE t.status = 'completed' AND t.updated_at >= ?1"
        );
        collect_tasks(&conn, &sql, params![cutoff.to_rfc3339()])
    }

    /// Events starting within [start, end).
    pub fn events_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<EventRecord>> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare(
                "SELECT e.id, e.title, e.start_date, e.is_online, e.online_platform,
                        e.location, e.creator_id, p.name
                 FROM events e LEFT JOIN projects p ON p.id = e.project_id
                 WHERE e.start_date >= ?1 AND e.start_date < ?2",
            )
            .map_err(|e| CrewHubError::Store(format!("Events query: {e}")))?;
        let rows = stmt
            .query_map(params![start.to_rfc3339(), end.to_rfc3339()], |row| {
                let start_date: String = row.get(2)?;
                Ok(EventRecord {
                    id: row.get(0)?,
                    title: row.get(1)?,
                    start_date: parse_ts(&start_date),
                    is_online: row.get::<_, i32>(3)? != 0,
                    online_platform: row.get(4)?,
                    location: row.get(5)?,
                    creator_id: row.get(6)?,
                    project_name: row.get(7)?,
                })
            })
            .map_err(|e| CrewHubError::Store(format!("Events query: {e}")))?;
        Ok(rows.filter_map(|r| r.ok()).collect())
    }

    /// Resolve a user's display name.
    pub fn user_name(&self, id: &str) -> Result<Option<String>> {
        let conn = self.lock()?;
        let name = conn
            .query_row("SELECT name FROM users WHERE id = ?1", params![id], |r| r.get(0))
            .ok();
        Ok(name)
    }

    /// Enumerate all user ids (for broadcast notifications).
    pub fn all_user_ids(&self) -> Result<Vec<String>> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare("SELECT id FROM users ORDER BY created_at")
            .map_err(|e| CrewHubError::Store(format!("Users query: {e}")))?;
        let rows = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .map_err(|e| CrewHubError::Store(format!("Users query: {e}")))?;
        Ok(rows.filter_map(|r| r.ok()).collect())
    }

    // ─── Collaborator writes ──────────────────────────────────────

    /// Insert a user.
    pub fn insert_user(&self, user: &User) -> Result<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO users (id, name, email, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![user.id, user.name, user.email, user.created_at.to_rfc3339()],
        )
        .map_err(|e| CrewHubError::Store(format!("Insert user: {e}")))?;
        Ok(())
    }

    /// Insert a project.
    pub fn insert_project(&self, project: &Project) -> Result<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO projects (id, name, creator_id, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![
                project.id,
                project.name,
                project.creator_id,
                project.created_at.to_rfc3339()
            ],
        )
        .map_err(|e| CrewHubError::Store(format!("Insert project: {e}")))?;
        Ok(())
    }

    /// Insert a task together with its assignee set.
    pub fn insert_task(&self, task: &Task, assignees: &[String]) -> Result<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO tasks (id, project_id, title, description, due_date, status,
                                creator_id, assignee_id, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                task.id,
                task.project_id,
                task.title,
                task.description,
                task.due_date.map(|d| d.to_rfc3339()),
                task.status.as_str(),
                task.creator_id,
                task.assignee_id,
                task.created_at.to_rfc3339(),
                task.updated_at.to_rfc3339(),
            ],
        )
        .map_err(|e| CrewHubError::Store(format!("Insert task: {e}")))?;
        for user_id in assignees {
            conn.execute(
                "INSERT OR IGNORE INTO task_assignees (task_id, user_id) VALUES (?1, ?2)",
                params![task.id, user_id],
            )
            .map_err(|e| CrewHubError::Store(format!("Insert assignee: {e}")))?;
        }
        Ok(())
    }

    /// Insert an event.
    pub fn insert_event(&self, event: &Event) -> Result<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO events (id, project_id, title, start_date, is_online,
                                 online_platform, location, creator_id, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                event.id,
                event.project_id,
                event.title,
                event.start_date.to_rfc3339(),
                event.is_online as i32,
                event.online_platform,
                event.location,
                event.creator_id,
                event.created_at.to_rfc3339(),
            ],
        )
        .map_err(|e| CrewHubError::Store(format!("Insert event: {e}")))?;
        Ok(())
    }

    /// Update a task's status and bump its updated_at stamp.
    pub fn set_task_status(&self, task_id: &str, status: TaskStatus) -> Result<()> {
        let conn = self.lock()?;
        let changed = conn
            .execute(
                "UPDATE tasks SET status = ?1, updated_at = ?2 WHERE id = ?3",
                params![status.as_str(), Utc::now().to_rfc3339(), task_id],
            )
            .map_err(|e| CrewHubError::Store(format!("Set status: {e}")))?;
        if changed == 0 {
            return Err(CrewHubError::NotFound(format!("task {task_id}")));
        }
        Ok(())
    }

    /// Replace a task's assignee set.
    pub fn set_task_assignees(&self, task_id: &str, assignees: &[String]) -> Result<()> {
        let conn = self.lock()?;
        conn.execute(
            "DELETE FROM task_assignees WHERE task_id = ?1",
            params![task_id],
        )
        .map_err(|e| CrewHubError::Store(format!("Clear assignees: {e}")))?;
        for user_id in assignees {
            conn.execute(
                "INSERT OR IGNORE INTO task_assignees (task_id, user_id) VALUES (?1, ?2)",
                params![task_id, user_id],
            )
            .map_err(|e| CrewHubError::Store(format!("Insert assignee: {e}")))?;
        }
        conn.execute(
            "UPDATE tasks SET updated_at = ?1 WHERE id = ?2",
            params![Utc::now().to_rfc3339(), task_id],
        )
        .map_err(|e| CrewHubError::Store(format!("Touch task: {e}")))?;
        Ok(())
    }

    /// Delete a user and their assignee rows. The caller cascades the
    /// user's notifications through the notification store.
    pub fn delete_user(&self, user_id: &str) -> Result<()> {
        let conn = self.lock()?;
        conn.execute("DELETE FROM task_assignees WHERE user_id = ?1", params![user_id])
            .map_err(|e| CrewHubError::Store(format!("Delete assignee rows: {e}")))?;
        conn.execute("DELETE FROM users WHERE id = ?1", params![user_id])
            .map_err(|e| CrewHubError::Store(format!("Delete user: {e}")))?;
        Ok(())
    }
}

fn parse_ts(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|d| d.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

fn collect_tasks(
    conn: &Connection,
    sql: &str,
    sql_params: impl rusqlite::Params,
) -> Result<Vec<TaskRecord>> {
    let mut stmt = conn
        .prepare(sql)
        .map_err(|e| CrewHubError::Store(format!("Task query: {e}")))?;
    let raw: Vec<(String, String, Option<String>, String, String, Option<String>, Option<String>)> =
        stmt.query_map(sql_params, |row| {
            Ok((
                row.get(0)?,
                row.get(1)?,
                row.get(2)?,
                row.get(3)?,
                row.get(4)?,
                row.get(5)?,
                row.get(6)?,
            ))
        })
        .map_err(|e| CrewHubError::Store(format!("Task query: {e}")))?
        .filter_map(|r| r.ok())
        .collect();

    let mut records = Vec::with_capacity(raw.len());
    for (id, title, due_date, status, creator_id, assignee_id, project_name) in raw {
        let mut assignees = task_assignees(conn, &id)?;
        if let Some(primary) = assignee_id
            && !assignees.contains(&primary)
        {
            assignees.push(primary);
        }
        records.push(TaskRecord {
            id,
            title,
            due_date: due_date.as_deref().map(parse_ts),
            status: TaskStatus::parse(&status),
            creator_id,
            project_name,
            assignees,
        });
    }
    Ok(records)
}

fn task_assignees(conn: &Connection, task_id: &str) -> Result<Vec<String>> {
    let mut stmt = conn
        .prepare("SELECT user_id FROM task_assignees WHERE task_id = ?1 ORDER BY user_id")
        .map_err(|e| CrewHubError::Store(format!("Assignee query: {e}")))?;
    let rows = stmt
        .query_map(params![task_id], |row| row.get::<_, String>(0))
        .map_err(|e| CrewHubError::Store(format!("Assignee query: {e}")))?;
    Ok(rows.filter_map(|r| r.ok()).collect())
}
