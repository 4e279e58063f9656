//! Condition evaluators — the six reminder queries the scheduler runs.
//!
//! Each evaluator is a fresh full pass over current domain state: no
//! incremental bookkeeping, no suppression of records sent on earlier
//! passes. Per-task evaluators emit one record per (user, entity) pair;
//! digest evaluators group by recipient first and emit one record per
//! user per pass.

use std::collections::HashMap;

use chrono::{DateTime, Datelike, Duration, Local, LocalResult, TimeZone, Utc};

use crewhub_core::error::Result;
use crewhub_core::model::Severity;
use crewhub_store::{DomainStore, TaskRecord};

use crate::notifier::Notifier;

/// The next local-midnight boundary strictly after `now`, in UTC.
/// Day windows ("due soon", "upcoming today") end here.
pub fn next_local_midnight_after(now: DateTime<Utc>) -> DateTime<Utc> {
    let local_day = now.with_timezone(&Local).date_naive();
    for days in 1..=2u64 {
        let Some(day) = local_day.checked_add_days(chrono::Days::new(days)) else {
            continue;
        };
        let Some(naive) = day.and_hms_opt(0, 0, 0) else {
            continue;
        };
        match Local.from_local_datetime(&naive) {
            LocalResult::Single(dt) => return dt.with_timezone(&Utc),
            LocalResult::Ambiguous(dt, _) => return dt.with_timezone(&Utc),
            // Midnight skipped by a DST jump; use the following day.
            LocalResult::None => continue,
        }
    }
    now + Duration::hours(24)
}

fn fmt_date(dt: DateTime<Utc>) -> String {
    let local = dt.with_timezone(&Local);
    format!("{} {}, {}", month_name(local.month()), local.day(), local.year())
}

fn fmt_date_time(dt: DateTime<Utc>) -> String {
    let local = dt.with_timezone(&Local);
    format!(
        "{} {} at {}",
        month_name(local.month()),
        local.day(),
        local.format("%H:%M")
    )
}

fn month_name(month: u32) -> &'static str {
    const NAMES: [&str; 12] = [
        "Jan", "Feb", "Mar", "Apr", "May", "Jun",
        "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
    ];
    NAMES[(month as usize - 1) % 12]
}

fn count_phrase(n: usize, noun: &str) -> String {
    if n == 1 {
        format!("1 {noun}")
    } else {
        format!("{n} {noun}s")
    }
}

fn project_part(record: &TaskRecord) -> String {
    record
        .project_name
        .as_deref()
        .map(|p| format!(" in {p}"))
        .unwrap_or_default()
}

/// Group task records by recipient id.
fn group_by_recipient(tasks: &[TaskRecord]) -> HashMap<&str, Vec<&TaskRecord>> {
    let mut grouped: HashMap<&str, Vec<&TaskRecord>> = HashMap::new();
    for task in tasks {
        for user_id in &task.assignees {
            grouped.entry(user_id.as_str()).or_default().push(task);
        }
    }
    grouped
}

/// Tasks past their due date and still open: one warning per (user, task).
pub async fn check_overdue_tasks(
    domain: &DomainStore,
    notifier: &Notifier,
    now: DateTime<Utc>,
) -> Result<usize> {
    let tasks = domain.overdue_tasks(now)?;
    let mut created = 0;
    for task in &tasks {
        let Some(due) = task.due_date else { continue };
        let message = format!(
            "Task '{}'{} was due {}.",
            task.title,
            project_part(task),
            fmt_date(due)
        );
        let outcome = notifier
            .notify_many(
                &task.assignees,
                "Task overdue",
                &message,
                Severity::Warning,
                Some(&format!("/tasks/{}", task.id)),
            )
            .await;
        created += outcome.delivered.len();
    }
    Ok(created)
}

/// Open tasks due between now and local midnight: one info per (user, task).
pub async fn check_tasks_due_soon(
    domain: &DomainStore,
    notifier: &Notifier,
    now: DateTime<Utc>,
) -> Result<usize> {
    let end = next_local_midnight_after(now);
    let tasks = domain.tasks_due_between(now, end)?;
    let mut created = 0;
    for task in &tasks {
        let Some(due) = task.due_date else { continue };
        let message = format!(
            "Task '{}'{} is due {}.",
            task.title,
            project_part(task),
            fmt_date_time(due)
        );
        let outcome = notifier
            .notify_many(
                &task.assignees,
                "Task due soon",
                &message,
                Severity::Info,
                Some(&format!("/tasks/{}", task.id)),
            )
            .await;
        created += outcome.delivered.len();
    }
    Ok(created)
}

/// Daily digest: pending tasks with a future due date, one summary per user.
pub async fn check_pending_tasks(
    domain: &DomainStore,
    notifier: &Notifier,
    now: DateTime<Utc>,
) -> Result<usize> {
    let tasks = domain.pending_tasks_with_due(now)?;
    let grouped = group_by_recipient(&tasks);
    let mut created = 0;
    for (user_id, user_tasks) in grouped {
        let message = format!(
            "You have {} waiting with an upcoming due date.",
            count_phrase(user_tasks.len(), "pending task")
        );
        if notifier
            .notify_one(user_id, "Daily task digest", &message, Severity::Info, Some("/tasks"))
            .await
            .is_some()
        {
            created += 1;
        }
    }
    Ok(created)
}

/// Daily digest: everything assigned and open, one summary per user.
/// Severity escalates to warning when any of the user's tasks is overdue;
/// the overdue count takes precedence over the due-soon count in the text.
pub async fn check_assigned_tasks(
    domain: &DomainStore,
    notifier: &Notifier,
    now: DateTime<Utc>,
) -> Result<usize> {
    let end_of_day = next_local_midnight_after(now);
    let tasks = domain.assigned_open_tasks()?;
    let grouped = group_by_recipient(&tasks);
    let mut created = 0;
    for (user_id, user_tasks) in grouped {
        let total = user_tasks.len();
        let overdue = user_tasks
            .iter()
            .filter(|t| t.due_date.is_some_and(|due| due < now))
            .count();
        let due_soon = user_tasks
            .iter()
            .filter(|t| t.due_date.is_some_and(|due| due >= now && due <= end_of_day))
            .count();

        let (severity, message) = if overdue > 0 {
            (
                Severity::Warning,
                format!(
                    "You have {} assigned, {overdue} of them overdue.",
                    count_phrase(total, "task")
                ),
            )
        } else if due_soon > 0 {
            (
                Severity::Info,
                format!(
                    "You have {} assigned, {} due before tomorrow.",
                    count_phrase(total, "task"),
                    due_soon
                ),
            )
        } else {
            (
                Severity::Info,
                format!("You have {} assigned.", count_phrase(total, "task")),
            )
        };

        if notifier
            .notify_one(user_id, "Assigned tasks summary", &message, severity, Some("/tasks"))
            .await
            .is_some()
        {
            created += 1;
        }
    }
    Ok(created)
}

/// Events starting before local midnight: broadcast to every user.
pub async fn check_upcoming_events(
    domain: &DomainStore,
    notifier: &Notifier,
    now: DateTime<Utc>,
) -> Result<usize> {
    let end = next_local_midnight_after(now);
    let events = domain.events_between(now, end)?;
    if events.is_empty() {
        return Ok(0);
    }
    let everyone = domain.all_user_ids()?;
    let mut created = 0;
    for event in &events {
        let where_part = if event.is_online {
            format!("on {}", event.online_platform.as_deref().unwrap_or("online platform"))
        } else {
            format!("at {}", event.location.as_deref().unwrap_or("location TBD"))
        };
        let message = format!(
            "Event '{}' starts {} {}.",
            event.title,
            fmt_date_time(event.start_date),
            where_part
        );
        let outcome = notifier
            .notify_many(
                &everyone,
                "Upcoming event",
                &message,
                Severity::Info,
                Some(&format!("/events/{}", event.id)),
            )
            .await;
        created += outcome.delivered.len();
    }
    Ok(created)
}

/// Tasks completed within the last hour: a single success record for the
/// creator, never fanned out to assignees.
pub async fn check_completed_tasks(
    domain: &DomainStore,
    notifier: &Notifier,
    now: DateTime<Utc>,
) -> Result<usize> {
    let tasks = domain.tasks_completed_since(now - Duration::hours(1))?;
    let mut created = 0;
    for task in &tasks {
        let message = format!("Task '{}'{} was completed.", task.title, project_part(task));
        if notifier
            .notify_one(
                &task.creator_id,
                "Task completed",
                &message,
                Severity::Success,
                Some(&format!("/tasks/{}", task.id)),
            )
            .await
            .is_some()
        {
            created += 1;
        }
    }
    Ok(created)
}
