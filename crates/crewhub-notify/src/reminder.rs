//! Reminder scheduler — two periodic cycles over the condition evaluators.
//!
//! Short cycle: overdue / due-soon / upcoming-events / completed sweeps on
//! a fixed interval, first fired after a short warm-up. Daily cycle: the
//! pending and assigned digests at each local midnight, plus one
//! best-effort early run shortly after boot so fresh deploys don't wait a
//! day for their first digest.
//!
//! Runs are awaited inside their loop, so a slow sweep delays the next
//! fire instead of stacking a concurrent one. The two cycles are
//! independent tasks and may overlap each other.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crewhub_core::config::ReminderConfig;
use crewhub_core::error::Result;
use crewhub_store::DomainStore;

use crate::checks;
use crate::notifier::Notifier;

/// Owns the two cycle tasks. `start` spawns them, `stop` aborts them;
/// dropping the scheduler also stops both cycles.
pub struct ReminderScheduler {
    domain: Arc<DomainStore>,
    notifier: Notifier,
    config: ReminderConfig,
    handles: Vec<JoinHandle<()>>,
}

impl ReminderScheduler {
    pub fn new(domain: Arc<DomainStore>, notifier: Notifier, config: ReminderConfig) -> Self {
        Self {
            domain,
            notifier,
            config,
            handles: Vec::new(),
        }
    }

    /// Spawn both cycles. Idempotent while running.
    pub fn start(&mut self) {
        if !self.config.enabled {
            tracing::info!("⏸ Reminder scheduler disabled by config");
            return;
        }
        if !self.handles.is_empty() {
            return;
        }

        let interval = Duration::from_secs(self.config.check_interval_mins * 60);
        let warmup = Duration::from_secs(self.config.warmup_secs);
        let early = Duration::from_secs(self.config.daily_early_run_secs);
        tracing::info!(
            "⏰ Reminder scheduler started (sweep every {} min, digests at local midnight)",
            self.config.check_interval_mins
        );

        let domain = self.domain.clone();
        let notifier = self.notifier.clone();
        self.handles.push(tokio::spawn(async move {
            tokio::time::sleep(warmup).await;
            run_short_cycle(&domain, &notifier).await;

            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately; the cadence starts here.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                run_short_cycle(&domain, &notifier).await;
            }
        }));

        let domain = self.domain.clone();
        let notifier = self.notifier.clone();
        self.handles.push(tokio::spawn(async move {
            tokio::time::sleep(early).await;
            run_daily_cycle(&domain, &notifier).await;

            loop {
                let now = Utc::now();
                let midnight = checks::next_local_midnight_after(now);
                let wait = (midnight - now)
                    .to_std()
                    .unwrap_or(Duration::from_secs(60));
                tokio::time::sleep(wait).await;
                run_daily_cycle(&domain, &notifier).await;
            }
        }));
    }

    /// Abort both cycle tasks.
    pub fn stop(&mut self) {
        if self.handles.is_empty() {
            return;
        }
        for handle in self.handles.drain(..) {
            handle.abort();
        }
        tracing::info!("🛑 Reminder scheduler stopped");
    }

    pub fn is_running(&self) -> bool {
        !self.handles.is_empty()
    }
}

impl Drop for ReminderScheduler {
    fn drop(&mut self) {
        for handle in self.handles.drain(..) {
            handle.abort();
        }
    }
}

/// One short-cycle sweep. Every check runs even if an earlier one fails.
pub async fn run_short_cycle(domain: &DomainStore, notifier: &Notifier) {
    let now = Utc::now();
    log_check("overdue tasks", checks::check_overdue_tasks(domain, notifier, now).await);
    log_check("tasks due soon", checks::check_tasks_due_soon(domain, notifier, now).await);
    log_check("upcoming events", checks::check_upcoming_events(domain, notifier, now).await);
    log_check("completed tasks", checks::check_completed_tasks(domain, notifier, now).await);
}

/// One daily-cycle sweep.
pub async fn run_daily_cycle(domain: &DomainStore, notifier: &Notifier) {
    let now = Utc::now();
    log_check("pending task digest", checks::check_pending_tasks(domain, notifier, now).await);
    log_check("assigned task digest", checks::check_assigned_tasks(domain, notifier, now).await);
}

fn log_check(name: &str, result: Result<usize>) {
    match result {
        Ok(0) => tracing::debug!("{name}: nothing to notify"),
        Ok(n) => tracing::info!("🔔 {name}: {n} notification(s) created"),
        Err(e) => tracing::warn!("⚠️ Reminder check '{name}' failed: {e}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;
    use crewhub_core::model::{Task, TaskStatus};
    use crewhub_store::NotificationStore;

    fn temp_stores(name: &str) -> (Arc<DomainStore>, Arc<NotificationStore>, std::path::PathBuf) {
        let dir = std::env::temp_dir().join(name);
        std::fs::create_dir_all(&dir).ok();
        let path = dir.join("test.db");
        (
            Arc::new(DomainStore::open(&path).unwrap()),
            Arc::new(NotificationStore::open(&path).unwrap()),
            dir,
        )
    }

    #[tokio::test]
    async fn test_start_stop_lifecycle() {
        let (domain, store, dir) = temp_stores("crewhub-reminder-lifecycle");
        let mut scheduler =
            ReminderScheduler::new(domain, Notifier::new(store), ReminderConfig::default());

        assert!(!scheduler.is_running());
        scheduler.start();
        assert!(scheduler.is_running());
        scheduler.start(); // idempotent
        assert!(scheduler.is_running());
        scheduler.stop();
        assert!(!scheduler.is_running());
        std::fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn test_disabled_scheduler_spawns_nothing() {
        let (domain, store, dir) = temp_stores("crewhub-reminder-disabled");
        let config = ReminderConfig {
            enabled: false,
            ..ReminderConfig::default()
        };
        let mut scheduler = ReminderScheduler::new(domain, Notifier::new(store), config);
        scheduler.start();
        assert!(!scheduler.is_running());
        std::fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn test_short_cycle_end_to_end() {
        let (domain, store, dir) = temp_stores("crewhub-reminder-cycle");
        let mut task = Task::new("Late task", "creator");
        task.due_date = Some(Utc::now() - ChronoDuration::days(1));
        task.status = TaskStatus::Pending;
        domain.insert_task(&task, &["u1".into()]).unwrap();

        run_short_cycle(&domain, &Notifier::new(store.clone())).await;

        let got = store.list_for_user("u1", false, 50).unwrap();
        assert_eq!(got.len(), 1);
        assert_eq!(got[0].title, "Task overdue");
        std::fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn test_daily_cycle_end_to_end() {
        let (domain, store, dir) = temp_stores("crewhub-reminder-daily");
        let mut task = Task::new("Plan sprint", "creator");
        task.due_date = Some(Utc::now() + ChronoDuration::days(2));
        task.status = TaskStatus::Pending;
        domain.insert_task(&task, &["u1".into()]).unwrap();

        run_daily_cycle(&domain, &Notifier::new(store.clone())).await;

        let got = store.list_for_user("u1", false, 50).unwrap();
        // Pending digest + assigned digest, one record each.
        assert_eq!(got.len(), 2);
        std::fs::remove_dir_all(&dir).ok();
    }
}
