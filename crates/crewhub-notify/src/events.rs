//! Event-triggered notifications — invoked by business operations right
//! after their domain write commits.
//!
//! `handle` is infallible at its signature: anything that goes wrong in
//! here is logged, and the triggering operation already succeeded by the
//! time we run.

use std::collections::HashSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crewhub_core::error::Result;
use crewhub_core::model::Severity;
use crewhub_store::DomainStore;

use crate::notifier::{FanoutOutcome, Notifier};

/// A committed domain write that fans out to other users.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum DomainEvent {
    ProjectCreated {
        project_id: String,
        name: String,
        actor_id: String,
    },
    TaskCreated {
        task_id: String,
        title: String,
        actor_id: String,
        assignees: Vec<String>,
    },
    /// Assignee set changed; only the newly-added delta is notified.
    TaskAssigneesChanged {
        task_id: String,
        title: String,
        actor_id: String,
        previous: Vec<String>,
        current: Vec<String>,
    },
    EventCreated {
        event_id: String,
        title: String,
        actor_id: String,
    },
    ChatMessageSent {
        actor_id: String,
    },
}

impl DomainEvent {
    fn kind(&self) -> &'static str {
        match self {
            DomainEvent::ProjectCreated { .. } => "project_created",
            DomainEvent::TaskCreated { .. } => "task_created",
            DomainEvent::TaskAssigneesChanged { .. } => "task_assignees_changed",
            DomainEvent::EventCreated { .. } => "event_created",
            DomainEvent::ChatMessageSent { .. } => "chat_message_sent",
        }
    }
}

/// Fan-out for committed domain events.
pub struct EventNotifier {
    domain: Arc<DomainStore>,
    notifier: Notifier,
}

impl EventNotifier {
    pub fn new(domain: Arc<DomainStore>, notifier: Notifier) -> Self {
        Self { domain, notifier }
    }

    /// Notify the affected users about a committed event. Best-effort:
    /// failures are logged and swallowed so the caller's operation is
    /// never affected.
    pub async fn handle(&self, event: DomainEvent) {
        let kind = event.kind();
        match self.dispatch(event).await {
            Ok(outcome) => {
                if !outcome.is_clean() {
                    tracing::warn!(
                        "⚠️ {kind}: {} of {} notification writes failed",
                        outcome.failed.len(),
                        outcome.failed.len() + outcome.delivered.len()
                    );
                } else {
                    tracing::debug!("📬 {kind}: {} notification(s) created", outcome.delivered.len());
                }
            }
            Err(e) => tracing::warn!("⚠️ Notification fan-out for {kind} failed: {e}"),
        }
    }

    async fn dispatch(&self, event: DomainEvent) -> Result<FanoutOutcome> {
        match event {
            DomainEvent::ProjectCreated { project_id, name, actor_id } => {
                let actor = self.actor_name(&actor_id)?;
                let recipients = self.all_users_except(&actor_id)?;
                let message = format!("{actor} created the project '{name}'.");
                Ok(self
                    .notifier
                    .notify_many(
                        &recipients,
                        "New project",
                        &message,
                        Severity::Info,
                        Some(&format!("/projects/{project_id}")),
                    )
                    .await)
            }
            DomainEvent::TaskCreated { task_id, title, actor_id, assignees } => {
                let actor = self.actor_name(&actor_id)?;
                let recipients = except(&assignees, &actor_id);
                let message = format!("{actor} assigned you the task '{title}'.");
                Ok(self
                    .notifier
                    .notify_many(
                        &recipients,
                        "New task assigned to you",
                        &message,
                        Severity::Info,
                        Some(&format!("/tasks/{task_id}")),
                    )
                    .await)
            }
            DomainEvent::TaskAssigneesChanged { task_id, title, actor_id, previous, current } => {
                let actor = self.actor_name(&actor_id)?;
                let before: HashSet<&str> = previous.iter().map(|s| s.as_str()).collect();
                let added: Vec<String> = current
                    .iter()
                    .filter(|id| !before.contains(id.as_str()) && **id != actor_id)
                    .cloned()
                    .collect();
                let message = format!("{actor} added you to the task '{title}'.");
                Ok(self
                    .notifier
                    .notify_many(
                        &added,
                        "New task assigned to you",
                        &message,
                        Severity::Info,
                        Some(&format!("/tasks/{task_id}")),
                    )
                    .await)
            }
            DomainEvent::EventCreated { event_id, title, actor_id } => {
                let actor = self.actor_name(&actor_id)?;
                let recipients = self.all_users_except(&actor_id)?;
                let message = format!("{actor} scheduled the event '{title}'.");
                Ok(self
                    .notifier
                    .notify_many(
                        &recipients,
                        "New event",
                        &message,
                        Severity::Info,
                        Some(&format!("/events/{event_id}")),
                    )
                    .await)
            }
            DomainEvent::ChatMessageSent { actor_id } => {
                let actor = self.actor_name(&actor_id)?;
                let recipients = self.all_users_except(&actor_id)?;
                let message = format!("{actor} sent a message in the team chat.");
                Ok(self
                    .notifier
                    .notify_many(
                        &recipients,
                        "New message",
                        &message,
                        Severity::Info,
                        Some("/chat"),
                    )
                    .await)
            }
        }
    }

    fn actor_name(&self, actor_id: &str) -> Result<String> {
        Ok(self
            .domain
            .user_name(actor_id)?
            .unwrap_or_else(|| "Someone".to_string()))
    }

    fn all_users_except(&self, actor_id: &str) -> Result<Vec<String>> {
        let mut users = self.domain.all_user_ids()?;
        users.retain(|id| id != actor_id);
        Ok(users)
    }
}

fn except(ids: &[String], excluded: &str) -> Vec<String> {
    ids.iter().filter(|id| *id != excluded).cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crewhub_core::model::User;
    use crewhub_store::NotificationStore;

    struct Fixture {
        domain: Arc<DomainStore>,
        store: Arc<NotificationStore>,
        dir: std::path::PathBuf,
    }

    impl Fixture {
        fn new(name: &str) -> Self {
            let dir = std::env::temp_dir().join(name);
            std::fs::create_dir_all(&dir).ok();
            let path = dir.join("test.db");
            let domain = Arc::new(DomainStore::open(&path).unwrap());
            let store = Arc::new(NotificationStore::open(&path).unwrap());
            Self { domain, store, dir }
        }

        fn notifier(&self) -> EventNotifier {
            EventNotifier::new(self.domain.clone(), Notifier::new(self.store.clone()))
        }

        fn add_user(&self, name: &str) -> String {
            let user = User::new(name);
            self.domain.insert_user(&user).unwrap();
            user.id
        }
    }

    impl Drop for Fixture {
        fn drop(&mut self) {
            std::fs::remove_dir_all(&self.dir).ok();
        }
    }

    #[tokio::test]
    async fn test_project_created_notifies_everyone_but_creator() {
        let fx = Fixture::new("crewhub-events-project");
        let creator = fx.add_user("Alice");
        let others = [fx.add_user("Bob"), fx.add_user("Cid"), fx.add_user("Dee")];

        fx.notifier()
            .handle(DomainEvent::ProjectCreated {
                project_id: "p1".into(),
                name: "Apollo".into(),
                actor_id: creator.clone(),
            })
            .await;

        assert!(fx.store.list_for_user(&creator, false, 50).unwrap().is_empty());
        for id in &others {
            let got = fx.store.list_for_user(id, false, 50).unwrap();
            assert_eq!(got.len(), 1);
            assert!(got[0].message.contains("Alice"));
            assert!(got[0].message.contains("Apollo"));
            assert_eq!(got[0].link.as_deref(), Some("/projects/p1"));
        }
    }

    #[tokio::test]
    async fn test_assignee_delta_only() {
        let fx = Fixture::new("crewhub-events-delta");
        let u1 = fx.add_user("Uma");
        let u2 = fx.add_user("Vik");
        let u3 = fx.add_user("Wes");

        fx.notifier()
            .handle(DomainEvent::TaskAssigneesChanged {
                task_id: "t1".into(),
                title: "Write report".into(),
                actor_id: u1.clone(),
                previous: vec![u1.clone()],
                current: vec![u1.clone(), u2.clone(), u3.clone()],
            })
            .await;

        assert!(fx.store.list_for_user(&u1, false, 50).unwrap().is_empty());
        for id in [&u2, &u3] {
            let got = fx.store.list_for_user(id, false, 50).unwrap();
            assert_eq!(got.len(), 1);
            assert_eq!(got[0].link.as_deref(), Some("/tasks/t1"));
        }
    }

    #[tokio::test]
    async fn test_task_created_excludes_creator_from_assignees() {
        let fx = Fixture::new("crewhub-events-taskcreate");
        let creator = fx.add_user("Ana");
        let assignee = fx.add_user("Ben");

        fx.notifier()
            .handle(DomainEvent::TaskCreated {
                task_id: "t9".into(),
                title: "Review PR".into(),
                actor_id: creator.clone(),
                assignees: vec![creator.clone(), assignee.clone()],
            })
            .await;

        assert!(fx.store.list_for_user(&creator, false, 50).unwrap().is_empty());
        let got = fx.store.list_for_user(&assignee, false, 50).unwrap();
        assert_eq!(got.len(), 1);
        assert!(got[0].message.contains("Ana"));
    }

    #[tokio::test]
    async fn test_unresolved_actor_falls_back_to_someone() {
        let fx = Fixture::new("crewhub-events-someone");
        let u = fx.add_user("Solo");

        fx.notifier()
            .handle(DomainEvent::ChatMessageSent { actor_id: "ghost".into() })
            .await;

        let got = fx.store.list_for_user(&u, false, 50).unwrap();
        assert_eq!(got.len(), 1);
        assert!(got[0].message.starts_with("Someone"));
        assert_eq!(got[0].link.as_deref(), Some("/chat"));
    }
}
