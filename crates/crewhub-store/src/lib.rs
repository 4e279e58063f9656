//! # CrewHub Store
//!
//! SQLite persistence for CrewHub. Two stores share one database file:
//! the notification store (per-recipient records, append-only creation)
//! and the domain store (the read-only queries the reminder sweeps
//! evaluate, plus thin collaborator writes).

pub mod db;
pub mod domain;
pub mod notifications;

pub use domain::{DomainStore, EventRecord, TaskRecord};
pub use notifications::NotificationStore;
