//! # CrewHub Notify
//!
//! The notification core: fan-out, event-triggered notifications, and the
//! periodic reminder scheduler.
//!
//! ## Architecture
//! ```text
//! Business operation (commit) ──► EventNotifier ──► Notifier ──► NotificationStore
//!
//! ReminderScheduler
//!   ├── short cycle (warm-up, then every N min)
//!   │     overdue → due-soon → upcoming-events → completed
//!   └── daily cycle (early run, then local midnight)
//!         pending digest → assigned digest
//! ```
//!
//! Delivery is an auxiliary signal, never a transactional guarantee: every
//! failure on this path is logged and contained, and the triggering
//! operation always appears to succeed.

pub mod checks;
pub mod events;
pub mod notifier;
pub mod reminder;

pub use events::{DomainEvent, EventNotifier};
pub use notifier::{FanoutOutcome, Notifier};
pub use reminder::ReminderScheduler;
