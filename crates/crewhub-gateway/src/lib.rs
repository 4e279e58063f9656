//! # CrewHub Gateway
//!
//! The user-facing HTTP surface for notification records: list, unread
//! count, mark read, delete. Fan-out never happens here — records are
//! created only by the notify core.

pub mod routes;
pub mod server;

pub use server::{AppState, build_router, serve};
