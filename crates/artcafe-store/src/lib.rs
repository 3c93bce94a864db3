//! # artcafe-store
//!
//! SQLite persistence for the ArtCafe backend.
//!
//! The crate exposes a synchronous [`Database`] handle that wraps a
//! `rusqlite::Connection` and provides typed CRUD helpers for every domain
//! model. Operations that touch more than one row (like toggling, comment
//! counters, notification fan-out) run inside a single write transaction so
//! the denormalized post counters can never drift from the rows they count.

pub mod comments;
pub mod database;
pub mod learning_plans;
pub mod likes;
pub mod migrations;
pub mod models;
pub mod notifications;
pub mod posts;
pub mod sessions;
pub mod users;

mod error;
mod rows;

#[cfg(test)]
mod test_support;

pub use database::Database;
pub use error::{Result, StoreError};
pub use models::*;
