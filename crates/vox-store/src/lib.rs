//! # vox-store
//!
//! SQLite-backed persistence for sessions and conversation history.
//!
//! - [`pool`]: r2d2 connection pool over rusqlite, WAL mode
//! - [`migrations`]: idempotent schema setup
//! - [`session`]: session repository (persona identity per session)
//! - [`history`]: history repository (append-only JSON payload log)
//! - [`store`]: [`SqliteStore`], the async facade implementing
//!   [`vox_core::HistoryStore`]

#![deny(unsafe_code)]

pub mod errors;
pub mod history;
pub mod migrations;
pub mod pool;
pub mod session;
pub mod store;

pub use errors::{DbError, Result};
pub use pool::{ConnectionPool, PooledConnection, open_pool};
pub use session::{SessionRepo, SessionRow};
pub use store::SqliteStore;
