//! # vox-core
//!
//! Foundation types for the vox assistant backend.
//!
//! This crate provides the shared vocabulary the pipeline crates depend on:
//!
//! - **Intent schema**: [`intent::IntentKind`] — the closed vocabulary of
//!   recognized command intents, with defensive coercion of unknown tags
//! - **Parsed replies**: [`reply::ParsedReply`] — the structured result of
//!   interpreting one command
//! - **History**: [`history::HistoryEntry`], the legacy-tolerant
//!   [`history::HistoryRecord`], and the [`history::HistoryStore`] trait
//! - **Metric names**: [`metrics`] — shared constants for the counters the
//!   pipeline crates emit
//!
//! ## Crate Position
//!
//! Foundation crate. Depended on by all other vox crates.

#![deny(unsafe_code)]

pub mod history;
pub mod intent;
pub mod metrics;
pub mod reply;

pub use history::{HistoryEntry, HistoryRecord, HistoryStore, StoreError};
pub use intent::IntentKind;
pub use reply::ParsedReply;
