//! # vox-server
//!
//! HTTP surface for the assistant pipeline.
//!
//! - [`routes`]: axum router and handlers (`/api/assistant/*`,
//!   `/api/sessions*`, `/health`, `/metrics`)
//! - [`error`]: [`error::ApiError`] with JSON error bodies
//! - [`settings`]: layered configuration (defaults → JSON file → `VOX_*` env)
//! - [`metrics`]: Prometheus recorder install and rendering

#![deny(unsafe_code)]

pub mod error;
pub mod metrics;
pub mod routes;
pub mod settings;

pub use error::ApiError;
pub use routes::{AppState, router};
pub use settings::VoxSettings;
