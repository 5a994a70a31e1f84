//! tempo-core: versioned mutation engine for long-lived tracker entities.
//!
//! Turns raw update requests into audited, bounded-history field diffs,
//! and maintains the append-only lifecycle logs (status transitions,
//! board membership) that point-in-time reconstruction replays.
//!
//! # Conventions
//!
//! - **Errors**: typed `thiserror` enums per module, each mapping onto the
//!   machine-readable [`error::ErrorCode`] registry via `code()`.
//!   `anyhow::Result` only at the config-loading boundary.
//! - **Logging**: `tracing` macros (`debug!`, `warn!`); a rejected no-op
//!   update is not an error and is never logged as one.

#![forbid(unsafe_code)]

pub mod config;
pub mod diff;
pub mod error;
pub mod history;
pub mod model;
pub mod mutate;
pub mod notify;
pub mod store;

pub use config::EngineConfig;
pub use error::ErrorCode;
pub use mutate::{Engine, MutationError, UpdateRequest};
pub use notify::ChangeEvent;
