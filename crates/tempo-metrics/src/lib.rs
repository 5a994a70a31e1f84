//! tempo-metrics: sprint analytics reconstructed from history logs.
//!
//! All aggregations are read-only replays over the entity histories that
//! `tempo-core` maintains: snapshot totals and scope change from the
//! board membership logs, burndown from the status logs, velocity from
//! per-sprint snapshots. Each computation fetches its documents once up
//! front and returns either a complete result or an error, never a
//! partial series.
//!
//! # Conventions
//!
//! - **Errors**: typed `thiserror` enums mapping onto
//!   `tempo_core::error::ErrorCode` via `code()`.
//! - **Logging**: `tracing` macros (`debug!` for aggregation milestones).

#![forbid(unsafe_code)]

pub mod burndown;
pub mod error;
pub mod report;
pub mod scope;
pub mod snapshot;
pub mod velocity;

pub use burndown::{BurndownPoint, burndown_series};
pub use error::MetricsError;
pub use report::{BurndownReport, burndown_report};
pub use scope::SprintScope;
pub use snapshot::{SprintSnapshot, sprint_snapshot};
pub use velocity::{VelocityPoint, velocity};
