//! Per-entity history: append-only transition logs and the bounded audit
//! trail.
//!
//! Two kinds of record keeping live here with different retention rules:
//!
//! - [`status::StatusLog`] and [`membership::BoardLog`] are append-only and
//!   unbounded: the source of truth for point-in-time reconstruction,
//!   never truncated or rewritten.
//! - [`trail::UpdateTrail`] is a bounded sliding window of recent field
//!   changes, kept for auditing rather than replay.

pub mod membership;
pub mod status;
pub mod trail;

pub use membership::{BoardAction, BoardEntry, BoardLog};
pub use status::{StatusEntry, StatusLog};
pub use trail::{UPDATE_TRAIL_CAP, UpdateRecord, UpdateTrail};
