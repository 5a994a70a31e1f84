//! Velocity: completed points per sprint.
//!
//! No aggregation logic of its own: one snapshot per board, packaged as
//! a throughput series. A board that does not resolve fails the whole
//! call; the series is never partially populated.

use serde::Serialize;

use tempo_core::store::BoardDirectory;

use crate::error::MetricsError;
use crate::snapshot::sprint_snapshot;

/// Completed story points for one sprint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VelocityPoint {
    pub board_id: String,
    pub completed_points: u32,
}

/// Report completed points for each of the given sprints, in input order.
pub fn velocity<S: BoardDirectory>(
    store: &S,
    board_ids: &[String],
) -> Result<Vec<VelocityPoint>, MetricsError> {
    board_ids
        .iter()
        .map(|board_id| {
            sprint_snapshot(store, board_id).map(|snapshot| VelocityPoint {
                board_id: snapshot.board_id,
                completed_points: snapshot.completed_points,
            })
        })
        .collect()
}
