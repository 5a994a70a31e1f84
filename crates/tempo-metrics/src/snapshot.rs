//! Sprint snapshot aggregation.
//!
//! Totals come from the issues *currently* on the board (derived from
//! each issue's membership log), excluding cancelled issues. The net
//! scope change replays membership entries dated on or after the sprint
//! start: points added to the board minus points pulled out. Points
//! present at sprint start contribute to neither side, and a
//! removed-then-readded pair cancels out.

use serde::Serialize;

use tempo_core::history::membership::BoardAction;
use tempo_core::model::issue::Status;
use tempo_core::store::BoardDirectory;

use crate::error::MetricsError;
use crate::scope::SprintScope;

/// Point totals for one sprint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SprintSnapshot {
    pub board_id: String,
    pub total_points: u32,
    pub completed_points: u32,
    pub remaining_points: u32,
    pub net_scope_change: i64,
}

/// Aggregate a snapshot for the board.
pub fn sprint_snapshot<S: BoardDirectory>(
    store: &S,
    board_id: &str,
) -> Result<SprintSnapshot, MetricsError> {
    let scope = SprintScope::load(store, board_id)?;
    Ok(snapshot_of(&scope))
}

pub(crate) fn snapshot_of(scope: &SprintScope) -> SprintSnapshot {
    let total_points = scope.total_points();
    let completed_points = scope
        .members()
        .filter(|issue| issue.status == Status::Done)
        .map(|issue| issue.story_points)
        .sum();

    SprintSnapshot {
        board_id: scope.board.id.clone(),
        total_points,
        completed_points,
        remaining_points: total_points - completed_points,
        net_scope_change: net_scope_change(scope),
    }
}

fn net_scope_change(scope: &SprintScope) -> i64 {
    let start = scope.board.start_date;
    let mut net = 0_i64;
    for issue in &scope.issues {
        for entry in issue.board_log.entries() {
            if entry.board_id != scope.board.id || entry.timestamp.date_naive() < start {
                continue;
            }
            match entry.action {
                BoardAction::Added => net += i64::from(issue.story_points),
                BoardAction::Removed => net -= i64::from(issue.story_points),
            }
        }
    }
    net
}
