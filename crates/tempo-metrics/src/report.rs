//! Combined sprint report: snapshot plus burndown series.
//!
//! Both halves are computed from a single [`SprintScope`] fetch so the
//! snapshot and the series agree on the issue set. Either the whole
//! report is returned or an error is, never a half-filled series.

use serde::Serialize;

use tempo_core::model::issue::Issue;
use tempo_core::store::BoardDirectory;

use crate::burndown::{BurndownPoint, burndown_series};
use crate::error::MetricsError;
use crate::scope::SprintScope;
use crate::snapshot::{SprintSnapshot, snapshot_of};

/// Snapshot totals plus the daily remaining-points series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BurndownReport {
    pub snapshot: SprintSnapshot,
    pub series: Vec<BurndownPoint>,
}

/// Build the full report for a board.
pub fn burndown_report<S: BoardDirectory>(
    store: &S,
    board_id: &str,
) -> Result<BurndownReport, MetricsError> {
    let scope = SprintScope::load(store, board_id)?;
    let snapshot = snapshot_of(&scope);
    let members: Vec<Issue> = scope.members().cloned().collect();
    let series = burndown_series(&scope.board, &members, snapshot.total_points);
    Ok(BurndownReport { snapshot, series })
}

#[cfg(test)]
mod tests {
    use super::burndown_report;
    use crate::error::MetricsError;
    use chrono::{NaiveDate, TimeZone, Utc};
    use tempo_core::model::board::Board;
    use tempo_core::model::issue::{Issue, IssueDraft, Kind, Status};
    use tempo_core::store::{BoardDirectory, Collection, MemoryStore};

    #[test]
    fn snapshot_and_series_come_from_one_issue_set() {
        let store = MemoryStore::new();
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 1, 3).unwrap();
        store
            .put_board(Board::new("sprint-1", "Sprint 1", start, end).unwrap())
            .unwrap();

        let mut draft = IssueDraft::new("TASK-A", Kind::Task, "alice");
        draft.story_points = 5;
        draft.board_id = Some("sprint-1".to_owned());
        draft.created_at = Utc.with_ymd_and_hms(2023, 12, 20, 9, 0, 0).single();
        let mut issue = Issue::from_draft("TASK-A".to_owned(), draft);
        issue.record_status(
            Status::Done,
            Utc.with_ymd_and_hms(2024, 1, 2, 11, 0, 0).single().unwrap(),
            "bob",
        );
        store.insert(issue).unwrap();

        let report = burndown_report(&store, "sprint-1").unwrap();
        assert_eq!(report.snapshot.total_points, 5);
        assert_eq!(report.snapshot.completed_points, 5);
        assert_eq!(report.series.len(), 3);
        let remaining: Vec<u32> = report.series.iter().map(|p| p.remaining_points).collect();
        assert_eq!(remaining, vec![5, 0, 0]);
    }

    #[test]
    fn missing_board_produces_no_partial_report() {
        let store = MemoryStore::new();
        let err = burndown_report(&store, "sprint-9").unwrap_err();
        assert!(matches!(err, MetricsError::SprintNotFound { .. }));
    }
}
