//! Sprint scope: one consistent fetch of a board and its issues.
//!
//! Every aggregation starts by loading a [`SprintScope`] (the board plus
//! every issue whose membership log mentions it) and then computes from
//! that snapshot alone, with no re-fetch mid-calculation. Aggregations are
//! read-only and run concurrently with unrelated mutations.

use tracing::debug;

use tempo_core::model::board::Board;
use tempo_core::model::issue::{Issue, Status};
use tempo_core::store::BoardDirectory;

use crate::error::MetricsError;

/// A board and the issues whose membership logs mention it.
#[derive(Debug, Clone)]
pub struct SprintScope {
    pub board: Board,
    pub issues: Vec<Issue>,
}

impl SprintScope {
    /// Fetch the board and its issue set in one pass.
    pub fn load<S: BoardDirectory>(store: &S, board_id: &str) -> Result<Self, MetricsError> {
        let board = store
            .board(board_id)?
            .ok_or_else(|| MetricsError::SprintNotFound {
                id: board_id.to_owned(),
            })?;
        let issues = store.issues_touching_board(board_id)?;
        debug!(board = board_id, issues = issues.len(), "sprint scope loaded");
        Ok(Self { board, issues })
    }

    /// Issues currently on the board (membership derived from the board
    /// log, not a stored pointer), excluding cancelled ones.
    pub fn members(&self) -> impl Iterator<Item = &Issue> {
        self.issues.iter().filter(|issue| {
            issue.current_board() == Some(self.board.id.as_str())
                && issue.status != Status::Cancelled
        })
    }

    /// Sum of story points over the current members.
    #[must_use]
    pub fn total_points(&self) -> u32 {
        self.members().map(|issue| issue.story_points).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::SprintScope;
    use crate::error::MetricsError;
    use chrono::{NaiveDate, TimeZone, Utc};
    use tempo_core::model::board::Board;
    use tempo_core::model::issue::{Issue, IssueDraft, Kind, Status};
    use tempo_core::store::{BoardDirectory, Collection, MemoryStore};

    fn store_with_board() -> MemoryStore {
        let store = MemoryStore::new();
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();
        store
            .put_board(Board::new("sprint-1", "Sprint 1", start, end).unwrap())
            .unwrap();
        store
    }

    fn issue(id: &str, points: u32, status: Status) -> Issue {
        let mut draft = IssueDraft::new(id, Kind::Task, "alice");
        draft.story_points = points;
        draft.status = status;
        draft.board_id = Some("sprint-1".to_owned());
        draft.created_at = Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).single();
        Issue::from_draft(id.to_owned(), draft)
    }

    #[test]
    fn missing_board_is_sprint_not_found() {
        let store = store_with_board();
        let err = SprintScope::load(&store, "sprint-9").unwrap_err();
        assert_eq!(
            err,
            MetricsError::SprintNotFound {
                id: "sprint-9".to_owned(),
            }
        );
    }

    #[test]
    fn members_exclude_cancelled_and_departed_issues() {
        let store = store_with_board();
        store.insert(issue("TASK-A", 3, Status::Todo)).unwrap();
        store.insert(issue("TASK-B", 5, Status::Cancelled)).unwrap();
        let mut departed = issue("TASK-C", 2, Status::Todo);
        departed.record_board_move(
            None,
            Utc.with_ymd_and_hms(2024, 1, 2, 9, 0, 0).single().unwrap(),
            "alice",
            None,
        );
        store.insert(departed).unwrap();

        let scope = SprintScope::load(&store, "sprint-1").unwrap();
        assert_eq!(scope.issues.len(), 3);

        let member_ids: Vec<&str> = scope.members().map(|i| i.id.as_str()).collect();
        assert_eq!(member_ids, vec!["TASK-A"]);
        assert_eq!(scope.total_points(), 3);
    }
}
