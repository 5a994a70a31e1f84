//! Burndown reconstruction.
//!
//! Replays each issue's status log across every calendar day of the
//! sprint window to produce a remaining-points series. An issue's points
//! count as done on day `D` when the status in effect at the end of `D`
//! is done; an issue that never reaches done contributes its full points
//! every day.
//!
//! This is a per-day full replay, not an incremental fold. Windows are
//! bounded (typically a sprint's couple of weeks) and board issue counts
//! are small, so the quadratic read is deliberate: every day is computed
//! independently from the log, which also makes the computation pure and
//! safe to abandon mid-flight.

use chrono::NaiveDate;
use serde::Serialize;

use tempo_core::model::board::Board;
use tempo_core::model::issue::Issue;

/// Remaining story points at the end of one sprint day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BurndownPoint {
    pub date: NaiveDate,
    pub remaining_points: u32,
}

/// Reconstruct the daily remaining-points series for a sprint window.
///
/// `issues` is the sprint's member set and `total_points` its point
/// total; an empty set yields a flat line at `total_points`.
#[must_use]
pub fn burndown_series(board: &Board, issues: &[Issue], total_points: u32) -> Vec<BurndownPoint> {
    board
        .days()
        .map(|date| {
            let done_points: u32 = issues
                .iter()
                .filter(|issue| issue.status_log.done_as_of(date))
                .map(|issue| issue.story_points)
                .sum();
            BurndownPoint {
                date,
                remaining_points: total_points.saturating_sub(done_points),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::burndown_series;
    use chrono::{DateTime, NaiveDate, TimeZone, Utc};
    use tempo_core::model::board::Board;
    use tempo_core::model::issue::{Issue, IssueDraft, Kind, Status};

    fn at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, day, 14, 0, 0).single().unwrap()
    }

    fn board() -> Board {
        Board::new(
            "sprint-1",
            "Sprint 1",
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 5).unwrap(),
        )
        .unwrap()
    }

    fn issue(id: &str, points: u32) -> Issue {
        let mut draft = IssueDraft::new(id, Kind::Task, "alice");
        draft.story_points = points;
        draft.board_id = Some("sprint-1".to_owned());
        draft.created_at = Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).single();
        Issue::from_draft(id.to_owned(), draft)
    }

    #[test]
    fn empty_issue_set_is_a_flat_line() {
        let series = burndown_series(&board(), &[], 0);
        assert_eq!(series.len(), 5);
        assert!(series.iter().all(|point| point.remaining_points == 0));
        assert_eq!(series[0].date, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        assert_eq!(series[4].date, NaiveDate::from_ymd_opt(2024, 1, 5).unwrap());
    }

    #[test]
    fn done_mid_sprint_drops_the_line_from_that_day() {
        let mut done_early = issue("TASK-A", 3);
        done_early.record_status(Status::Done, at(2), "bob");
        let never_done = issue("TASK-B", 5);

        let series = burndown_series(&board(), &[done_early, never_done], 8);
        let remaining: Vec<u32> = series.iter().map(|p| p.remaining_points).collect();
        assert_eq!(remaining, vec![8, 5, 5, 5, 5]);
    }

    #[test]
    fn series_is_non_increasing_without_reopens() {
        let mut a = issue("TASK-A", 2);
        a.record_status(Status::Done, at(2), "bob");
        let mut b = issue("TASK-B", 4);
        b.record_status(Status::Done, at(4), "bob");

        let series = burndown_series(&board(), &[a, b], 6);
        let remaining: Vec<u32> = series.iter().map(|p| p.remaining_points).collect();
        assert_eq!(remaining, vec![6, 4, 4, 0, 0]);
        assert!(remaining.windows(2).all(|pair| pair[0] >= pair[1]));
    }

    #[test]
    fn reopen_restores_points_for_later_days() {
        let mut flaky = issue("TASK-A", 3);
        flaky.record_status(Status::Done, at(2), "bob");
        flaky.record_status(Status::InProgress, at(4), "carol");

        let series = burndown_series(&board(), &[flaky], 3);
        let remaining: Vec<u32> = series.iter().map(|p| p.remaining_points).collect();
        assert_eq!(remaining, vec![3, 0, 0, 3, 3]);
    }

    #[test]
    fn done_before_the_window_counts_from_day_one() {
        let mut draft = IssueDraft::new("TASK-A", Kind::Task, "alice");
        draft.story_points = 3;
        draft.board_id = Some("sprint-1".to_owned());
        draft.created_at = Utc.with_ymd_and_hms(2023, 12, 20, 9, 0, 0).single();
        let mut early = Issue::from_draft("TASK-A".to_owned(), draft);
        early.record_status(
            Status::Done,
            Utc.with_ymd_and_hms(2023, 12, 30, 10, 0, 0).single().unwrap(),
            "bob",
        );

        let series = burndown_series(&board(), &[early], 3);
        assert!(series.iter().all(|point| point.remaining_points == 0));
    }
}
