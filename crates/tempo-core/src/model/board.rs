//! Sprint board: a time-boxed container of issues.
//!
//! Boards do not hold issue lists; membership lives in each issue's board
//! log and is reconstructed from there. A board carries only its identity
//! and the sprint window.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Error for an inverted sprint window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("sprint window is inverted: {start} is after {end}")]
pub struct InvertedWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// A sprint board with an inclusive calendar-day window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    pub id: String,
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl Board {
    /// Build a board, rejecting windows where the start falls after the
    /// end.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Self, InvertedWindow> {
        if start_date > end_date {
            return Err(InvertedWindow {
                start: start_date,
                end: end_date,
            });
        }
        Ok(Self {
            id: id.into(),
            name: name.into(),
            start_date,
            end_date,
        })
    }

    /// Every calendar day of the sprint, start to end inclusive.
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.start_date
            .iter_days()
            .take_while(move |day| *day <= self.end_date)
    }

    /// Number of calendar days in the window (at least 1).
    #[must_use]
    pub fn day_count(&self) -> usize {
        usize::try_from((self.end_date - self.start_date).num_days() + 1).unwrap_or(0)
    }
}
