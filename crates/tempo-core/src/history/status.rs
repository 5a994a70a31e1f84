//! Append-only status transition log.
//!
//! The log is the source of truth for point-in-time status reconstruction:
//! the `status` field on an issue is a convenience copy of the last entry
//! here. Entries are never rewritten; a correction is a new entry.
//!
//! Timestamps are non-decreasing in append order. Callers may supply
//! explicit timestamps (imports, backfills); when a supplied timestamp
//! would run backwards it is clamped to the previous entry's timestamp so
//! replay reads stay well-ordered.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::model::issue::Status;

/// One status transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusEntry {
    pub status: Status,
    pub timestamp: DateTime<Utc>,
    pub changed_by: String,
}

/// Ordered, append-only sequence of status transitions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StatusLog {
    entries: Vec<StatusEntry>,
}

impl StatusLog {
    /// A log holding the initial status assignment, stamped with the
    /// entity's creation timestamp.
    #[must_use]
    pub fn seeded(status: Status, at: DateTime<Utc>, by: &str) -> Self {
        Self {
            entries: vec![StatusEntry {
                status,
                timestamp: at,
                changed_by: by.to_owned(),
            }],
        }
    }

    /// Append a transition. The timestamp is clamped to keep append order
    /// non-decreasing.
    pub fn record(&mut self, status: Status, at: DateTime<Utc>, by: &str) {
        let timestamp = self.clamp(at);
        self.entries.push(StatusEntry {
            status,
            timestamp,
            changed_by: by.to_owned(),
        });
    }

    #[must_use]
    pub fn entries(&self) -> &[StatusEntry] {
        &self.entries
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The latest transition, if any.
    #[must_use]
    pub fn current(&self) -> Option<&StatusEntry> {
        self.entries.last()
    }

    /// The status in effect at the end of the given calendar day: the most
    /// recent entry whose timestamp falls on or before `day`.
    #[must_use]
    pub fn as_of_day(&self, day: NaiveDate) -> Option<Status> {
        self.entries
            .iter()
            .rev()
            .find(|entry| entry.timestamp.date_naive() <= day)
            .map(|entry| entry.status)
    }

    /// Whether the issue counts as done at the end of the given day.
    ///
    /// A later re-open does not change earlier days (each day is judged
    /// only by entries on or before it) but does flip the days from the
    /// re-open onward.
    #[must_use]
    pub fn done_as_of(&self, day: NaiveDate) -> bool {
        matches!(self.as_of_day(day), Some(Status::Done))
    }

    fn clamp(&self, at: DateTime<Utc>) -> DateTime<Utc> {
        match self.entries.last() {
            Some(last) if at < last.timestamp => {
                warn!(
                    supplied = %at,
                    floor = %last.timestamp,
                    "status timestamp runs backwards; clamping to append order"
                );
                last.timestamp
            }
            _ => at,
        }
    }
}
