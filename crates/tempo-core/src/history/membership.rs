//! Append-only board membership log.
//!
//! An issue's board binding is never stored as a live pointer; it is
//! derived by replaying this log. The last entry decides the present:
//! `added` means the issue currently sits on that board, `removed` (or an
//! empty log) means it sits on none. Historical membership on any past
//! date is equally derivable, which is what sprint scope accounting needs.
//!
//! A move to another board appends a compensating `removed` entry for the
//! vacated board and an `added` entry for the new one, sharing a single
//! timestamp. Entries are never edited, so an issue holds at most one
//! active board at a time by construction.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::warn;

/// Direction of a membership transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BoardAction {
    Added,
    Removed,
}

impl BoardAction {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Added => "added",
            Self::Removed => "removed",
        }
    }
}

impl fmt::Display for BoardAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One membership transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardEntry {
    pub board_id: String,
    pub action: BoardAction,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub moved_by: String,
}

/// Ordered, append-only sequence of membership transitions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BoardLog {
    entries: Vec<BoardEntry>,
}

impl BoardLog {
    /// Append a transition. The timestamp is clamped to keep append order
    /// non-decreasing.
    pub fn record(
        &mut self,
        board_id: &str,
        action: BoardAction,
        at: DateTime<Utc>,
        reason: Option<String>,
        by: &str,
    ) {
        let timestamp = self.clamp(at);
        self.entries.push(BoardEntry {
            board_id: board_id.to_owned(),
            action,
            timestamp,
            reason,
            moved_by: by.to_owned(),
        });
    }

    #[must_use]
    pub fn entries(&self) -> &[BoardEntry] {
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

    /// The board the issue currently sits on, derived from the last entry.
    #[must_use]
    pub fn current_board(&self) -> Option<&str> {
        match self.entries.last() {
            Some(entry) if entry.action == BoardAction::Added => Some(&entry.board_id),
            _ => None,
        }
    }

    /// Whether this log mentions the given board at all, in either
    /// direction. Scope-change accounting needs removed issues too.
    #[must_use]
    pub fn touches(&self, board_id: &str) -> bool {
        self.entries.iter().any(|entry| entry.board_id == board_id)
    }

    fn clamp(&self, at: DateTime<Utc>) -> DateTime<Utc> {
        match self.entries.last() {
            Some(last) if at < last.timestamp => {
                warn!(
                    supplied = %at,
                    floor = %last.timestamp,
                    "board timestamp runs backwards; clamping to append order"
                );
                last.timestamp
            }
            _ => at,
        }
    }
}
