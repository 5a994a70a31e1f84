//! Bounded audit trail of applied field changes.
//!
//! Each applied update appends one record per changed field. The trail
//! keeps only the `UPDATE_TRAIL_CAP` most recent records in arrival order:
//! when an appended batch pushes the total over the cap, the oldest records
//! are evicted first and the newest are always retained. Records are
//! immutable once appended.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Maximum number of records retained per entity.
pub const UPDATE_TRAIL_CAP: usize = 5;

/// One audited field change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateRecord {
    pub field: String,
    pub old_value: Value,
    pub new_value: Value,
    pub updated_by: String,
    pub updated_at: DateTime<Utc>,
}

/// Sliding window over the most recent field changes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UpdateTrail {
    records: Vec<UpdateRecord>,
}

impl UpdateTrail {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            records: Vec::new(),
        }
    }

    /// Append a batch of records, evicting the oldest overall so that at
    /// most [`UPDATE_TRAIL_CAP`] remain.
    pub fn append_batch(&mut self, batch: impl IntoIterator<Item = UpdateRecord>) {
        self.records.extend(batch);
        if self.records.len() > UPDATE_TRAIL_CAP {
            let excess = self.records.len() - UPDATE_TRAIL_CAP;
            self.records.drain(..excess);
        }
    }

    #[must_use]
    pub fn records(&self) -> &[UpdateRecord] {
        &self.records
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// The most recently appended record, if any.
    #[must_use]
    pub fn newest(&self) -> Option<&UpdateRecord> {
        self.records.last()
    }
}
