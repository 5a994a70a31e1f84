//! Document-store seam.
//!
//! The engine treats persistence as an external collaborator offering
//! find/insert/replace at single-document atomicity. [`Collection`] is the
//! per-type access trait; [`BoardDirectory`] adds the board lookups the
//! analytics side needs. [`MemoryStore`] is the reference implementation
//! used by tests and small deployments.
//!
//! Replace is a compare-and-swap on the document version: the caller
//! passes the version it read, and the store refuses the write when the
//! stored version has moved on. That conflict is the engine's
//! concurrent-modification signal. Store implementations are expected to
//! bound each call by the configured timeout and surface expiry as
//! [`StoreError::Timeout`]; the in-memory store never blocks.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::error::ErrorCode;
use crate::model::board::Board;
use crate::model::entity::Document;
use crate::model::issue::Issue;
use crate::model::project::Project;

/// Store-level failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("document '{id}' not found in {collection}")]
    NotFound { collection: &'static str, id: String },

    #[error("version conflict on '{id}': expected {expected}, store holds {actual}")]
    VersionConflict {
        id: String,
        expected: u64,
        actual: u64,
    },

    #[error("duplicate id '{id}' in {collection}")]
    DuplicateId { collection: &'static str, id: String },

    #[error("store call exceeded its {limit_ms}ms budget")]
    Timeout { limit_ms: u64 },

    #[error("store unavailable: {reason}")]
    Unavailable { reason: String },
}

impl StoreError {
    /// Machine-readable code associated with this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::NotFound { .. } => ErrorCode::EntityNotFound,
            Self::VersionConflict { .. } => ErrorCode::ConcurrentModification,
            Self::DuplicateId { .. } => ErrorCode::DuplicateId,
            Self::Timeout { .. } => ErrorCode::StoreTimeout,
            Self::Unavailable { .. } => ErrorCode::PersistenceFailure,
        }
    }
}

/// Typed access to one collection of documents.
pub trait Collection<D: Document> {
    fn find(&self, id: &str) -> Result<Option<D>, StoreError>;

    /// Insert a new document; the id must be unused.
    fn insert(&self, doc: D) -> Result<D, StoreError>;

    /// Replace the document iff its stored version still equals
    /// `expected_version`; bumps the version on success.
    fn replace(&self, id: &str, expected_version: u64, doc: D) -> Result<D, StoreError>;
}

/// Board lookups plus the membership-log scan the analytics side needs.
pub trait BoardDirectory {
    fn board(&self, id: &str) -> Result<Option<Board>, StoreError>;

    fn put_board(&self, board: Board) -> Result<(), StoreError>;

    /// Every issue whose board log mentions the board, in either
    /// direction (scope-change accounting needs issues that have since
    /// been pulled out). Ordered by id for determinism.
    fn issues_touching_board(&self, board_id: &str) -> Result<Vec<Issue>, StoreError>;
}

impl<D: Document, S: Collection<D> + ?Sized> Collection<D> for Arc<S> {
    fn find(&self, id: &str) -> Result<Option<D>, StoreError> {
        (**self).find(id)
    }

    fn insert(&self, doc: D) -> Result<D, StoreError> {
        (**self).insert(doc)
    }

    fn replace(&self, id: &str, expected_version: u64, doc: D) -> Result<D, StoreError> {
        (**self).replace(id, expected_version, doc)
    }
}

impl<S: BoardDirectory + ?Sized> BoardDirectory for Arc<S> {
    fn board(&self, id: &str) -> Result<Option<Board>, StoreError> {
        (**self).board(id)
    }

    fn put_board(&self, board: Board) -> Result<(), StoreError> {
        (**self).put_board(board)
    }

    fn issues_touching_board(&self, board_id: &str) -> Result<Vec<Issue>, StoreError> {
        (**self).issues_touching_board(board_id)
    }
}

#[derive(Debug, Default)]
struct Shelves {
    issues: HashMap<String, Issue>,
    projects: HashMap<String, Project>,
    boards: HashMap<String, Board>,
    offline: bool,
}

/// In-memory reference store with single-document atomicity.
///
/// `set_offline` simulates a store outage for fault-injection tests:
/// every call fails with [`StoreError::Unavailable`] until switched back.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Shelves>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_offline(&self, offline: bool) {
        if let Ok(mut shelves) = self.inner.lock() {
            shelves.offline = offline;
        }
    }

    fn guard(&self) -> Result<MutexGuard<'_, Shelves>, StoreError> {
        let shelves = self.inner.lock().map_err(|_| StoreError::Unavailable {
            reason: "store mutex poisoned".to_owned(),
        })?;
        if shelves.offline {
            return Err(StoreError::Unavailable {
                reason: "injected outage".to_owned(),
            });
        }
        Ok(shelves)
    }
}

fn insert_into<D: Document>(map: &mut HashMap<String, D>, doc: D) -> Result<D, StoreError> {
    if map.contains_key(doc.id()) {
        return Err(StoreError::DuplicateId {
            collection: D::COLLECTION,
            id: doc.id().to_owned(),
        });
    }
    map.insert(doc.id().to_owned(), doc.clone());
    Ok(doc)
}

fn replace_in<D: Document>(
    map: &mut HashMap<String, D>,
    id: &str,
    expected_version: u64,
    mut doc: D,
) -> Result<D, StoreError> {
    let stored = map.get(id).ok_or_else(|| StoreError::NotFound {
        collection: D::COLLECTION,
        id: id.to_owned(),
    })?;
    if stored.version() != expected_version {
        return Err(StoreError::VersionConflict {
            id: id.to_owned(),
            expected: expected_version,
            actual: stored.version(),
        });
    }
    doc.set_version(expected_version + 1);
    map.insert(id.to_owned(), doc.clone());
    Ok(doc)
}

impl Collection<Issue> for MemoryStore {
    fn find(&self, id: &str) -> Result<Option<Issue>, StoreError> {
        Ok(self.guard()?.issues.get(id).cloned())
    }

    fn insert(&self, doc: Issue) -> Result<Issue, StoreError> {
        insert_into(&mut self.guard()?.issues, doc)
    }

    fn replace(&self, id: &str, expected_version: u64, doc: Issue) -> Result<Issue, StoreError> {
        replace_in(&mut self.guard()?.issues, id, expected_version, doc)
    }
}

impl Collection<Project> for MemoryStore {
    fn find(&self, id: &str) -> Result<Option<Project>, StoreError> {
        Ok(self.guard()?.projects.get(id).cloned())
    }

    fn insert(&self, doc: Project) -> Result<Project, StoreError> {
        insert_into(&mut self.guard()?.projects, doc)
    }

    fn replace(&self, id: &str, expected_version: u64, doc: Project) -> Result<Project, StoreError> {
        replace_in(&mut self.guard()?.projects, id, expected_version, doc)
    }
}

impl BoardDirectory for MemoryStore {
    fn board(&self, id: &str) -> Result<Option<Board>, StoreError> {
        Ok(self.guard()?.boards.get(id).cloned())
    }

    fn put_board(&self, board: Board) -> Result<(), StoreError> {
        self.guard()?.boards.insert(board.id.clone(), board);
        Ok(())
    }

    fn issues_touching_board(&self, board_id: &str) -> Result<Vec<Issue>, StoreError> {
        let shelves = self.guard()?;
        let mut issues: Vec<Issue> = shelves
            .issues
            .values()
            .filter(|issue| issue.board_log.touches(board_id))
            .cloned()
            .collect();
        issues.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(issues)
    }
}
