//! Mutation orchestrator.
//!
//! Single entry point for every write against an entity. One update runs
//! as: load → diff → validate references → record transitions → append to
//! the update trail → one compare-and-swap store write → publish. The diff
//! short-circuits before anything is touched, all mutation happens on a
//! locally owned copy, and the store write is the only point where the new
//! state becomes visible: either the entity transitions as a whole or no
//! history is mutated at all.
//!
//! Updates to the same entity are serialized optimistically: the replace
//! carries the version read in step 1, and a stale read surfaces as
//! [`MutationError::ConcurrentModification`]. The engine never retries on
//! the caller's behalf. Updates to different entities are independent.

use chrono::{DateTime, Utc};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::mpsc::Receiver;
use tracing::debug;

use crate::config::EngineConfig;
use crate::diff::{self, EmptyUpdate, FieldChange};
use crate::error::ErrorCode;
use crate::history::trail::UpdateRecord;
use crate::model::entity::{Document, FieldError};
use crate::model::ident;
use crate::model::issue::{Issue, IssueDraft, Kind, Status};
use crate::model::project::{PROJECT_COLORS, Project, ProjectDraft};
use crate::notify::{ChangeEvent, ChangeFeed};
use crate::store::{BoardDirectory, Collection, StoreError};

/// One proposed update: the raw field map plus attribution.
#[derive(Debug, Clone)]
pub struct UpdateRequest {
    pub fields: BTreeMap<String, Value>,
    pub updated_by: String,
    /// Optional human-readable reason, recorded on board-move entries
    /// (e.g. "scope change", "sprint completion").
    pub reason: Option<String>,
}

impl UpdateRequest {
    #[must_use]
    pub fn new(updated_by: impl Into<String>) -> Self {
        Self {
            fields: BTreeMap::new(),
            updated_by: updated_by.into(),
            reason: None,
        }
    }

    #[must_use]
    pub fn set(mut self, field: impl Into<String>, value: Value) -> Self {
        self.fields.insert(field.into(), value);
        self
    }

    #[must_use]
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }
}

/// Failures surfaced by the mutation pipeline.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MutationError {
    #[error("{collection} '{id}' not found")]
    NotFound { collection: &'static str, id: String },

    /// Normal rejection of a no-op update; nothing was written or logged.
    #[error(transparent)]
    NoChangesDetected(#[from] EmptyUpdate),

    #[error("field '{field}' references '{target}': {reason}")]
    InvalidReference {
        field: String,
        target: String,
        reason: &'static str,
    },

    #[error(transparent)]
    InvalidValue(#[from] FieldError),

    #[error("concurrent update on '{id}': the read at version {base_version} is stale")]
    ConcurrentModification { id: String, base_version: u64 },

    #[error("persistence failure: {0}")]
    Persistence(StoreError),
}

impl MutationError {
    /// Machine-readable code associated with this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::NotFound { .. } => ErrorCode::EntityNotFound,
            Self::NoChangesDetected(_) => ErrorCode::NoChangesDetected,
            Self::InvalidReference { .. } => ErrorCode::InvalidReference,
            Self::InvalidValue(err) => err.code(),
            Self::ConcurrentModification { .. } => ErrorCode::ConcurrentModification,
            Self::Persistence(err) => err.code(),
        }
    }
}

/// Map a store failure on the final replace, where a version conflict
/// means another writer won the race.
fn replace_failure(id: &str, base_version: u64, err: StoreError) -> MutationError {
    match err {
        StoreError::NotFound { collection, id } => MutationError::NotFound { collection, id },
        StoreError::VersionConflict { .. } => MutationError::ConcurrentModification {
            id: id.to_owned(),
            base_version,
        },
        other => MutationError::Persistence(other),
    }
}

fn invalid_reference(field: &str, target: &str, reason: &'static str) -> MutationError {
    MutationError::InvalidReference {
        field: field.to_owned(),
        target: target.to_owned(),
        reason,
    }
}

fn parse_status(value: &Value) -> Result<Status, MutationError> {
    value
        .as_str()
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| FieldError::invalid("status", "expected one of the workflow statuses").into())
}

fn parse_opt_id(field: &str, value: &Value) -> Result<Option<String>, MutationError> {
    match value {
        Value::Null => Ok(None),
        Value::String(id) if !id.is_empty() => Ok(Some(id.clone())),
        _ => Err(FieldError::invalid(field, "expected an id string or null").into()),
    }
}

fn stamped(
    changes: &[FieldChange],
    updated_by: &str,
    at: DateTime<Utc>,
) -> Vec<UpdateRecord> {
    changes
        .iter()
        .map(|change| UpdateRecord {
            field: change.field.clone(),
            old_value: change.old_value.clone(),
            new_value: change.new_value.clone(),
            updated_by: updated_by.to_owned(),
            updated_at: at,
        })
        .collect()
}

fn field_names(changes: &[FieldChange]) -> Vec<String> {
    changes.iter().map(|change| change.field.clone()).collect()
}

/// The mutation orchestrator.
pub struct Engine<S> {
    store: S,
    feed: ChangeFeed,
}

impl<S> Engine<S>
where
    S: Collection<Issue> + Collection<Project> + BoardDirectory,
{
    /// An engine without a change feed.
    pub fn new(store: S) -> Self {
        Self {
            store,
            feed: ChangeFeed::disabled(),
        }
    }

    /// An engine publishing committed mutations to a bounded feed sized
    /// from the configuration.
    pub fn with_config(store: S, config: &EngineConfig) -> (Self, Receiver<ChangeEvent>) {
        let (feed, rx) = ChangeFeed::channel(config.notify.buffer);
        (Self { store, feed }, rx)
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Create an issue: validates references, generates the id, seeds the
    /// status log (and the initial board membership entry when a board is
    /// given), and inserts.
    pub fn create_issue(&self, draft: IssueDraft) -> Result<Issue, MutationError> {
        if draft.title.trim().is_empty() {
            return Err(FieldError::invalid("title", "expected a non-empty string").into());
        }
        self.check_parent(draft.kind, draft.parent.as_deref())?;
        if let Some(board_id) = &draft.board_id {
            if draft.kind == Kind::Epic {
                return Err(invalid_reference(
                    "board_id",
                    board_id,
                    "epics are not bound to boards",
                ));
            }
            self.require_board(board_id)?;
        }
        if let Some(project_id) = &draft.project_id {
            if Collection::<Project>::find(&self.store, project_id)
                .map_err(MutationError::Persistence)?
                .is_none()
            {
                return Err(invalid_reference("project_id", project_id, "no such project"));
            }
        }
        self.check_dependency_targets(&draft.dependencies.issues, &draft.dependencies.projects)?;

        let id = ident::issue_id(draft.kind, &draft.title);
        let issue = Issue::from_draft(id, draft);
        let stored = Collection::<Issue>::insert(&self.store, issue)
            .map_err(MutationError::Persistence)?;
        debug!(id = %stored.id, kind = %stored.kind, "issue created");
        self.feed.publish(ChangeEvent::IssueCreated {
            id: stored.id.clone(),
        });
        Ok(stored)
    }

    /// Create a project with a generated id and accent color.
    pub fn create_project(&self, draft: ProjectDraft) -> Result<Project, MutationError> {
        if draft.name.trim().is_empty() {
            return Err(FieldError::invalid("name", "expected a non-empty string").into());
        }
        let id = ident::project_id(&draft.name);
        let color = pick_color();
        let project = Project::from_draft(id, color, draft);
        let stored = Collection::<Project>::insert(&self.store, project)
            .map_err(MutationError::Persistence)?;
        debug!(id = %stored.id, "project created");
        self.feed.publish(ChangeEvent::ProjectCreated {
            id: stored.id.clone(),
        });
        Ok(stored)
    }

    /// Apply one validated update to one issue.
    pub fn apply_issue_update(
        &self,
        id: &str,
        request: &UpdateRequest,
    ) -> Result<Issue, MutationError> {
        let current: Issue = Collection::<Issue>::find(&self.store, id)
            .map_err(MutationError::Persistence)?
            .ok_or_else(|| MutationError::NotFound {
                collection: Issue::COLLECTION,
                id: id.to_owned(),
            })?;
        let base_version = current.version;

        // Empty diff rejects before any history or storage is touched.
        let changes = diff::changed_fields(&current, &request.fields)?;
        self.check_issue_changes(&current, &changes)?;

        let now = Utc::now();
        let mut next = current;
        for change in &changes {
            match change.field.as_str() {
                "status" => {
                    let status = parse_status(&change.new_value)?;
                    next.record_status(status, now, &request.updated_by);
                }
                "board_id" => {
                    let board_id = parse_opt_id("board_id", &change.new_value)?;
                    next.record_board_move(
                        board_id.as_deref(),
                        now,
                        &request.updated_by,
                        request.reason.clone(),
                    );
                }
                field => next.apply_field(field, &change.new_value)?,
            }
        }
        next.update_trail_mut()
            .append_batch(stamped(&changes, &request.updated_by, now));
        next.touch(now);

        let stored = Collection::<Issue>::replace(&self.store, id, base_version, next)
            .map_err(|err| replace_failure(id, base_version, err))?;
        debug!(id, fields = changes.len(), "issue update applied");
        self.feed.publish(ChangeEvent::IssueUpdated {
            id: stored.id.clone(),
            fields: field_names(&changes),
        });
        Ok(stored)
    }

    /// Apply one validated update to one project. Projects have no
    /// transition logs, so every change is a plain field assignment.
    pub fn apply_project_update(
        &self,
        id: &str,
        request: &UpdateRequest,
    ) -> Result<Project, MutationError> {
        let current: Project = Collection::<Project>::find(&self.store, id)
            .map_err(MutationError::Persistence)?
            .ok_or_else(|| MutationError::NotFound {
                collection: Project::COLLECTION,
                id: id.to_owned(),
            })?;
        let base_version = current.version;

        let changes = diff::changed_fields(&current, &request.fields)?;

        let now = Utc::now();
        let mut next = current;
        for change in &changes {
            next.apply_field(&change.field, &change.new_value)?;
        }
        next.update_trail_mut()
            .append_batch(stamped(&changes, &request.updated_by, now));
        next.touch(now);

        let stored = Collection::<Project>::replace(&self.store, id, base_version, next)
            .map_err(|err| replace_failure(id, base_version, err))?;
        debug!(id, fields = changes.len(), "project update applied");
        self.feed.publish(ChangeEvent::ProjectUpdated {
            id: stored.id.clone(),
            fields: field_names(&changes),
        });
        Ok(stored)
    }

    /// Cross-field checks for an issue change set: reference fields must
    /// point at resolvable, type-compatible targets.
    fn check_issue_changes(
        &self,
        current: &Issue,
        changes: &[FieldChange],
    ) -> Result<(), MutationError> {
        for change in changes {
            match change.field.as_str() {
                "parent" => {
                    let parent = parse_opt_id("parent", &change.new_value)?;
                    self.check_parent(current.kind, parent.as_deref())?;
                }
                "board_id" => {
                    if let Some(board_id) = parse_opt_id("board_id", &change.new_value)? {
                        if current.kind == Kind::Epic {
                            return Err(invalid_reference(
                                "board_id",
                                &board_id,
                                "epics are not bound to boards",
                            ));
                        }
                        self.require_board(&board_id)?;
                    }
                }
                "dependencies" => {
                    let deps: crate::model::issue::Dependencies =
                        serde_json::from_value(change.new_value.clone()).map_err(|_| {
                            FieldError::invalid(
                                "dependencies",
                                "expected { issues: [..], projects: [..] }",
                            )
                        })?;
                    self.check_dependency_targets(&deps.issues, &deps.projects)?;
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn check_parent(&self, kind: Kind, parent: Option<&str>) -> Result<(), MutationError> {
        match (kind, parent) {
            (Kind::Epic, Some(id)) => Err(invalid_reference(
                "parent",
                id,
                "epics cannot have a parent",
            )),
            (Kind::Subtask, None) => {
                Err(FieldError::invalid("parent", "subtasks must have a parent").into())
            }
            (_, None) => Ok(()),
            (kind, Some(id)) => {
                let parent = Collection::<Issue>::find(&self.store, id)
                    .map_err(MutationError::Persistence)?
                    .ok_or_else(|| invalid_reference("parent", id, "no such issue"))?;
                match (kind, parent.kind) {
                    (Kind::Subtask, Kind::Task | Kind::Story | Kind::Bug) => Ok(()),
                    (Kind::Subtask, _) => Err(invalid_reference(
                        "parent",
                        id,
                        "subtask parent must be a task, story, or bug",
                    )),
                    (_, Kind::Epic) => Ok(()),
                    _ => Err(invalid_reference("parent", id, "parent must be an epic")),
                }
            }
        }
    }

    fn check_dependency_targets(
        &self,
        issues: &[String],
        projects: &[String],
    ) -> Result<(), MutationError> {
        for id in issues {
            if Collection::<Issue>::find(&self.store, id)
                .map_err(MutationError::Persistence)?
                .is_none()
            {
                return Err(invalid_reference("dependencies", id, "no such issue"));
            }
        }
        for id in projects {
            if Collection::<Project>::find(&self.store, id)
                .map_err(MutationError::Persistence)?
                .is_none()
            {
                return Err(invalid_reference("dependencies", id, "no such project"));
            }
        }
        Ok(())
    }

    fn require_board(&self, board_id: &str) -> Result<(), MutationError> {
        if self
            .store
            .board(board_id)
            .map_err(MutationError::Persistence)?
            .is_none()
        {
            return Err(invalid_reference("board_id", board_id, "no such board"));
        }
        Ok(())
    }
}

fn pick_color() -> String {
    use rand::Rng;
    let index = rand::thread_rng().gen_range(0..PROJECT_COLORS.len());
    PROJECT_COLORS[index].to_owned()
}
