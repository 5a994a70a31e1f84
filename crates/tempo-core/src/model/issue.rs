//! Issue aggregate and its closed vocabularies.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::{fmt, str::FromStr};

use crate::history::membership::{BoardAction, BoardLog};
use crate::history::status::StatusLog;
use crate::history::trail::UpdateTrail;
use crate::model::entity::{Document, FieldError};

/// The five kinds of issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Kind {
    Epic,
    Story,
    Task,
    Bug,
    Subtask,
}

impl Kind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Epic => "epic",
            Self::Story => "story",
            Self::Task => "task",
            Self::Bug => "bug",
            Self::Subtask => "subtask",
        }
    }
}

/// The seven workflow statuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Status {
    #[default]
    Backlog,
    Todo,
    InProgress,
    Review,
    OnHold,
    Done,
    Cancelled,
}

impl Status {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Backlog => "backlog",
            Self::Todo => "todo",
            Self::InProgress => "in-progress",
            Self::Review => "review",
            Self::OnHold => "on-hold",
            Self::Done => "done",
            Self::Cancelled => "cancelled",
        }
    }
}

/// Scheduling priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

/// Error returned when parsing an enum value from text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseEnumError {
    pub expected: &'static str,
    pub got: String,
}

impl fmt::Display for ParseEnumError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid {}: '{}'", self.expected, self.got)
    }
}

impl std::error::Error for ParseEnumError {}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn normalize(input: &str) -> String {
    input.trim().to_ascii_lowercase()
}

impl FromStr for Kind {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "epic" => Ok(Self::Epic),
            "story" => Ok(Self::Story),
            "task" => Ok(Self::Task),
            "bug" => Ok(Self::Bug),
            "subtask" => Ok(Self::Subtask),
            _ => Err(ParseEnumError {
                expected: "kind",
                got: s.to_string(),
            }),
        }
    }
}

impl FromStr for Status {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "backlog" => Ok(Self::Backlog),
            "todo" => Ok(Self::Todo),
            "in-progress" => Ok(Self::InProgress),
            "review" => Ok(Self::Review),
            "on-hold" => Ok(Self::OnHold),
            "done" => Ok(Self::Done),
            "cancelled" => Ok(Self::Cancelled),
            _ => Err(ParseEnumError {
                expected: "status",
                got: s.to_string(),
            }),
        }
    }
}

impl FromStr for Priority {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            _ => Err(ParseEnumError {
                expected: "priority",
                got: s.to_string(),
            }),
        }
    }
}

/// Outbound references from an issue to the work it depends on.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Dependencies {
    pub issues: Vec<String>,
    pub projects: Vec<String>,
}

impl Dependencies {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.issues.is_empty() && self.projects.is_empty()
    }
}

/// A tracked issue: mutable fields plus the three history structures.
///
/// The current board is NOT a field: it is derived from `board_log`, and
/// `status` is a convenience copy of the last `status_log` entry. Both are
/// kept in lock-step by the typed recorders below.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    pub id: String,
    pub version: u64,
    pub title: String,
    pub description: Option<String>,
    pub kind: Kind,
    pub status: Status,
    pub priority: Priority,
    pub story_points: u32,
    pub assignees: Vec<String>,
    pub parent: Option<String>,
    pub dependencies: Dependencies,
    pub project_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub status_log: StatusLog,
    pub board_log: BoardLog,
    pub update_trail: UpdateTrail,
}

/// Creation-time shape for an issue, before id assignment and history
/// seeding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssueDraft {
    pub title: String,
    pub kind: Kind,
    #[serde(default)]
    pub status: Status,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub story_points: u32,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub assignees: Vec<String>,
    #[serde(default)]
    pub parent: Option<String>,
    #[serde(default)]
    pub dependencies: Dependencies,
    #[serde(default)]
    pub project_id: Option<String>,
    #[serde(default)]
    pub board_id: Option<String>,
    pub created_by: String,
    /// Explicit creation timestamp for imports/backfills; `None` means now.
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl IssueDraft {
    #[must_use]
    pub fn new(title: impl Into<String>, kind: Kind, created_by: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            kind,
            status: Status::default(),
            priority: Priority::default(),
            story_points: 0,
            description: None,
            assignees: Vec::new(),
            parent: None,
            dependencies: Dependencies::default(),
            project_id: None,
            board_id: None,
            created_by: created_by.into(),
            created_at: None,
        }
    }
}

impl Issue {
    /// Materialize an issue from a validated draft: seeds the status log
    /// with the creation entry and, when a board is given, the initial
    /// `added` membership entry.
    #[must_use]
    pub fn from_draft(id: String, draft: IssueDraft) -> Self {
        let created_at = draft.created_at.unwrap_or_else(Utc::now);
        let status_log = StatusLog::seeded(draft.status, created_at, &draft.created_by);
        let mut board_log = BoardLog::default();
        if let Some(board_id) = &draft.board_id {
            board_log.record(
                board_id,
                BoardAction::Added,
                created_at,
                None,
                &draft.created_by,
            );
        }

        Self {
            id,
            version: 0,
            title: draft.title,
            description: draft.description,
            kind: draft.kind,
            status: draft.status,
            priority: draft.priority,
            story_points: draft.story_points,
            assignees: draft.assignees,
            parent: draft.parent,
            dependencies: draft.dependencies,
            project_id: draft.project_id,
            created_at,
            updated_at: created_at,
            status_log,
            board_log,
            update_trail: UpdateTrail::new(),
        }
    }

    /// Record a status transition: appends to the log and refreshes the
    /// convenience copy.
    pub fn record_status(&mut self, status: Status, at: DateTime<Utc>, by: &str) {
        self.status_log.record(status, at, by);
        self.status = status;
    }

    /// Record a board move. A prior binding gets a compensating `removed`
    /// entry before the `added` entry for the new board; both share one
    /// timestamp. Moving to the board the issue already sits on is a no-op.
    pub fn record_board_move(
        &mut self,
        board_id: Option<&str>,
        at: DateTime<Utc>,
        by: &str,
        reason: Option<String>,
    ) {
        let previous = self.board_log.current_board().map(ToOwned::to_owned);
        if previous.as_deref() == board_id {
            return;
        }
        if let Some(previous) = previous {
            self.board_log
                .record(&previous, BoardAction::Removed, at, reason.clone(), by);
        }
        if let Some(board_id) = board_id {
            self.board_log
                .record(board_id, BoardAction::Added, at, reason, by);
        }
    }

    /// The board this issue currently sits on, derived from the log.
    #[must_use]
    pub fn current_board(&self) -> Option<&str> {
        self.board_log.current_board()
    }
}

/// Update field names accepted for issues.
const ISSUE_MUTABLE_FIELDS: &[&str] = &[
    "title",
    "description",
    "status",
    "priority",
    "story_points",
    "assignees",
    "parent",
    "dependencies",
    "board_id",
];

fn opt_string(value: Option<&str>) -> Value {
    value.map_or(Value::Null, |s| Value::String(s.to_owned()))
}

impl Document for Issue {
    const COLLECTION: &'static str = "issues";

    fn id(&self) -> &str {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }

    fn set_version(&mut self, version: u64) {
        self.version = version;
    }

    fn mutable_fields() -> &'static [&'static str] {
        ISSUE_MUTABLE_FIELDS
    }

    fn field_value(&self, field: &str) -> Option<Value> {
        match field {
            "title" => Some(Value::String(self.title.clone())),
            "description" => Some(opt_string(self.description.as_deref())),
            "status" => Some(Value::String(self.status.as_str().to_owned())),
            "priority" => Some(Value::String(self.priority.as_str().to_owned())),
            "story_points" => Some(Value::from(self.story_points)),
            "assignees" => serde_json::to_value(&self.assignees).ok(),
            "parent" => Some(opt_string(self.parent.as_deref())),
            "dependencies" => serde_json::to_value(&self.dependencies).ok(),
            "board_id" => Some(opt_string(self.current_board())),
            _ => None,
        }
    }

    fn apply_field(&mut self, field: &str, value: &Value) -> Result<(), FieldError> {
        match field {
            "title" => match value.as_str() {
                Some(title) if !title.trim().is_empty() => {
                    self.title = title.to_owned();
                    Ok(())
                }
                _ => Err(FieldError::invalid(field, "expected a non-empty string")),
            },
            "description" => match value {
                Value::Null => {
                    self.description = None;
                    Ok(())
                }
                Value::String(text) => {
                    self.description = Some(text.clone());
                    Ok(())
                }
                _ => Err(FieldError::invalid(field, "expected a string or null")),
            },
            "priority" => value
                .as_str()
                .and_then(|s| s.parse().ok())
                .map(|priority| self.priority = priority)
                .ok_or_else(|| FieldError::invalid(field, "expected low, medium, or high")),
            "story_points" => value
                .as_u64()
                .and_then(|points| u32::try_from(points).ok())
                .map(|points| self.story_points = points)
                .ok_or_else(|| FieldError::invalid(field, "expected a non-negative integer")),
            "assignees" => serde_json::from_value(value.clone())
                .map(|assignees| self.assignees = assignees)
                .map_err(|_| FieldError::invalid(field, "expected an array of user ids")),
            "parent" => match value {
                Value::Null => {
                    self.parent = None;
                    Ok(())
                }
                Value::String(id) if !id.is_empty() => {
                    self.parent = Some(id.clone());
                    Ok(())
                }
                _ => Err(FieldError::invalid(field, "expected an issue id or null")),
            },
            "dependencies" => serde_json::from_value(value.clone())
                .map(|dependencies| self.dependencies = dependencies)
                .map_err(|_| {
                    FieldError::invalid(field, "expected { issues: [..], projects: [..] }")
                }),
            "status" | "board_id" => Err(FieldError::Transition {
                field: field.to_owned(),
            }),
            _ => Err(FieldError::Unknown {
                field: field.to_owned(),
            }),
        }
    }

    fn update_trail(&self) -> &UpdateTrail {
        &self.update_trail
    }

    fn update_trail_mut(&mut self) -> &mut UpdateTrail {
        &mut self.update_trail
    }

    fn touch(&mut self, at: DateTime<Utc>) {
        self.updated_at = at;
    }
}

#[cfg(test)]
mod tests {
    use super::{Document, FieldError, Issue, IssueDraft, Kind, Priority, Status};
    use chrono::{TimeZone, Utc};
    use serde_json::{Value, json};
    use std::str::FromStr;

    fn draft() -> IssueDraft {
        let mut draft = IssueDraft::new("Fix login retry", Kind::Task, "alice");
        draft.story_points = 3;
        draft.board_id = Some("sprint-1".to_owned());
        draft.created_at = Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).single();
        draft
    }

    #[test]
    fn enum_json_roundtrips() {
        assert_eq!(serde_json::to_string(&Kind::Task).unwrap(), "\"task\"");
        assert_eq!(
            serde_json::to_string(&Status::InProgress).unwrap(),
            "\"in-progress\""
        );
        assert_eq!(serde_json::to_string(&Priority::High).unwrap(), "\"high\"");

        assert_eq!(serde_json::from_str::<Kind>("\"bug\"").unwrap(), Kind::Bug);
        assert_eq!(
            serde_json::from_str::<Status>("\"on-hold\"").unwrap(),
            Status::OnHold
        );
    }

    #[test]
    fn display_parse_roundtrips() {
        for value in [Kind::Epic, Kind::Story, Kind::Task, Kind::Bug, Kind::Subtask] {
            assert_eq!(Kind::from_str(&value.to_string()).unwrap(), value);
        }
        for value in [
            Status::Backlog,
            Status::Todo,
            Status::InProgress,
            Status::Review,
            Status::OnHold,
            Status::Done,
            Status::Cancelled,
        ] {
            assert_eq!(Status::from_str(&value.to_string()).unwrap(), value);
        }
        for value in [Priority::Low, Priority::Medium, Priority::High] {
            assert_eq!(Priority::from_str(&value.to_string()).unwrap(), value);
        }
    }

    #[test]
    fn parse_rejects_unknown_values() {
        assert!(Kind::from_str("initiative").is_err());
        assert!(Status::from_str("active").is_err());
        assert!(Priority::from_str("urgent").is_err());
    }

    #[test]
    fn from_draft_seeds_status_and_board_history() {
        let issue = Issue::from_draft("TASK-F-00001-01".to_owned(), draft());

        assert_eq!(issue.status_log.len(), 1);
        assert_eq!(issue.status_log.current().unwrap().status, Status::Backlog);
        assert_eq!(issue.status_log.current().unwrap().timestamp, issue.created_at);
        assert_eq!(issue.current_board(), Some("sprint-1"));
        assert!(issue.update_trail.is_empty());
        assert_eq!(issue.version, 0);
    }

    #[test]
    fn record_status_keeps_field_and_log_in_lockstep() {
        let mut issue = Issue::from_draft("TASK-F-00001-01".to_owned(), draft());
        let at = Utc.with_ymd_and_hms(2024, 1, 2, 10, 0, 0).single().unwrap();

        issue.record_status(Status::Done, at, "bob");

        assert_eq!(issue.status, Status::Done);
        assert_eq!(issue.status_log.len(), 2);
        assert_eq!(issue.status_log.current().unwrap().changed_by, "bob");
    }

    #[test]
    fn board_move_appends_a_removed_added_pair() {
        let mut issue = Issue::from_draft("TASK-F-00001-01".to_owned(), draft());
        let at = Utc.with_ymd_and_hms(2024, 1, 3, 10, 0, 0).single().unwrap();

        issue.record_board_move(Some("sprint-2"), at, "bob", Some("scope change".to_owned()));

        let entries = issue.board_log.entries();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[1].board_id, "sprint-1");
        assert_eq!(entries[1].action.as_str(), "removed");
        assert_eq!(entries[2].board_id, "sprint-2");
        assert_eq!(entries[2].action.as_str(), "added");
        assert_eq!(entries[1].timestamp, entries[2].timestamp);
        assert_eq!(issue.current_board(), Some("sprint-2"));
    }

    #[test]
    fn board_move_to_same_board_is_a_no_op() {
        let mut issue = Issue::from_draft("TASK-F-00001-01".to_owned(), draft());
        let at = Utc.with_ymd_and_hms(2024, 1, 3, 10, 0, 0).single().unwrap();

        issue.record_board_move(Some("sprint-1"), at, "bob", None);
        assert_eq!(issue.board_log.len(), 1);
    }

    #[test]
    fn field_value_materializes_the_derived_board() {
        let issue = Issue::from_draft("TASK-F-00001-01".to_owned(), draft());
        assert_eq!(issue.field_value("board_id"), Some(json!("sprint-1")));
        assert_eq!(issue.field_value("story_points"), Some(json!(3)));
        assert_eq!(issue.field_value("watchers"), None);
    }

    #[test]
    fn apply_field_rejects_bad_shapes() {
        let mut issue = Issue::from_draft("TASK-F-00001-01".to_owned(), draft());

        assert!(matches!(
            issue.apply_field("title", &json!("")),
            Err(FieldError::Invalid { .. })
        ));
        assert!(matches!(
            issue.apply_field("story_points", &json!(-2)),
            Err(FieldError::Invalid { .. })
        ));
        assert!(matches!(
            issue.apply_field("priority", &json!("urgent")),
            Err(FieldError::Invalid { .. })
        ));
        assert!(matches!(
            issue.apply_field("status", &json!("done")),
            Err(FieldError::Transition { .. })
        ));
        assert!(matches!(
            issue.apply_field("votes", &json!(3)),
            Err(FieldError::Unknown { .. })
        ));
    }

    #[test]
    fn apply_field_assigns_plain_fields() {
        let mut issue = Issue::from_draft("TASK-F-00001-01".to_owned(), draft());

        issue.apply_field("title", &json!("Fix login retry loop")).unwrap();
        issue.apply_field("priority", &json!("high")).unwrap();
        issue.apply_field("assignees", &json!(["bob", "carol"])).unwrap();
        issue.apply_field("description", &Value::Null).unwrap();

        assert_eq!(issue.title, "Fix login retry loop");
        assert_eq!(issue.priority, Priority::High);
        assert_eq!(issue.assignees, vec!["bob", "carol"]);
        assert_eq!(issue.description, None);
    }

    #[test]
    fn issue_json_roundtrips() {
        let issue = Issue::from_draft("TASK-F-00001-01".to_owned(), draft());
        let raw = serde_json::to_string(&issue).unwrap();
        let back: Issue = serde_json::from_str(&raw).unwrap();
        assert_eq!(back, issue);
    }
}
