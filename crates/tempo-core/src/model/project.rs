//! Project aggregate.
//!
//! Projects share the issue's document shape (id, version, allow-listed
//! mutable fields, bounded update trail) with a different field set and no
//! transition logs; project status is a plain field.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::{fmt, str::FromStr};

use crate::history::trail::UpdateTrail;
use crate::model::entity::{Document, FieldError};
use crate::model::issue::{ParseEnumError, Priority};

/// Project lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProjectStatus {
    #[default]
    Planning,
    Active,
    OnHold,
    Completed,
}

impl ProjectStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Planning => "planning",
            Self::Active => "active",
            Self::OnHold => "on-hold",
            Self::Completed => "completed",
        }
    }
}

impl fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProjectStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "planning" => Ok(Self::Planning),
            "active" => Ok(Self::Active),
            "on-hold" => Ok(Self::OnHold),
            "completed" => Ok(Self::Completed),
            _ => Err(ParseEnumError {
                expected: "project status",
                got: s.to_string(),
            }),
        }
    }
}

/// Unit for a project-level effort estimate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EstimateUnit {
    Minutes,
    #[default]
    Hours,
    Days,
}

/// Rough effort estimate; `amount: None` means not estimated yet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Estimate {
    pub amount: Option<u32>,
    pub unit: EstimateUnit,
}

/// Accent colors assigned round-robin-by-chance at creation.
pub const PROJECT_COLORS: [&str; 7] = [
    "#FFC107", "#FF5722", "#4CAF50", "#9C27B0", "#03A9F4", "#F44336", "#CDDC39",
];

/// A tracked project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub version: u64,
    pub name: String,
    pub description: Option<String>,
    pub status: ProjectStatus,
    pub priority: Priority,
    pub estimate: Estimate,
    pub team: Vec<String>,
    pub color: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub update_trail: UpdateTrail,
}

/// Creation-time shape for a project.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectDraft {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub estimate: Estimate,
    #[serde(default)]
    pub team: Vec<String>,
    pub created_by: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl ProjectDraft {
    #[must_use]
    pub fn new(name: impl Into<String>, created_by: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            priority: Priority::default(),
            estimate: Estimate::default(),
            team: Vec::new(),
            created_by: created_by.into(),
            created_at: None,
        }
    }
}

impl Project {
    /// Materialize a project from a validated draft with a pre-picked
    /// accent color.
    #[must_use]
    pub fn from_draft(id: String, color: String, draft: ProjectDraft) -> Self {
        let created_at = draft.created_at.unwrap_or_else(Utc::now);
        Self {
            id,
            version: 0,
            name: draft.name,
            description: draft.description,
            status: ProjectStatus::default(),
            priority: draft.priority,
            estimate: draft.estimate,
            team: draft.team,
            color,
            created_at,
            updated_at: created_at,
            update_trail: UpdateTrail::new(),
        }
    }
}

/// Update field names accepted for projects.
const PROJECT_MUTABLE_FIELDS: &[&str] = &[
    "name",
    "description",
    "status",
    "priority",
    "estimate",
    "team",
];

impl Document for Project {
    const COLLECTION: &'static str = "projects";

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
        PROJECT_MUTABLE_FIELDS
    }

    fn field_value(&self, field: &str) -> Option<Value> {
        match field {
            "name" => Some(Value::String(self.name.clone())),
            "description" => Some(
                self.description
                    .as_deref()
                    .map_or(Value::Null, |s| Value::String(s.to_owned())),
            ),
            "status" => Some(Value::String(self.status.as_str().to_owned())),
            "priority" => Some(Value::String(self.priority.as_str().to_owned())),
            "estimate" => serde_json::to_value(&self.estimate).ok(),
            "team" => serde_json::to_value(&self.team).ok(),
            _ => None,
        }
    }

    fn apply_field(&mut self, field: &str, value: &Value) -> Result<(), FieldError> {
        match field {
            "name" => match value.as_str() {
                Some(name) if !name.trim().is_empty() => {
                    self.name = name.to_owned();
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
            "status" => value
                .as_str()
                .and_then(|s| s.parse().ok())
                .map(|status| self.status = status)
                .ok_or_else(|| {
                    FieldError::invalid(field, "expected planning, active, on-hold, or completed")
                }),
            "priority" => value
                .as_str()
                .and_then(|s| s.parse().ok())
                .map(|priority| self.priority = priority)
                .ok_or_else(|| FieldError::invalid(field, "expected low, medium, or high")),
            "estimate" => serde_json::from_value(value.clone())
                .map(|estimate| self.estimate = estimate)
                .map_err(|_| FieldError::invalid(field, "expected { amount, unit }")),
            "team" => serde_json::from_value(value.clone())
                .map(|team| self.team = team)
                .map_err(|_| FieldError::invalid(field, "expected an array of user ids")),
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
