//! Shared seam between the mutation pipeline and the concrete entity
//! types.
//!
//! Issues and projects have the same *shape* (an id, an optimistic
//! version, an allow-list of mutable fields addressable by name, and a
//! bounded update trail) but different field sets. The diff engine, the
//! orchestrator, and the store all work against this trait instead of the
//! concrete types.

use serde_json::Value;

use crate::error::ErrorCode;
use crate::history::trail::UpdateTrail;

/// Error applying a named field to a document.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FieldError {
    /// The field name is not part of this document type.
    #[error("field '{field}' is not recognized for this document type")]
    Unknown { field: String },

    /// The field exists but the supplied value has the wrong shape.
    #[error("field '{field}' rejected: {reason}")]
    Invalid { field: String, reason: String },

    /// The field changes only through its transition log (status, board
    /// membership), never by direct assignment.
    #[error("field '{field}' changes only through its transition log")]
    Transition { field: String },
}

impl FieldError {
    pub(crate) fn invalid(field: &str, reason: &str) -> Self {
        Self::Invalid {
            field: field.to_owned(),
            reason: reason.to_owned(),
        }
    }

    /// Machine-readable code associated with this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Unknown { .. } => ErrorCode::UnknownField,
            Self::Invalid { .. } | Self::Transition { .. } => ErrorCode::InvalidValue,
        }
    }
}

/// A long-lived, versioned record addressable by the mutation pipeline.
pub trait Document: Clone {
    /// Store collection name, used in error messages and logs.
    const COLLECTION: &'static str;

    fn id(&self) -> &str;

    /// Optimistic-concurrency version; bumped by the store on every
    /// successful replace.
    fn version(&self) -> u64;

    fn set_version(&mut self, version: u64);

    /// The fixed allow-list of field names that may change after creation.
    /// Proposed updates naming anything else are silently dropped.
    fn mutable_fields() -> &'static [&'static str];

    /// Current value of a mutable field, as it would appear in a proposed
    /// update. Returns `None` for names outside the allow-list. Derived
    /// fields (board membership) are materialized here so diffing treats
    /// them uniformly.
    fn field_value(&self, field: &str) -> Option<Value>;

    /// Assign a plain mutable field from a proposed value. Transition
    /// fields refuse with [`FieldError::Transition`]; the orchestrator
    /// routes those through the entity's typed recorders instead.
    fn apply_field(&mut self, field: &str, value: &Value) -> Result<(), FieldError>;

    fn update_trail(&self) -> &UpdateTrail;

    fn update_trail_mut(&mut self) -> &mut UpdateTrail;

    /// Refresh the `updated_at` stamp.
    fn touch(&mut self, at: chrono::DateTime<chrono::Utc>);
}
