use std::fmt;

/// Machine-readable error codes shared across the engine surface.
///
/// Every typed error in this workspace maps onto one of these codes via a
/// `code()` method, so callers (and the HTTP layer above us) can branch on
/// a stable identifier instead of matching display strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    ConfigParseError,
    EntityNotFound,
    SprintNotFound,
    NoChangesDetected,
    InvalidReference,
    InvalidValue,
    UnknownField,
    ConcurrentModification,
    DuplicateId,
    PersistenceFailure,
    StoreTimeout,
    InternalUnexpected,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::ConfigParseError => "E1001",
            Self::EntityNotFound => "E2001",
            Self::SprintNotFound => "E2002",
            Self::NoChangesDetected => "E2003",
            Self::InvalidReference => "E2004",
            Self::InvalidValue => "E2005",
            Self::UnknownField => "E2006",
            Self::ConcurrentModification => "E3001",
            Self::DuplicateId => "E3002",
            Self::PersistenceFailure => "E5001",
            Self::StoreTimeout => "E5002",
            Self::InternalUnexpected => "E9001",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::ConfigParseError => "Config file parse error",
            Self::EntityNotFound => "Entity not found",
            Self::SprintNotFound => "Sprint not found",
            Self::NoChangesDetected => "No changes detected",
            Self::InvalidReference => "Invalid entity reference",
            Self::InvalidValue => "Invalid field value",
            Self::UnknownField => "Unknown field name",
            Self::ConcurrentModification => "Concurrent modification",
            Self::DuplicateId => "Duplicate id",
            Self::PersistenceFailure => "Store write failed",
            Self::StoreTimeout => "Store call timed out",
            Self::InternalUnexpected => "Internal unexpected error",
        }
    }

    /// Optional remediation hint that can be surfaced to operators.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::ConfigParseError => Some("Fix syntax in tempo.toml and retry."),
            Self::EntityNotFound | Self::SprintNotFound | Self::UnknownField => None,
            Self::NoChangesDetected => {
                Some("The entity already holds the submitted values; nothing was written.")
            }
            Self::InvalidReference => {
                Some("Create the referenced entity first or fix the identifier.")
            }
            Self::InvalidValue => Some("Use one of the documented status/priority/points forms."),
            Self::ConcurrentModification => {
                Some("Re-read the entity and retry against its current version.")
            }
            Self::DuplicateId => Some("Retry the creation; generated ids are time-salted."),
            Self::PersistenceFailure => Some("Check store availability and retry once it recovers."),
            Self::StoreTimeout => Some("Raise [store].timeout_ms or check store health."),
            Self::InternalUnexpected => Some("Retry once. If persistent, report a bug with logs."),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}
