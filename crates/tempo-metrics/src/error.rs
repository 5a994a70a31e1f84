use tempo_core::error::ErrorCode;
use tempo_core::store::StoreError;

/// Failures surfaced by the analytics surface.
///
/// Aggregations are all-or-nothing: an error here means no partial
/// snapshot or half-filled series was produced.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MetricsError {
    #[error("sprint '{id}' not found")]
    SprintNotFound { id: String },

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl MetricsError {
    /// Machine-readable code associated with this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::SprintNotFound { .. } => ErrorCode::SprintNotFound,
            Self::Store(err) => err.code(),
        }
    }
}
