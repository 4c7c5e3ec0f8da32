use thiserror::Error;

#[derive(Debug, Error)]
pub enum PlanFinanceError {
    #[error("Validation error: {field} — {reason}")]
    Validation { field: String, reason: String },

    #[error("Unknown ratio: {0}")]
    UnknownRatio(String),

    #[error("Version conflict for project {project_id}: stored {stored}, submitted {submitted}")]
    VersionConflict {
        project_id: String,
        stored: u64,
        submitted: u64,
    },

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl PlanFinanceError {
    pub(crate) fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        PlanFinanceError::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

impl From<serde_json::Error> for PlanFinanceError {
    fn from(e: serde_json::Error) -> Self {
        PlanFinanceError::SerializationError(e.to_string())
    }
}
