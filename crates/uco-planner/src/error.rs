//! Error types for planning

use uco_artifact::RecordError;

/// Planning failure
#[derive(Debug, thiserror::Error)]
pub enum PlannerError {
    /// Input could not be read as records
    #[error("record error: {0}")]
    Record(#[from] RecordError),
}

/// Result alias for planning
pub type Result<T> = std::result::Result<T, PlannerError>;
