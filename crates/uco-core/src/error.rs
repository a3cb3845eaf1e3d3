//! Error types for UCO Core

use uco_artifact::RecordError;
use uco_ontology::OntologyError;
use uco_planner::PlannerError;

/// Main error type
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// Planner input could not be read
    #[error("planning failed: {0}")]
    Planner(#[from] PlannerError),

    /// Records could not be read
    #[error("invalid records: {0}")]
    Record(#[from] RecordError),

    /// Ontology map could not be read
    #[error("invalid ontology: {0}")]
    Ontology(#[from] OntologyError),

    /// Stored state could not be read
    #[error("invalid plan state: {0}")]
    State(#[source] serde_json::Error),

    /// No session under this id
    #[error("session not found: {0}")]
    SessionNotFound(String),
}

/// Result alias
pub type Result<T> = std::result::Result<T, CoreError>;
