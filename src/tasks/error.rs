use thiserror::Error;
use uuid::Uuid;

use crate::models::task::TransitionError;
use crate::pipeline::extraction::ExtractionError;
use crate::pipeline::structuring::StructuringError;

#[derive(Error, Debug)]
pub enum TaskStoreError {
    #[error("Task not found: {0}")]
    NotFound(Uuid),

    #[error("Task already exists: {0}")]
    AlreadyExists(Uuid),

    #[error("Internal lock error")]
    LockPoisoned,

    #[error(transparent)]
    Transition(#[from] TransitionError),
}

/// Why a task ended `Failed`. The display text is what the task records.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AnalysisError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Text extraction failed: {0}")]
    Extraction(String),

    #[error("Analysis generation failed: {0}")]
    Generation(String),

    #[error("Model API is not configured: {0}")]
    Configuration(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<ExtractionError> for AnalysisError {
    fn from(e: ExtractionError) -> Self {
        if e.is_validation() {
            Self::Validation(e.to_string())
        } else {
            Self::Extraction(e.to_string())
        }
    }
}

impl From<StructuringError> for AnalysisError {
    fn from(e: StructuringError) -> Self {
        match e {
            e if e.is_configuration() => Self::Configuration(e.to_string()),
            StructuringError::EmptyInput => Self::Extraction(e.to_string()),
            e => Self::Generation(e.to_string()),
        }
    }
}

impl From<TaskStoreError> for AnalysisError {
    fn from(e: TaskStoreError) -> Self {
        Self::Internal(e.to_string())
    }
}
