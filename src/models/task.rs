//! Task record and its lifecycle transitions.
//!
//! All state changes go through methods on [`Task`] so the record can never
//! hold a result and an error at once, regress its progress, or leave a
//! terminal state.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::analysis::AnalysisDocument;
use super::enums::TaskStatus;

/// Progress recorded when processing starts.
pub const PROGRESS_STARTED: u8 = 10;
/// Progress once text has been extracted from the source.
pub const PROGRESS_TEXT_EXTRACTED: u8 = 20;
/// Progress once the generation request has been issued.
pub const PROGRESS_GENERATION_REQUESTED: u8 = 50;
/// Progress once the model output has been normalized.
pub const PROGRESS_NORMALIZED: u8 = 90;
pub const PROGRESS_DONE: u8 = 100;

/// Rejected lifecycle transition.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransitionError {
    #[error("Task is {current}, expected {expected}")]
    WrongState {
        current: TaskStatus,
        expected: TaskStatus,
    },
    #[error("Task is already {0}")]
    AlreadyTerminal(TaskStatus),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: Uuid,
    pub filename: String,
    status: TaskStatus,
    progress: u8,
    source_location: Option<PathBuf>,
    result: Option<AnalysisDocument>,
    error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// New pending task owning the artifact at `source_location`.
    pub fn new(id: Uuid, filename: &str, source_location: PathBuf) -> Self {
        let now = Utc::now();
        Self {
            id,
            filename: filename.to_string(),
            status: TaskStatus::Pending,
            progress: 0,
            source_location: Some(source_location),
            result: None,
            error: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn status(&self) -> TaskStatus {
        self.status
    }

    pub fn progress(&self) -> u8 {
        self.progress
    }

    pub fn source_location(&self) -> Option<&PathBuf> {
        self.source_location.as_ref()
    }

    pub fn result(&self) -> Option<&AnalysisDocument> {
        self.result.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Pending → Processing. Anything else is refused, which is what keeps
    /// a task from running twice.
    pub fn start(&mut self) -> Result<(), TransitionError> {
        if self.status != TaskStatus::Pending {
            return Err(TransitionError::WrongState {
                current: self.status,
                expected: TaskStatus::Pending,
            });
        }
        self.status = TaskStatus::Processing;
        self.progress = PROGRESS_STARTED;
        self.touch();
        Ok(())
    }

    /// Advance to a checkpoint. Lower values are ignored.
    pub fn advance(&mut self, checkpoint: u8) -> Result<(), TransitionError> {
        if self.status != TaskStatus::Processing {
            return Err(TransitionError::WrongState {
                current: self.status,
                expected: TaskStatus::Processing,
            });
        }
        let checkpoint = checkpoint.min(PROGRESS_DONE);
        if checkpoint > self.progress {
            self.progress = checkpoint;
            self.touch();
        }
        Ok(())
    }

    pub fn complete(&mut self, document: AnalysisDocument) -> Result<(), TransitionError> {
        self.ensure_processing()?;
        self.status = TaskStatus::Completed;
        self.progress = PROGRESS_DONE;
        self.result = Some(document);
        self.error = None;
        self.touch();
        Ok(())
    }

    /// Mark failed and reset progress. Allowed from Pending as well, for
    /// failures detected before processing could start.
    pub fn fail(&mut self, message: &str) -> Result<(), TransitionError> {
        if self.status.is_terminal() {
            return Err(TransitionError::AlreadyTerminal(self.status));
        }
        self.status = TaskStatus::Failed;
        self.progress = 0;
        self.result = None;
        self.error = Some(if message.trim().is_empty() {
            "Analysis failed".to_string()
        } else {
            message.to_string()
        });
        self.touch();
        Ok(())
    }

    /// Forget the source artifact once it has been removed from disk.
    pub fn clear_source(&mut self) -> Option<PathBuf> {
        let taken = self.source_location.take();
        if taken.is_some() {
            self.touch();
        }
        taken
    }

    fn ensure_processing(&self) -> Result<(), TransitionError> {
        match self.status {
            TaskStatus::Processing => Ok(()),
            s if s.is_terminal() => Err(TransitionError::AlreadyTerminal(s)),
            s => Err(TransitionError::WrongState {
                current: s,
                expected: TaskStatus::Processing,
            }),
        }
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}
