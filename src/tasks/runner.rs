//! Drives one task from `Pending` to a terminal state.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::task::JoinHandle;
use uuid::Uuid;

use super::artifact::SourceArtifact;
use super::error::{AnalysisError, TaskStoreError};
use super::store::TaskStore;
use crate::models::analysis::AnalysisDocument;
use crate::models::enums::TaskStatus;
use crate::models::task::{
    Task, PROGRESS_GENERATION_REQUESTED, PROGRESS_NORMALIZED, PROGRESS_TEXT_EXTRACTED,
};
use crate::pipeline::extraction::DocumentExtractor;
use crate::pipeline::structuring::AnalysisStructurer;

pub struct TaskOrchestrator {
    store: Arc<dyn TaskStore>,
    extractor: Arc<dyn DocumentExtractor>,
    /// `None` when no model API is configured; tasks then fail at start.
    structurer: Option<Arc<AnalysisStructurer>>,
}

impl TaskOrchestrator {
    pub fn new(
        store: Arc<dyn TaskStore>,
        extractor: Arc<dyn DocumentExtractor>,
        structurer: Option<Arc<AnalysisStructurer>>,
    ) -> Self {
        Self {
            store,
            extractor,
            structurer,
        }
    }

    pub fn store(&self) -> &Arc<dyn TaskStore> {
        &self.store
    }

    pub fn is_llm_configured(&self) -> bool {
        self.structurer.is_some()
    }

    /// Register a new `Pending` task that owns the file at `source`.
    pub fn submit(&self, id: Uuid, filename: &str, source: PathBuf) -> Result<Task, TaskStoreError> {
        let task = Task::new(id, filename, source);
        self.store.create(task.clone())?;
        tracing::info!(task_id = %id, filename, "Task submitted");
        Ok(task)
    }

    /// Move a `Pending` task to `Processing` and run it in the background.
    ///
    /// The state check and the transition happen under the store lock, so
    /// of several concurrent calls exactly one succeeds. The handle resolves
    /// to the terminal status, or to `None` if the task was deleted first.
    pub fn start(self: &Arc<Self>, id: Uuid) -> Result<JoinHandle<Option<TaskStatus>>, TaskStoreError> {
        let task = self.store.update(&id, &mut |t: &mut Task| t.start())?;
        let source = task.source_location().cloned();
        tracing::info!(task_id = %id, "Task processing started");

        let this = Arc::clone(self);
        Ok(tokio::spawn(async move { this.drive(id, source).await }))
    }

    async fn drive(self: Arc<Self>, id: Uuid, source: Option<PathBuf>) -> Option<TaskStatus> {
        let mut artifact = source.map(SourceArtifact::new);
        let path = artifact.as_ref().and_then(|a| a.path()).map(|p| p.to_path_buf());

        // Run the pipeline as its own task so a panic becomes a failure.
        let this = Arc::clone(&self);
        let outcome = match tokio::spawn(async move { this.process(id, path).await }).await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!(task_id = %id, error = %e, "Analysis pipeline aborted");
                Err(AnalysisError::Internal("Analysis pipeline aborted unexpectedly".into()))
            }
        };

        if let Some(artifact) = artifact.as_mut() {
            artifact.remove();
        }
        self.finish(id, outcome)
    }

    /// Record the terminal state.
    fn finish(&self, id: Uuid, outcome: Result<AnalysisDocument, AnalysisError>) -> Option<TaskStatus> {
        let result = self.store.update(&id, &mut |t: &mut Task| {
            t.clear_source();
            match &outcome {
                Ok(document) => t.complete(document.clone()),
                Err(e) => t.fail(&e.to_string()),
            }
        });

        match result {
            Ok(task) => {
                match &outcome {
                    Ok(_) => tracing::info!(task_id = %id, "Task completed"),
                    Err(e) => tracing::warn!(task_id = %id, error = %e, "Task failed"),
                }
                Some(task.status())
            }
            Err(TaskStoreError::NotFound(_)) => {
                tracing::info!(task_id = %id, "Task deleted before it finished");
                None
            }
            Err(e) => {
                tracing::error!(task_id = %id, error = %e, "Failed to record task outcome");
                None
            }
        }
    }

    async fn process(
        &self,
        id: Uuid,
        path: Option<PathBuf>,
    ) -> Result<AnalysisDocument, AnalysisError> {
        let structurer = self.structurer.clone().ok_or_else(|| {
            AnalysisError::Configuration("no API key configured for the model API".into())
        })?;
        let path = path.ok_or_else(|| {
            AnalysisError::Validation("source file is no longer available".into())
        })?;

        let extractor = Arc::clone(&self.extractor);
        let text = tokio::task::spawn_blocking(move || {
            extractor.validate(&path)?;
            extractor.extract_text(&path)
        })
        .await
        .map_err(|e| AnalysisError::Internal(format!("text extraction aborted: {e}")))??;
        self.checkpoint(id, PROGRESS_TEXT_EXTRACTED)?;

        self.checkpoint(id, PROGRESS_GENERATION_REQUESTED)?;
        let analysis = structurer.structure(&id, &text).await?;
        if analysis.is_degraded() {
            tracing::warn!(task_id = %id, attempts = analysis.attempts, "Completing with fallback analysis");
        }
        self.checkpoint(id, PROGRESS_NORMALIZED)?;

        Ok(analysis.document)
    }

    fn checkpoint(&self, id: Uuid, progress: u8) -> Result<(), AnalysisError> {
        self.store
            .update(&id, &mut |t: &mut Task| t.advance(progress))
            .map(|_| ())
            .map_err(AnalysisError::from)
    }
}
