//! Application state shared by every HTTP handler.
//!
//! Built once at startup from [`AppConfig`] and wrapped in `Arc`. Holds the
//! task store and the orchestrator that drives tasks; neither needs an
//! outer lock.

use std::sync::Arc;

use crate::config::AppConfig;
use crate::pipeline::extraction::{DocumentExtractor, PdfTextExtractor};
use crate::pipeline::structuring::{AnalysisStructurer, ChatCompletionsClient, LlmClient};
use crate::tasks::{InMemoryTaskStore, TaskOrchestrator, TaskStore};

pub struct CoreState {
    pub config: AppConfig,
    orchestrator: Arc<TaskOrchestrator>,
}

impl CoreState {
    /// Wire up the production components described by `config`.
    ///
    /// Without an API key, or with a client that cannot be built, the
    /// server still starts and tasks fail with a configuration error.
    pub fn new(config: AppConfig) -> Self {
        let llm: Option<Arc<dyn LlmClient>> = match config.api_key.as_deref() {
            Some(key) => match ChatCompletionsClient::new(&config.api_base, key, &config.model) {
                Ok(client) => Some(Arc::new(client)),
                Err(e) => {
                    tracing::error!(error = %e, "Could not create model API client");
                    None
                }
            },
            None => {
                tracing::warn!("No API key configured, analysis requests will fail");
                None
            }
        };
        let extractor = Arc::new(PdfTextExtractor::new(config.max_file_size_mb));
        Self::with_components(config, Arc::new(InMemoryTaskStore::new()), extractor, llm)
    }

    /// Assemble state from explicit collaborators.
    pub fn with_components(
        config: AppConfig,
        store: Arc<dyn TaskStore>,
        extractor: Arc<dyn DocumentExtractor>,
        llm: Option<Arc<dyn LlmClient>>,
    ) -> Self {
        let structurer = llm.map(|llm| {
            Arc::new(AnalysisStructurer::new(
                llm,
                config.retry_policy(),
                config.llm_timeout,
            ))
        });
        let orchestrator = TaskOrchestrator::new(store, extractor, structurer);
        Self {
            config,
            orchestrator: Arc::new(orchestrator),
        }
    }

    pub fn orchestrator(&self) -> &Arc<TaskOrchestrator> {
        &self.orchestrator
    }

    pub fn tasks(&self) -> &Arc<dyn TaskStore> {
        self.orchestrator.store()
    }

    pub fn llm_configured(&self) -> bool {
        self.orchestrator.is_llm_configured()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_without_api_key_is_unconfigured() {
        let state = CoreState::new(AppConfig::default());
        assert!(!state.llm_configured());
        assert!(state.tasks().list().unwrap().is_empty());
    }

    #[test]
    fn state_with_api_key_is_configured() {
        let config = AppConfig::from_lookup(|key| {
            (key == "FINSIGHT_API_KEY").then(|| "sk-test".to_string())
        });
        let state = CoreState::new(config);
        assert!(state.llm_configured());
    }
}
