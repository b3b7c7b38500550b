use async_trait::async_trait;

use super::StructuringError;
use crate::models::analysis::AnalysisDocument;

/// Generative model boundary (allows mocking).
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Send one prompt and return the raw completion text.
    async fn generate(&self, prompt: &str, system: &str) -> Result<String, StructuringError>;

    fn model_name(&self) -> &str;
}

/// Outcome of structuring one whitepaper.
#[derive(Debug, Clone, PartialEq)]
pub struct StructuredAnalysis {
    pub document: AnalysisDocument,
    /// Model calls made, including the successful one.
    pub attempts: usize,
    /// Repair stage whose output parsed, or `None` for the fallback document.
    pub repair_stage: Option<&'static str>,
}

impl StructuredAnalysis {
    /// True when every attempt produced unusable output and the document is
    /// the fallback.
    pub fn is_degraded(&self) -> bool {
        self.repair_stage.is_none()
    }
}
