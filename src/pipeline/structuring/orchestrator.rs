use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use uuid::Uuid;

use super::fallback::fallback_document;
use super::normalize::normalize;
use super::prompt::{build_analysis_prompt, ANALYSIS_SYSTEM_PROMPT};
use super::retry::{run_with_retry, AttemptFailure, RetryPolicy};
use super::types::{LlmClient, StructuredAnalysis};
use super::StructuringError;
use crate::pipeline::repair::{parse_model_output, RepairedJson};

/// Default bound on a single model call.
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(180);

/// Orchestrates whitepaper structuring:
/// prompt → model → sanitize/repair → normalize, retried as a unit.
pub struct AnalysisStructurer {
    llm: Arc<dyn LlmClient>,
    policy: RetryPolicy,
    call_timeout: Duration,
}

impl AnalysisStructurer {
    pub fn new(llm: Arc<dyn LlmClient>, policy: RetryPolicy, call_timeout: Duration) -> Self {
        Self {
            llm,
            policy,
            call_timeout,
        }
    }

    pub fn model_name(&self) -> &str {
        self.llm.model_name()
    }

    /// Produce an analysis document for `text`.
    ///
    /// Model failures are retried per the policy and surface as an error
    /// once the budget is spent. Output that no repair stage can parse is
    /// retried the same way, but when the budget runs out on it the result
    /// is the fallback document rather than an error.
    pub async fn structure(
        &self,
        task_id: &Uuid,
        text: &str,
    ) -> Result<StructuredAnalysis, StructuringError> {
        if text.trim().is_empty() {
            return Err(StructuringError::EmptyInput);
        }
        let prompt = build_analysis_prompt(text);
        let mut attempts = 0;

        let outcome = run_with_retry(&self.policy, |n| {
            attempts = n + 1;
            self.attempt(task_id, &prompt, n)
        })
        .await;

        match outcome {
            Ok(repaired) => Ok(StructuredAnalysis {
                document: normalize(&Value::Object(repaired.object)),
                attempts,
                repair_stage: Some(repaired.stage),
            }),
            Err(AttemptFailure::Unparseable(e)) => {
                tracing::warn!(
                    task_id = %task_id,
                    attempts,
                    error = %e,
                    "Model output unusable on every attempt, returning fallback analysis"
                );
                Ok(StructuredAnalysis {
                    document: fallback_document(),
                    attempts,
                    repair_stage: None,
                })
            }
            Err(AttemptFailure::Generation(e)) | Err(AttemptFailure::Fatal(e)) => Err(e),
        }
    }

    async fn attempt(
        &self,
        task_id: &Uuid,
        prompt: &str,
        n: usize,
    ) -> Result<RepairedJson, AttemptFailure> {
        tracing::info!(
            task_id = %task_id,
            model = %self.llm.model_name(),
            attempt = n + 1,
            max_attempts = self.policy.max_attempts(),
            "Requesting analysis"
        );

        let call = self.llm.generate(prompt, ANALYSIS_SYSTEM_PROMPT);
        let raw = match tokio::time::timeout(self.call_timeout, call).await {
            Ok(Ok(raw)) => raw,
            Ok(Err(e)) => return Err(AttemptFailure::from_call(e)),
            Err(_) => {
                return Err(AttemptFailure::Generation(StructuringError::Timeout(
                    self.call_timeout.as_secs(),
                )))
            }
        };

        let repaired = parse_model_output(&raw).map_err(AttemptFailure::Unparseable)?;
        if repaired.stage != "sanitize" {
            tracing::info!(task_id = %task_id, stage = repaired.stage, "Model output repaired");
        }
        Ok(repaired)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::enums::Recommendation;
    use crate::pipeline::structuring::openai::{MockLlmClient, ScriptedLlmClient};

    const TEXT: &str = "Nova is a sharded proof-of-stake layer one blockchain.";
    const GOOD: &str = r#"Here you go:
```json
{"executive_analysis": {"project_name": "Nova"}, "overall_assessment": {"investment_recommendation": "Buy", "innovation_score": 8}}
```"#;

    fn structurer(llm: Arc<dyn LlmClient>) -> AnalysisStructurer {
        AnalysisStructurer::new(llm, RetryPolicy::new(2, Duration::ZERO), DEFAULT_CALL_TIMEOUT)
    }

    fn unreachable() -> Result<String, StructuringError> {
        Err(StructuringError::Connection("http://model".into()))
    }

    fn prose() -> Result<String, StructuringError> {
        Ok("I cannot produce JSON for this document.".into())
    }

    fn good() -> Result<String, StructuringError> {
        Ok(GOOD.into())
    }

    #[tokio::test]
    async fn clean_response_is_normalized() {
        let s = structurer(Arc::new(MockLlmClient::new(GOOD)));
        let analysis = s.structure(&Uuid::new_v4(), TEXT).await.unwrap();
        assert_eq!(analysis.attempts, 1);
        assert_eq!(analysis.repair_stage, Some("sanitize"));
        assert_eq!(analysis.document.executive_analysis.project_name, "Nova");
        assert_eq!(analysis.document.overall_assessment.innovation_score, 8);
        assert!(!analysis.is_degraded());
    }

    #[tokio::test]
    async fn succeeds_on_third_attempt_after_two_failures() {
        let llm = Arc::new(ScriptedLlmClient::new(vec![unreachable(), unreachable()], good));
        let s = structurer(llm.clone());
        let analysis = s.structure(&Uuid::new_v4(), TEXT).await.unwrap();
        assert_eq!(analysis.attempts, 3);
        assert_eq!(llm.calls(), 3);
        assert_eq!(
            analysis.document.overall_assessment.investment_recommendation,
            Recommendation::Buy
        );
    }

    #[tokio::test]
    async fn fails_when_model_is_unreachable_on_every_attempt() {
        let llm = Arc::new(ScriptedLlmClient::new(vec![], unreachable));
        let s = structurer(llm.clone());
        let err = s.structure(&Uuid::new_v4(), TEXT).await.unwrap_err();
        assert!(matches!(err, StructuringError::Connection(_)));
        assert_eq!(llm.calls(), 3);
    }

    #[tokio::test]
    async fn unparseable_output_on_every_attempt_yields_fallback() {
        let llm = Arc::new(ScriptedLlmClient::new(vec![], prose));
        let s = structurer(llm.clone());
        let analysis = s.structure(&Uuid::new_v4(), TEXT).await.unwrap();
        assert!(analysis.is_degraded());
        assert_eq!(analysis.attempts, 3);
        assert_eq!(llm.calls(), 3);
        assert_eq!(
            analysis.document.overall_assessment.investment_recommendation,
            Recommendation::Avoid
        );
    }

    #[tokio::test]
    async fn unparseable_output_is_reissued_not_reparsed() {
        let llm = Arc::new(ScriptedLlmClient::new(vec![prose()], good));
        let s = structurer(llm.clone());
        let analysis = s.structure(&Uuid::new_v4(), TEXT).await.unwrap();
        assert!(!analysis.is_degraded());
        assert_eq!(analysis.attempts, 2);
    }

    #[tokio::test]
    async fn rejected_credentials_fail_without_retry() {
        let llm = Arc::new(ScriptedLlmClient::new(vec![], || {
            Err(StructuringError::Unauthorized(401))
        }));
        let s = structurer(llm.clone());
        let err = s.structure(&Uuid::new_v4(), TEXT).await.unwrap_err();
        assert!(err.is_configuration());
        assert_eq!(llm.calls(), 1);
    }

    #[tokio::test]
    async fn slow_model_call_times_out_and_is_retried() {
        let llm = Arc::new(
            ScriptedLlmClient::new(vec![], good).with_delay(Duration::from_millis(200)),
        );
        let s = AnalysisStructurer::new(
            llm.clone(),
            RetryPolicy::new(1, Duration::ZERO),
            Duration::from_millis(20),
        );
        let err = s.structure(&Uuid::new_v4(), TEXT).await.unwrap_err();
        assert!(matches!(err, StructuringError::Timeout(_)));
        assert_eq!(llm.calls(), 2);
    }

    #[tokio::test]
    async fn empty_text_is_rejected_before_any_call() {
        let llm = Arc::new(ScriptedLlmClient::new(vec![], good));
        let s = structurer(llm.clone());
        assert!(matches!(
            s.structure(&Uuid::new_v4(), "  \n").await,
            Err(StructuringError::EmptyInput)
        ));
        assert_eq!(llm.calls(), 0);
    }
}
