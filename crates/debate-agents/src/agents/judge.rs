use std::sync::Arc;

use coaching::{evaluate, ScoreRecord};
use tracing::debug;

use crate::llm::{ChatBackend, LlmError};
use crate::prompts;

/// Scores both arguments and normalizes the verdict.
pub struct JudgeAgent {
    backend: Arc<dyn ChatBackend>,
    model: String,
}

impl JudgeAgent {
    pub fn new(backend: Arc<dyn ChatBackend>, model: impl Into<String>) -> Self {
        Self {
            backend,
            model: model.into(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Ask the judge model for scores. Unparseable verdicts still produce a
    /// complete record; only a failed call is an error.
    pub async fn judge(
        &self,
        topic: &str,
        coached: &str,
        opponent: &str,
        reference: &str,
    ) -> Result<ScoreRecord, LlmError> {
        let messages = prompts::judge_messages(topic, coached, opponent, reference);
        let raw = self.backend.complete(&self.model, &messages).await?;
        let record = evaluate(raw);
        debug!(
            total_coached = record.total_coached,
            total_opponent = record.total_opponent,
            fallback = record.is_fallback(),
            "Judge verdict normalized"
        );
        Ok(record)
    }
}
