use std::sync::Arc;
use std::time::Duration;

use coaching::text::clean_model_output;
use tracing::{debug, warn};

use super::AgentError;
use crate::llm::ChatBackend;
use crate::prompts;

/// Writes the strategy-guided argument.
pub struct CoachedDebater {
    backend: Arc<dyn ChatBackend>,
    model: String,
    attempts: u32,
    retry_delay: Duration,
}

impl CoachedDebater {
    pub fn new(
        backend: Arc<dyn ChatBackend>,
        model: impl Into<String>,
        attempts: u32,
        retry_delay: Duration,
    ) -> Self {
        Self {
            backend,
            model: model.into(),
            attempts: attempts.max(1),
            retry_delay,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Generate an argument following `instruction`.
    ///
    /// Empty or symbol-only replies are retried up to the configured
    /// attempt count. Backend errors are returned immediately.
    pub async fn argue(
        &self,
        instruction: &str,
        topic: &str,
        reference: &str,
        previous: &[String],
    ) -> Result<String, AgentError> {
        let messages = prompts::coached_messages(instruction, topic, reference, previous);

        for attempt in 1..=self.attempts {
            let raw = self.backend.complete(&self.model, &messages).await?;
            let cleaned = clean_model_output(&raw);
            if !cleaned.is_empty() {
                debug!(attempt, chars = cleaned.len(), "Coached argument generated");
                return Ok(cleaned);
            }

            warn!(attempt, max = self.attempts, "Coached argument came back empty");
            if attempt < self.attempts {
                tokio::time::sleep(self.retry_delay).await;
            }
        }

        Err(AgentError::EmptyOutput {
            attempts: self.attempts,
        })
    }
}
