use std::sync::Arc;

use coaching::text::clean_model_output;

use super::AgentError;
use crate::llm::ChatBackend;
use crate::prompts;

/// Rebuts the coached argument.
pub struct OpponentDebater {
    backend: Arc<dyn ChatBackend>,
    model: String,
}

impl OpponentDebater {
    pub fn new(backend: Arc<dyn ChatBackend>, model: impl Into<String>) -> Self {
        Self {
            backend,
            model: model.into(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Cleaned rebuttal of `argument`. May be empty if the model said nothing usable.
    pub async fn rebut(
        &self,
        argument: &str,
        topic: &str,
        reference: &str,
    ) -> Result<String, AgentError> {
        let messages = prompts::opponent_messages(argument, topic, reference);
        let raw = self.backend.complete(&self.model, &messages).await?;
        Ok(clean_model_output(&raw))
    }
}
