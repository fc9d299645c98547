//! The three debate roles.
//!
//! Every agent shares one [`ChatBackend`] and differs only in prompt and
//! model. [`AgentSet`] builds all three from a [`DebateConfig`].

pub mod debater;
pub mod judge;
pub mod opponent;

use std::sync::Arc;

use thiserror::Error;

use crate::config::DebateConfig;
use crate::llm::{ChatBackend, LlmError};

pub use debater::CoachedDebater;
pub use judge::JudgeAgent;
pub use opponent::OpponentDebater;

/// Errors from argument generation.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error(transparent)]
    Llm(#[from] LlmError),

    #[error("model returned no usable text after {attempts} attempt(s)")]
    EmptyOutput { attempts: u32 },
}

/// Debater, opponent, and judge wired to one backend.
pub struct AgentSet {
    pub debater: CoachedDebater,
    pub opponent: OpponentDebater,
    pub judge: JudgeAgent,
}

impl AgentSet {
    pub fn new(config: &DebateConfig, backend: Arc<dyn ChatBackend>) -> Self {
        Self {
            debater: CoachedDebater::new(
                Arc::clone(&backend),
                &config.models.coached,
                config.coached_attempts,
                config.retry_delay,
            ),
            opponent: OpponentDebater::new(Arc::clone(&backend), &config.models.opponent),
            judge: JudgeAgent::new(backend, &config.models.judge),
        }
    }
}
