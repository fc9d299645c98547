//! LLM-driven coached debates.
//!
//! A [`orchestrator::DebateRunner`] asks the strategy bandit from the
//! `coaching` crate for a template, has the coached debater argue with it,
//! lets the opponent rebut, scores both through the judge, and feeds the
//! score difference back as the bandit's reward.

pub mod agents;
pub mod config;
pub mod llm;
pub mod orchestrator;
pub mod prompts;
pub mod reference;
