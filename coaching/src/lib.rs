//! Coaching core for LLM-driven debates.
//!
//! This library provides:
//! - An epsilon-greedy bandit that picks a rhetorical strategy template for
//!   the coached debater each round and learns from judged outcomes
//! - A judge-response normalizer that turns unreliable judge output into a
//!   fixed-shape, numerically valid score record
//! - Debate transcript storage and text hygiene helpers used around the loop
//!
//! # Round flow
//!
//! ```text
//! BanditAgent::select ─→ (index, template)
//!        │
//!        ▼
//!  [external: coached argument, opponent rebuttal, judge call]
//!        │
//!        ▼
//! judge::evaluate(raw) ─→ ScoreRecord ─→ reward = total_coached − total_opponent
//!        │
//!        ▼
//! BanditAgent::update(index, reward)
//! ```

pub mod bandit;
pub mod judge;
pub mod templates;
pub mod text;
pub mod transcript;

// Re-export bandit types
pub use bandit::{
    BanditAgent, BanditConfig, BanditError, BanditReport, BanditResult, JsonFilePolicyStore,
    MemoryPolicyStore, PolicyState, PolicyStore, Selection, SelectionMode, StoreError,
    StoreResult, TemplateStat,
};

// Re-export judge types
pub use judge::{evaluate, Dimension, RawJudgeOutput, ScoreRecord, Shape, Side};

// Re-export template and transcript types
pub use templates::{ConfigError, TemplateSet, DEFAULT_TEMPLATES};
pub use transcript::{
    DebateSummary, JudgeEntry, RoundEntry, TranscriptError, TranscriptResult, TranscriptStore,
    Winner,
};
