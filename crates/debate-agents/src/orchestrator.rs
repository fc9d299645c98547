//! Round orchestration: strategy choice, generation, judging, learning.

use std::sync::Arc;

use chrono::Utc;
use coaching::{
    BanditAgent, BanditError, DebateSummary, JudgeEntry, PolicyStore, RoundEntry, ScoreRecord,
    Selection, TranscriptError, TranscriptStore,
};
use thiserror::Error;
use tracing::{info, warn};

use crate::agents::AgentSet;
use crate::config::DebateConfig;
use crate::llm::ChatBackend;
use crate::reference::ReferenceMaterial;

/// Speaker recorded for every round; the coached side always opens.
const OPENING_SPEAKER: &str = "coached";

/// Errors that abort a debate. Model failures never surface here; they
/// are folded into the round as error text or fallback scores.
#[derive(Debug, Error)]
pub enum RunnerError {
    #[error(transparent)]
    Bandit(#[from] BanditError),

    #[error(transparent)]
    Transcript(#[from] TranscriptError),

    #[error("a debate needs at least one round")]
    NoRounds,
}

/// Everything produced by one round.
#[derive(Debug, Clone)]
pub struct RoundOutcome {
    pub round: u32,
    pub selection: Selection,
    pub coached_argument: String,
    pub opponent_argument: String,
    pub record: ScoreRecord,
    pub reward: f64,
}

/// A finished debate.
#[derive(Debug, Clone)]
pub struct DebateOutcome {
    pub debate_id: String,
    pub rounds: Vec<RoundOutcome>,
    pub summary: Option<DebateSummary>,
}

/// Drives debates: the bandit picks a strategy each round, the agents
/// argue and judge, and the reward flows back into the bandit.
pub struct DebateRunner<S: PolicyStore> {
    bandit: BanditAgent<S>,
    agents: AgentSet,
    transcripts: TranscriptStore,
    reference: ReferenceMaterial,
}

impl<S: PolicyStore> DebateRunner<S> {
    /// Build a runner over `store`, initializing the bandit's policy.
    pub fn new(
        config: &DebateConfig,
        backend: Arc<dyn ChatBackend>,
        store: S,
    ) -> Result<Self, RunnerError> {
        let bandit = BanditAgent::new(config.templates.clone(), store, config.bandit_config())?;
        Ok(Self {
            bandit,
            agents: AgentSet::new(config, backend),
            transcripts: TranscriptStore::new(&config.data_dir),
            reference: ReferenceMaterial::new(config.reference_path()),
        })
    }

    pub fn bandit(&self) -> &BanditAgent<S> {
        &self.bandit
    }

    pub fn transcripts(&self) -> &TranscriptStore {
        &self.transcripts
    }

    /// Play one round of `debate_id` and record it.
    ///
    /// The bandit is updated exactly once per call, before the transcript
    /// rows are written.
    pub async fn run_round(
        &self,
        debate_id: &str,
        topic: &str,
        round: u32,
    ) -> Result<RoundOutcome, RunnerError> {
        let selection = self.bandit.select()?;
        info!(
            debate_id,
            round,
            template = selection.index,
            mode = %selection.mode,
            "Strategy selected"
        );

        let previous: Vec<String> = self
            .transcripts
            .read_rounds(debate_id)?
            .into_iter()
            .map(|entry| entry.coached_argument)
            .collect();
        let reference = self.reference.load().unwrap_or_else(|e| {
            warn!(error = %e, "Reference material unreadable, continuing without it");
            String::new()
        });

        let coached_argument = match self
            .agents
            .debater
            .argue(&selection.template, topic, &reference, &previous)
            .await
        {
            Ok(text) => text,
            Err(e) => {
                warn!(round, error = %e, "Coached argument generation failed");
                format!("Error generating coached argument: {}", e)
            }
        };

        let opponent_argument = match self
            .agents
            .opponent
            .rebut(&coached_argument, topic, &reference)
            .await
        {
            Ok(text) => text,
            Err(e) => {
                warn!(round, error = %e, "Opponent generation failed");
                format!("Opponent generation failed: {}", e)
            }
        };

        let record = match self
            .agents
            .judge
            .judge(topic, &coached_argument, &opponent_argument, &reference)
            .await
        {
            Ok(record) => record,
            Err(e) => {
                warn!(round, error = %e, "Judge call failed, using fallback scores");
                ScoreRecord::fallback(&format!("judge call failed: {}", e))
            }
        };

        let reward = record.reward();
        let stat = self.bandit.update(selection.index, reward)?;

        self.transcripts.append_round(
            debate_id,
            &RoundEntry {
                round,
                speaker: OPENING_SPEAKER.to_string(),
                coached_argument: coached_argument.clone(),
                opponent_argument: opponent_argument.clone(),
                action: selection.index,
                reward,
                recorded_at: Utc::now(),
            },
        )?;
        self.transcripts.append_judge(
            debate_id,
            &JudgeEntry {
                round,
                record: record.clone(),
            },
        )?;

        info!(
            debate_id,
            round,
            total_coached = record.total_coached,
            total_opponent = record.total_opponent,
            reward,
            template_avg = stat.average_reward(),
            "Round complete"
        );

        Ok(RoundOutcome {
            round,
            selection,
            coached_argument,
            opponent_argument,
            record,
            reward,
        })
    }

    /// Create a debate on `topic` and play rounds `1..=rounds`.
    pub async fn run_debate(&self, topic: &str, rounds: u32) -> Result<DebateOutcome, RunnerError> {
        if rounds == 0 {
            return Err(RunnerError::NoRounds);
        }

        let debate_id = self.transcripts.create_debate(topic)?;
        info!(debate_id = %debate_id, rounds, "Debate starting");

        let mut played = Vec::with_capacity(rounds as usize);
        for round in 1..=rounds {
            played.push(self.run_round(&debate_id, topic, round).await?);
        }

        let summary = self.transcripts.summarize(&debate_id)?;
        if let Some(ref summary) = summary {
            info!(
                debate_id = %debate_id,
                winner = %summary.winner,
                sum_coached = summary.sum_coached,
                sum_opponent = summary.sum_opponent,
                "Debate finished"
            );
        }

        Ok(DebateOutcome {
            debate_id,
            rounds: played,
            summary,
        })
    }
}
