//! Per-debate transcript storage.
//!
//! Each debate gets a directory under the data dir named
//! `<sanitized-topic>_<unix-seconds>`, holding two JSON Lines files: one
//! row per round (`debate.jsonl`) and one judged score record per round
//! (`judge.jsonl`).

use std::collections::BTreeMap;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::judge::ScoreRecord;
use crate::text::sanitize_topic;

const DEBATE_FILE: &str = "debate.jsonl";
const JUDGE_FILE: &str = "judge.jsonl";

/// Errors from transcript storage.
#[derive(Debug, Error)]
pub enum TranscriptError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Corrupt entry at {path}:{line}: {reason}")]
    CorruptEntry {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    #[error("Invalid debate id: {0:?}")]
    InvalidId(String),
}

/// Result type for transcript operations
pub type TranscriptResult<T> = Result<T, TranscriptError>;

fn io_err(path: &Path) -> impl FnOnce(std::io::Error) -> TranscriptError + '_ {
    move |source| TranscriptError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// One debate round as played.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundEntry {
    /// Round number (1-indexed).
    pub round: u32,
    pub speaker: String,
    pub coached_argument: String,
    pub opponent_argument: String,
    /// Template index the bandit chose.
    pub action: usize,
    /// `total_coached - total_opponent` for this round.
    pub reward: f64,
    pub recorded_at: DateTime<Utc>,
}

/// The judge's normalized scores for one round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JudgeEntry {
    pub round: u32,
    #[serde(flatten)]
    pub record: ScoreRecord,
}

/// Who won a debate, by summed totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Winner {
    Coached,
    Opponent,
    Tie,
}

impl std::fmt::Display for Winner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Coached => write!(f, "Coach Debater Wins!"),
            Self::Opponent => write!(f, "Opponent Wins!"),
            Self::Tie => write!(f, "It's a Tie!"),
        }
    }
}

/// Average reward observed for one strategy within a debate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyReward {
    pub action: usize,
    pub rounds: usize,
    pub average_reward: f64,
}

/// Aggregate view of a finished (or in-progress) debate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebateSummary {
    pub rounds: usize,
    pub average_coached: f64,
    pub average_opponent: f64,
    pub sum_coached: f64,
    pub sum_opponent: f64,
    pub average_reward: f64,
    pub winner: Winner,
    pub strategies: Vec<StrategyReward>,
}

impl DebateSummary {
    /// Summarize a debate. `None` when nothing has been judged yet.
    pub fn from_judgements(rounds: &[RoundEntry], judgements: &[JudgeEntry]) -> Option<Self> {
        if judgements.is_empty() {
            return None;
        }

        let n = judgements.len() as f64;
        let sum_coached: f64 = judgements.iter().map(|j| j.record.total_coached).sum();
        let sum_opponent: f64 = judgements.iter().map(|j| j.record.total_opponent).sum();

        let winner = if sum_coached > sum_opponent {
            Winner::Coached
        } else if sum_opponent > sum_coached {
            Winner::Opponent
        } else {
            Winner::Tie
        };

        let average_reward = if rounds.is_empty() {
            0.0
        } else {
            rounds.iter().map(|r| r.reward).sum::<f64>() / rounds.len() as f64
        };

        let mut by_action: BTreeMap<usize, (usize, f64)> = BTreeMap::new();
        for entry in rounds {
            let slot = by_action.entry(entry.action).or_default();
            slot.0 += 1;
            slot.1 += entry.reward;
        }
        let strategies = by_action
            .into_iter()
            .map(|(action, (count, sum))| StrategyReward {
                action,
                rounds: count,
                average_reward: sum / count as f64,
            })
            .collect();

        Some(Self {
            rounds: judgements.len(),
            average_coached: sum_coached / n,
            average_opponent: sum_opponent / n,
            sum_coached,
            sum_opponent,
            average_reward,
            winner,
            strategies,
        })
    }
}

/// Directory-per-debate transcript store rooted at a data directory.
#[derive(Debug, Clone)]
pub struct TranscriptStore {
    data_dir: PathBuf,
}

impl TranscriptStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Wipe the data directory, including every debate, and recreate it.
    pub fn reset(&self) -> TranscriptResult<()> {
        if self.data_dir.exists() {
            std::fs::remove_dir_all(&self.data_dir).map_err(io_err(&self.data_dir))?;
        }
        std::fs::create_dir_all(&self.data_dir).map_err(io_err(&self.data_dir))?;
        info!(path = %self.data_dir.display(), "Storage reset");
        Ok(())
    }

    /// Create a fresh debate directory and return its id.
    pub fn create_debate(&self, topic: &str) -> TranscriptResult<String> {
        let base = format!("{}_{}", sanitize_topic(topic), Utc::now().timestamp());
        let mut id = base.clone();
        let mut suffix = 1;
        while self.data_dir.join(&id).exists() {
            suffix += 1;
            id = format!("{}-{}", base, suffix);
        }

        let dir = self.data_dir.join(&id);
        std::fs::create_dir_all(&dir).map_err(io_err(&dir))?;
        for file in [DEBATE_FILE, JUDGE_FILE] {
            let path = dir.join(file);
            std::fs::write(&path, "").map_err(io_err(&path))?;
        }

        info!(debate_id = %id, "Debate created");
        Ok(id)
    }

    /// All debate ids, newest first.
    pub fn list_debates(&self) -> TranscriptResult<Vec<String>> {
        if !self.data_dir.exists() {
            return Ok(Vec::new());
        }

        let mut ids = Vec::new();
        for entry in std::fs::read_dir(&self.data_dir).map_err(io_err(&self.data_dir))? {
            let entry = entry.map_err(io_err(&self.data_dir))?;
            if entry.path().is_dir() {
                if let Some(name) = entry.file_name().to_str() {
                    ids.push(name.to_string());
                }
            }
        }
        ids.sort_by(|a, b| debate_timestamp(b).cmp(&debate_timestamp(a)).then(b.cmp(a)));
        Ok(ids)
    }

    pub fn append_round(&self, debate_id: &str, entry: &RoundEntry) -> TranscriptResult<()> {
        let path = self.debate_dir(debate_id)?.join(DEBATE_FILE);
        append_line(&path, entry)
    }

    pub fn append_judge(&self, debate_id: &str, entry: &JudgeEntry) -> TranscriptResult<()> {
        let path = self.debate_dir(debate_id)?.join(JUDGE_FILE);
        append_line(&path, entry)
    }

    /// Round entries in the order written. Empty for an unknown debate.
    pub fn read_rounds(&self, debate_id: &str) -> TranscriptResult<Vec<RoundEntry>> {
        read_lines(&self.debate_dir(debate_id)?.join(DEBATE_FILE))
    }

    /// Judge entries in the order written. Empty for an unknown debate.
    pub fn read_judgements(&self, debate_id: &str) -> TranscriptResult<Vec<JudgeEntry>> {
        read_lines(&self.debate_dir(debate_id)?.join(JUDGE_FILE))
    }

    /// Summary of a stored debate, if anything was judged.
    pub fn summarize(&self, debate_id: &str) -> TranscriptResult<Option<DebateSummary>> {
        let rounds = self.read_rounds(debate_id)?;
        let judgements = self.read_judgements(debate_id)?;
        Ok(DebateSummary::from_judgements(&rounds, &judgements))
    }

    fn debate_dir(&self, debate_id: &str) -> TranscriptResult<PathBuf> {
        let valid = !debate_id.is_empty()
            && debate_id != "."
            && debate_id != ".."
            && !debate_id.contains(['/', '\\']);
        if !valid {
            return Err(TranscriptError::InvalidId(debate_id.to_string()));
        }
        Ok(self.data_dir.join(debate_id))
    }
}

/// Unix seconds embedded after the last `_` of a debate id.
fn debate_timestamp(id: &str) -> i64 {
    id.rsplit_once('_')
        .and_then(|(_, ts)| ts.split('-').next())
        .and_then(|ts| ts.parse().ok())
        .unwrap_or(0)
}

fn append_line<T: Serialize>(path: &Path, value: &T) -> TranscriptResult<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(io_err(parent))?;
    }
    let line = serde_json::to_string(value)?;
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(io_err(path))?;
    writeln!(file, "{}", line).map_err(io_err(path))?;
    Ok(())
}

fn read_lines<T: DeserializeOwned>(path: &Path) -> TranscriptResult<Vec<T>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let content = std::fs::read_to_string(path).map_err(io_err(path))?;
    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| {
            serde_json::from_str(line).map_err(|e| TranscriptError::CorruptEntry {
                path: path.to_path_buf(),
                line: i + 1,
                reason: e.to_string(),
            })
        })
        .collect()
}
