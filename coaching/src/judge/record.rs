//! The normalized score record handed back to the orchestrator.

use serde::{Deserialize, Serialize};

/// Score used for any missing or unparseable rubric value.
pub const DEFAULT_SCORE: u8 = 5;

/// Lowest valid rubric score.
pub const MIN_SCORE: u8 = 1;

/// Highest valid rubric score.
pub const MAX_SCORE: u8 = 10;

/// Note used when the judge gave none for a side.
pub const NO_NOTES: &str = "No notes provided.";

/// Prefix of every fallback note.
pub const FALLBACK_PREFIX: &str = "Fallback: Error parsing judge response";

/// A rubric axis the judge scores each side on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    Logic,
    Relevance,
    Clarity,
    Persuasiveness,
    EvidenceUse,
}

impl Dimension {
    /// All dimensions in rubric order.
    pub const ALL: [Dimension; 5] = [
        Self::Logic,
        Self::Relevance,
        Self::Clarity,
        Self::Persuasiveness,
        Self::EvidenceUse,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Logic => "logic",
            Self::Relevance => "relevance",
            Self::Clarity => "clarity",
            Self::Persuasiveness => "persuasiveness",
            Self::EvidenceUse => "evidence_use",
        }
    }

    /// Canonical flat key, e.g. `logic_coached`.
    pub fn flat_key(self, side: Side) -> String {
        format!("{}_{}", self.as_str(), side.as_str())
    }
}

impl std::fmt::Display for Dimension {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One of the two debaters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Coached,
    Opponent,
}

impl Side {
    pub const BOTH: [Side; 2] = [Self::Coached, Self::Opponent];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Coached => "coached",
            Self::Opponent => "opponent",
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalized scores and notes for one side.
#[derive(Debug, Clone, PartialEq)]
pub struct SideScores {
    /// Sub-scores in [`Dimension::ALL`] order, each in 1..=10.
    pub scores: [u8; 5],
    pub notes: String,
}

impl SideScores {
    /// Neutral scores with the given note.
    pub fn neutral(notes: impl Into<String>) -> Self {
        Self {
            scores: [DEFAULT_SCORE; 5],
            notes: notes.into(),
        }
    }

    /// Arithmetic mean of the five sub-scores.
    pub fn total(&self) -> f64 {
        let sum: u32 = self.scores.iter().map(|&s| u32::from(s)).sum();
        f64::from(sum) / self.scores.len() as f64
    }
}

/// Flat, fixed-key judge result for one round.
///
/// Field names and order match the persisted judge columns. Totals are
/// always the mean of that side's five sub-scores; notes are never empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreRecord {
    pub logic_coached: u8,
    pub relevance_coached: u8,
    pub clarity_coached: u8,
    pub persuasiveness_coached: u8,
    pub evidence_use_coached: u8,
    pub total_coached: f64,
    pub notes_coached: String,
    pub logic_opponent: u8,
    pub relevance_opponent: u8,
    pub clarity_opponent: u8,
    pub persuasiveness_opponent: u8,
    pub evidence_use_opponent: u8,
    pub total_opponent: f64,
    pub notes_opponent: String,
}

impl ScoreRecord {
    /// Assemble a record from per-side scores, computing both totals.
    pub fn from_sides(coached: SideScores, opponent: SideScores) -> Self {
        let total_coached = coached.total();
        let total_opponent = opponent.total();
        let [c_logic, c_relevance, c_clarity, c_persuasiveness, c_evidence] = coached.scores;
        let [o_logic, o_relevance, o_clarity, o_persuasiveness, o_evidence] = opponent.scores;
        Self {
            logic_coached: c_logic,
            relevance_coached: c_relevance,
            clarity_coached: c_clarity,
            persuasiveness_coached: c_persuasiveness,
            evidence_use_coached: c_evidence,
            total_coached,
            notes_coached: coached.notes,
            logic_opponent: o_logic,
            relevance_opponent: o_relevance,
            clarity_opponent: o_clarity,
            persuasiveness_opponent: o_persuasiveness,
            evidence_use_opponent: o_evidence,
            total_opponent,
            notes_opponent: opponent.notes,
        }
    }

    /// Neutral all-5s record whose notes carry `reason`.
    pub fn fallback(reason: &str) -> Self {
        let notes = format!("{} ({}).", FALLBACK_PREFIX, reason);
        Self::from_sides(SideScores::neutral(notes.clone()), SideScores::neutral(notes))
    }

    /// Whether this record came from the fallback path rather than a parsed
    /// judgement. Only the notes distinguish it from a genuine neutral score.
    pub fn is_fallback(&self) -> bool {
        self.notes_coached.starts_with(FALLBACK_PREFIX)
            && self.notes_opponent.starts_with(FALLBACK_PREFIX)
    }

    /// Sub-scores for `side` in [`Dimension::ALL`] order.
    pub fn scores(&self, side: Side) -> [u8; 5] {
        match side {
            Side::Coached => [
                self.logic_coached,
                self.relevance_coached,
                self.clarity_coached,
                self.persuasiveness_coached,
                self.evidence_use_coached,
            ],
            Side::Opponent => [
                self.logic_opponent,
                self.relevance_opponent,
                self.clarity_opponent,
                self.persuasiveness_opponent,
                self.evidence_use_opponent,
            ],
        }
    }

    /// A single sub-score.
    pub fn score(&self, side: Side, dimension: Dimension) -> u8 {
        let index = Dimension::ALL
            .iter()
            .position(|&d| d == dimension)
            .unwrap_or_default();
        self.scores(side)[index]
    }

    pub fn total(&self, side: Side) -> f64 {
        match side {
            Side::Coached => self.total_coached,
            Side::Opponent => self.total_opponent,
        }
    }

    pub fn notes(&self, side: Side) -> &str {
        match side {
            Side::Coached => &self.notes_coached,
            Side::Opponent => &self.notes_opponent,
        }
    }

    /// Bandit reward for the coached side: `total_coached - total_opponent`.
    pub fn reward(&self) -> f64 {
        self.total_coached - self.total_opponent
    }
}
