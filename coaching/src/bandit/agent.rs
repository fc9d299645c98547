//! The bandit agent: template selection and reward accounting.

use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use super::policy::{PolicyState, TemplateStat, DEFAULT_EPSILON};
use super::store::{PolicyStore, StoreError};
use crate::templates::{ConfigError, TemplateSet};

/// Errors from bandit operations.
#[derive(Debug, Error)]
pub enum BanditError {
    #[error("bandit configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("policy store error: {0}")]
    Store(#[from] StoreError),

    #[error("reward must be a finite number, got {0}")]
    NonFiniteReward(f64),
}

/// Result type for bandit operations
pub type BanditResult<T> = Result<T, BanditError>;

/// Construction-time settings for [`BanditAgent`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BanditConfig {
    /// Exploration rate written to the store when none is persisted.
    pub default_epsilon: f64,
}

impl Default for BanditConfig {
    fn default() -> Self {
        Self {
            default_epsilon: DEFAULT_EPSILON,
        }
    }
}

/// How a template was chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionMode {
    /// Uniformly random pick (probability epsilon).
    Explore,
    /// Best average reward so far.
    Exploit,
}

impl std::fmt::Display for SelectionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Explore => write!(f, "explore"),
            Self::Exploit => write!(f, "exploit"),
        }
    }
}

/// A chosen template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub index: usize,
    pub template: String,
    pub mode: SelectionMode,
}

/// One row of [`BanditReport`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportRow {
    pub index: usize,
    pub template: String,
    pub count: u64,
    pub sum_reward: f64,
    pub average_reward: f64,
}

/// Snapshot of the policy for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BanditReport {
    pub epsilon: f64,
    pub rows: Vec<ReportRow>,
}

impl BanditReport {
    /// Row with the highest average reward, first index on ties.
    pub fn leader(&self) -> Option<&ReportRow> {
        self.rows.iter().fold(None, |best: Option<&ReportRow>, row| match best {
            Some(b) if row.average_reward > b.average_reward => Some(row),
            Some(b) => Some(b),
            None => Some(row),
        })
    }
}

/// Epsilon-greedy agent over a fixed [`TemplateSet`].
///
/// Holds no policy state in memory: every call loads from the store, and
/// every mutation saves back before returning.
pub struct BanditAgent<S: PolicyStore> {
    templates: TemplateSet,
    store: S,
    default_epsilon: f64,
}

impl<S: PolicyStore> BanditAgent<S> {
    /// Construct the agent and initialize persistent state.
    ///
    /// Missing template stats are zero-filled and a missing epsilon is set
    /// to the configured default; the result is saved even when nothing
    /// was missing.
    pub fn new(templates: TemplateSet, store: S, config: BanditConfig) -> BanditResult<Self> {
        validate_epsilon(config.default_epsilon)?;

        let agent = Self {
            templates,
            store,
            default_epsilon: config.default_epsilon,
        };
        agent.initialize()?;
        Ok(agent)
    }

    fn initialize(&self) -> BanditResult<()> {
        let mut state = self.store.load()?;
        if let Some(epsilon) = state.epsilon {
            validate_epsilon(epsilon)?;
        } else {
            state.epsilon = Some(self.default_epsilon);
        }

        let added = state.ensure_templates(self.templates.len());
        self.store.save(&state)?;

        info!(
            templates = self.templates.len(),
            added,
            epsilon = state.epsilon.unwrap_or(self.default_epsilon),
            "Bandit agent initialized"
        );
        Ok(())
    }

    /// The configured template set.
    pub fn templates(&self) -> &TemplateSet {
        &self.templates
    }

    /// The underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Pick a template using the thread-local RNG.
    pub fn select(&self) -> BanditResult<Selection> {
        self.select_with(&mut rand::thread_rng())
    }

    /// Pick a template using the supplied RNG.
    pub fn select_with<R: Rng + ?Sized>(&self, rng: &mut R) -> BanditResult<Selection> {
        let state = self.store.load()?;
        let epsilon = self.epsilon_of(&state)?;

        let (index, mode) = if rng.gen::<f64>() < epsilon {
            (rng.gen_range(0..self.templates.len()), SelectionMode::Explore)
        } else {
            (self.best_index(&state), SelectionMode::Exploit)
        };

        let template = self.template_text(index);
        debug!(index, %mode, epsilon, "Template selected");
        Ok(Selection {
            index,
            template,
            mode,
        })
    }

    /// Record `reward` for `index` and persist. Returns the updated stat.
    ///
    /// Not idempotent: call exactly once per scored round.
    pub fn update(&self, index: usize, reward: f64) -> BanditResult<TemplateStat> {
        if !reward.is_finite() {
            return Err(BanditError::NonFiniteReward(reward));
        }
        if index >= self.templates.len() {
            warn!(
                index,
                templates = self.templates.len(),
                "Reward recorded for an index outside the template set"
            );
        }

        let mut state = self.store.load()?;
        let stat = state.template_stats.entry(index).or_default();
        stat.record(reward);
        let updated = *stat;
        self.store.save(&state)?;

        info!(
            index,
            reward,
            count = updated.count,
            average = updated.average_reward(),
            "Template reward recorded"
        );
        Ok(updated)
    }

    /// Current stats for every configured template.
    pub fn report(&self) -> BanditResult<BanditReport> {
        let state = self.store.load()?;
        let epsilon = self.epsilon_of(&state)?;
        let rows = self
            .templates
            .iter()
            .map(|(index, template)| {
                let stat = state.stat(index);
                ReportRow {
                    index,
                    template: template.to_string(),
                    count: stat.count,
                    sum_reward: stat.sum_reward,
                    average_reward: stat.average_reward(),
                }
            })
            .collect();
        Ok(BanditReport { epsilon, rows })
    }

    fn epsilon_of(&self, state: &PolicyState) -> BanditResult<f64> {
        let epsilon = state.epsilon.unwrap_or(self.default_epsilon);
        validate_epsilon(epsilon)?;
        Ok(epsilon)
    }

    /// Highest average reward; unscored templates count as 0.0 and the
    /// strict comparison keeps the lowest index on ties.
    fn best_index(&self, state: &PolicyState) -> usize {
        let mut best_index = 0;
        let mut best_avg = f64::NEG_INFINITY;
        for index in 0..self.templates.len() {
            let avg = state.stat(index).average_reward();
            if avg > best_avg {
                best_avg = avg;
                best_index = index;
            }
        }
        best_index
    }

    fn template_text(&self, index: usize) -> String {
        // index always comes from 0..len
        self.templates.get(index).unwrap_or_default().to_string()
    }
}

fn validate_epsilon(epsilon: f64) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&epsilon) {
        Ok(())
    } else {
        Err(ConfigError::InvalidEpsilon(epsilon))
    }
}
