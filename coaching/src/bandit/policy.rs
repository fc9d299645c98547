//! Persisted policy state: per-template reward statistics plus epsilon.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Exploration probability used when none has been persisted.
pub const DEFAULT_EPSILON: f64 = 0.25;

/// Running reward statistics for one template.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TemplateStat {
    /// Times this template was selected and scored.
    pub count: u64,
    /// Cumulative reward observed for this template.
    pub sum_reward: f64,
}

impl TemplateStat {
    /// Mean reward, or `0.0` for a template that has never been scored.
    pub fn average_reward(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.sum_reward / self.count as f64
        }
    }

    /// Fold one observed reward into the statistics.
    pub fn record(&mut self, reward: f64) {
        self.count += 1;
        self.sum_reward += reward;
    }
}

/// All template statistics plus the exploration rate.
///
/// Serialized as `{"epsilon": 0.25, "template_stats": {"0": {...}}}`.
/// Both fields tolerate absence so a blank store loads cleanly.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PolicyState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub epsilon: Option<f64>,
    #[serde(default)]
    pub template_stats: BTreeMap<usize, TemplateStat>,
}

impl PolicyState {
    /// Stats for `index`, zeroed if the template was never recorded.
    pub fn stat(&self, index: usize) -> TemplateStat {
        self.template_stats.get(&index).copied().unwrap_or_default()
    }

    /// Insert zeroed stats for every index below `template_count` that is
    /// missing. Returns how many entries were added.
    pub fn ensure_templates(&mut self, template_count: usize) -> usize {
        let mut added = 0;
        for index in 0..template_count {
            self.template_stats.entry(index).or_insert_with(|| {
                added += 1;
                TemplateStat::default()
            });
        }
        added
    }
}
