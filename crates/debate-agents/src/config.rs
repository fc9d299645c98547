use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use coaching::bandit::DEFAULT_EPSILON;
use coaching::{BanditConfig, JsonFilePolicyStore, TemplateSet};
use serde::Deserialize;

const DEFAULT_API_URL: &str = "https://openrouter.ai/api/v1/chat/completions";
const DEFAULT_DEBATER_MODEL: &str = "meta-llama/llama-3.1-8b-instruct";
const DEFAULT_JUDGE_MODEL: &str = "mistralai/mistral-7b-instruct";

/// File holding plain-text reference material, relative to the data dir.
pub const REFERENCE_FILE: &str = "extracted_text.txt";

/// Model routing for the three debate roles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelSet {
    /// Writes the strategy-guided argument.
    pub coached: String,
    /// Rebuts the coached argument.
    pub opponent: String,
    /// Scores both arguments against the rubric.
    pub judge: String,
}

/// Top-level debate configuration.
///
/// `Default` reads the environment; [`DebateConfig::load`] additionally
/// applies an optional TOML file on top.
#[derive(Debug, Clone)]
pub struct DebateConfig {
    /// OpenAI-compatible chat completions endpoint.
    pub api_url: String,
    /// Bearer token. Only required for live runs.
    pub api_key: Option<String>,
    pub models: ModelSet,
    /// Per-request HTTP timeout.
    pub http_timeout: Duration,
    /// Rounds played when `run` is given no explicit count.
    pub max_rounds: u32,
    /// Root for the policy file, reference material, and debate transcripts.
    pub data_dir: PathBuf,
    /// Strategy templates the bandit chooses between.
    pub templates: TemplateSet,
    /// Exploration rate persisted on first start. An epsilon already in the
    /// policy file wins.
    pub epsilon: f64,
    /// Attempts at a non-empty coached argument before giving up.
    pub coached_attempts: u32,
    /// Pause between coached-argument attempts.
    pub retry_delay: Duration,
}

impl Default for DebateConfig {
    fn default() -> Self {
        Self {
            api_url: std::env::var("OPENROUTER_API_URL")
                .unwrap_or_else(|_| DEFAULT_API_URL.into()),
            api_key: std::env::var("OPENROUTER_API_KEY")
                .ok()
                .filter(|k| !k.trim().is_empty()),
            models: ModelSet {
                coached: std::env::var("MODEL_COACHED")
                    .unwrap_or_else(|_| DEFAULT_DEBATER_MODEL.into()),
                opponent: std::env::var("MODEL_OPPONENT")
                    .unwrap_or_else(|_| DEFAULT_DEBATER_MODEL.into()),
                judge: std::env::var("MODEL_JUDGE").unwrap_or_else(|_| DEFAULT_JUDGE_MODEL.into()),
            },
            http_timeout: timeout_from_env("HTTP_TIMEOUT", 30),
            max_rounds: u32_from_env("MAX_ROUNDS", 5),
            data_dir: std::env::var("DEBATE_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("data")),
            templates: TemplateSet::default(),
            epsilon: f64_from_env("DEBATE_EPSILON", DEFAULT_EPSILON),
            coached_attempts: 2,
            retry_delay: Duration::from_secs(1),
        }
    }
}

/// Optional overrides read from a TOML file.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ConfigFile {
    templates: Option<TemplateSet>,
    epsilon: Option<f64>,
    max_rounds: Option<u32>,
    data_dir: Option<PathBuf>,
    models: ModelOverrides,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ModelOverrides {
    coached: Option<String>,
    opponent: Option<String>,
    judge: Option<String>,
}

impl DebateConfig {
    /// Environment defaults, then the TOML file at `path` if one is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = Self::default();
        if let Some(path) = path {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            config
                .apply_toml(&raw)
                .with_context(|| format!("Invalid config file {}", path.display()))?;
        }
        config.validate()?;
        Ok(config)
    }

    /// Apply TOML overrides in place. Keys absent from `raw` are untouched.
    pub fn apply_toml(&mut self, raw: &str) -> Result<()> {
        let file: ConfigFile = toml::from_str(raw).context("Failed to parse TOML")?;

        if let Some(templates) = file.templates {
            self.templates = templates;
        }
        if let Some(epsilon) = file.epsilon {
            self.epsilon = epsilon;
        }
        if let Some(max_rounds) = file.max_rounds {
            self.max_rounds = max_rounds;
        }
        if let Some(data_dir) = file.data_dir {
            self.data_dir = data_dir;
        }
        if let Some(model) = file.models.coached {
            self.models.coached = model;
        }
        if let Some(model) = file.models.opponent {
            self.models.opponent = model;
        }
        if let Some(model) = file.models.judge {
            self.models.judge = model;
        }
        Ok(())
    }

    /// Reject settings the bandit or the runner cannot work with.
    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(
            self.epsilon.is_finite() && (0.0..=1.0).contains(&self.epsilon),
            "epsilon must be within [0, 1], got {}",
            self.epsilon
        );
        anyhow::ensure!(self.max_rounds > 0, "max_rounds must be at least 1");
        anyhow::ensure!(
            self.coached_attempts > 0,
            "coached_attempts must be at least 1"
        );
        Ok(())
    }

    pub fn bandit_config(&self) -> BanditConfig {
        BanditConfig {
            default_epsilon: self.epsilon,
        }
    }

    /// The file-backed policy store under the data dir.
    pub fn policy_store(&self) -> JsonFilePolicyStore {
        JsonFilePolicyStore::in_dir(&self.data_dir)
    }

    pub fn reference_path(&self) -> PathBuf {
        self.data_dir.join(REFERENCE_FILE)
    }
}

fn timeout_from_env(var: &str, default_secs: u64) -> Duration {
    let secs = std::env::var(var)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .filter(|v| *v > 0)
        .unwrap_or(default_secs);
    Duration::from_secs(secs)
}

fn u32_from_env(var: &str, default: u32) -> u32 {
    std::env::var(var)
        .ok()
        .and_then(|v| v.parse::<u32>().ok())
        .filter(|v| *v > 0)
        .unwrap_or(default)
}

fn f64_from_env(var: &str, default: f64) -> f64 {
    std::env::var(var)
        .ok()
        .and_then(|v| v.trim().parse::<f64>().ok())
        .unwrap_or(default)
}
