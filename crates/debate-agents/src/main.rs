use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use coaching::{evaluate, BanditAgent, TranscriptStore};
use debate_agents::config::DebateConfig;
use debate_agents::llm::OpenRouterClient;
use debate_agents::orchestrator::DebateRunner;
use debate_agents::reference::ReferenceMaterial;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "debate-agents", about = "Coached debates with a learning strategy bandit")]
struct Cli {
    /// TOML file overriding templates, epsilon, rounds, data dir, or models.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a new debate.
    Run {
        #[arg(long)]
        topic: String,
        /// Rounds to play (default: MAX_ROUNDS).
        #[arg(long)]
        rounds: Option<u32>,
        /// Plain-text file to use as reference material.
        #[arg(long, conflicts_with = "clear_reference")]
        reference: Option<PathBuf>,
        /// Drop any stored reference material first.
        #[arg(long)]
        clear_reference: bool,
    },
    /// Show per-template statistics.
    Stats,
    /// List debates, newest first.
    List,
    /// Print a debate's rounds, scores, and summary.
    Show { debate_id: String },
    /// Normalize raw judge output from FILE (or stdin) and print it as JSON.
    Judge { input: Option<PathBuf> },
    /// Delete all debates, the learned policy, and reference material.
    Reset,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();
    let config = DebateConfig::load(cli.config.as_deref())?;

    match cli.command {
        Command::Run {
            topic,
            rounds,
            reference,
            clear_reference,
        } => run(&config, &topic, rounds, reference, clear_reference).await,
        Command::Stats => stats(&config),
        Command::List => list(&config),
        Command::Show { debate_id } => show(&config, &debate_id),
        Command::Judge { input } => judge(input),
        Command::Reset => {
            TranscriptStore::new(&config.data_dir).reset()?;
            println!("Reset {}", config.data_dir.display());
            Ok(())
        }
    }
}

async fn run(
    config: &DebateConfig,
    topic: &str,
    rounds: Option<u32>,
    reference: Option<PathBuf>,
    clear_reference: bool,
) -> Result<()> {
    let material = ReferenceMaterial::new(config.reference_path());
    if clear_reference {
        material.clear()?;
    }
    if let Some(path) = reference {
        let text = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        material.store(&text)?;
    }

    let rounds = rounds.unwrap_or(config.max_rounds);
    info!(
        topic,
        rounds,
        coached = %config.models.coached,
        opponent = %config.models.opponent,
        judge = %config.models.judge,
        "Debate orchestrator starting"
    );

    let backend = Arc::new(OpenRouterClient::from_config(config)?);
    let runner = DebateRunner::new(config, backend, config.policy_store())?;
    let outcome = runner.run_debate(topic, rounds).await?;

    for round in &outcome.rounds {
        println!(
            "── Round {} ({} template {}) ──",
            round.round, round.selection.mode, round.selection.index
        );
        println!("Coached:  {}", round.coached_argument);
        println!("Opponent: {}", round.opponent_argument);
        println!(
            "Scores:   coached {:.1} / opponent {:.1} (reward {:+.1})",
            round.record.total_coached, round.record.total_opponent, round.reward
        );
        println!();
    }

    println!("Debate: {}", outcome.debate_id);
    if let Some(summary) = outcome.summary {
        println!(
            "{} coached {:.1} vs opponent {:.1}",
            summary.winner, summary.sum_coached, summary.sum_opponent
        );
    }
    Ok(())
}

fn stats(config: &DebateConfig) -> Result<()> {
    let bandit = BanditAgent::new(
        config.templates.clone(),
        config.policy_store(),
        config.bandit_config(),
    )?;
    let report = bandit.report()?;

    println!("epsilon: {}", report.epsilon);
    println!("{:>3}  {:>6}  {:>9}  {:>9}  template", "#", "count", "sum", "avg");
    for row in &report.rows {
        println!(
            "{:>3}  {:>6}  {:>9.2}  {:>9.2}  {}",
            row.index, row.count, row.sum_reward, row.average_reward, row.template
        );
    }
    if let Some(leader) = report.leader() {
        println!("leader: #{} ({:.2})", leader.index, leader.average_reward);
    }
    Ok(())
}

fn list(config: &DebateConfig) -> Result<()> {
    let store = TranscriptStore::new(&config.data_dir);
    for id in store.list_debates()? {
        println!("{}", id);
    }
    Ok(())
}

fn show(config: &DebateConfig, debate_id: &str) -> Result<()> {
    let store = TranscriptStore::new(&config.data_dir);
    let rounds = store.read_rounds(debate_id)?;
    let judgements = store.read_judgements(debate_id)?;

    for entry in &rounds {
        println!("── Round {} (template {}) ──", entry.round, entry.action);
        println!("Coached:  {}", entry.coached_argument);
        println!("Opponent: {}", entry.opponent_argument);
        if let Some(judged) = judgements.iter().find(|j| j.round == entry.round) {
            println!(
                "Scores:   coached {:.1} / opponent {:.1}",
                judged.record.total_coached, judged.record.total_opponent
            );
            println!(
                "Notes:    {} | {}",
                judged.record.notes_coached, judged.record.notes_opponent
            );
        }
        println!();
    }

    match store.summarize(debate_id)? {
        Some(summary) => println!("{}", serde_json::to_string_pretty(&summary)?),
        None => println!("No judged rounds yet."),
    }
    Ok(())
}

fn judge(input: Option<PathBuf>) -> Result<()> {
    let raw = match input {
        Some(path) if path.as_os_str() != "-" => std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?,
        _ => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read judge output from stdin")?;
            buf
        }
    };

    let record = evaluate(raw);
    println!("{}", serde_json::to_string_pretty(&record)?);
    Ok(())
}
