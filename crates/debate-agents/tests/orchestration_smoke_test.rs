//! Orchestration smoke test: full debates against a scripted backend.
//!
//! No network: every model call is answered by `ScriptedBackend`, which
//! routes on the model name and records each prompt it saw.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use coaching::{MemoryPolicyStore, PolicyState, PolicyStore, TemplateSet, TemplateStat, Winner};
use debate_agents::config::DebateConfig;
use debate_agents::llm::{ChatBackend, ChatMessage, LlmError};
use debate_agents::orchestrator::DebateRunner;
use debate_agents::reference::ReferenceMaterial;

const COACH: &str = "test/coach";
const OPPONENT: &str = "test/opponent";
const JUDGE: &str = "test/judge";

const NESTED_VERDICT: &str = r#"Here is my assessment:
{"coached": {"logic": 8, "relevance": 8, "clarity": 8, "persuasiveness": 8,
 "evidence_use": 8, "notes": "Well supported."},
 "opponent": {"logic": 6, "relevance": 6, "clarity": 6, "persuasiveness": 6,
 "evidence_use": 6, "notes": "Generic."}}"#;

/// Backend answering each model with a fixed script of replies.
struct ScriptedBackend {
    replies: Mutex<HashMap<String, Vec<Result<String, String>>>>,
    calls: Mutex<Vec<(String, Vec<ChatMessage>)>>,
}

impl ScriptedBackend {
    fn new() -> Self {
        Self {
            replies: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Queue replies for `model`; the last one repeats once the queue drains.
    fn script(self, model: &str, replies: &[Result<&str, &str>]) -> Self {
        let queued = replies
            .iter()
            .map(|r| r.map(str::to_string).map_err(str::to_string))
            .collect();
        self.replies.lock().unwrap().insert(model.to_string(), queued);
        self
    }

    fn calls_to(&self, model: &str) -> Vec<Vec<ChatMessage>> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(m, _)| m == model)
            .map(|(_, messages)| messages.clone())
            .collect()
    }
}

#[async_trait]
impl ChatBackend for ScriptedBackend {
    async fn complete(&self, model: &str, messages: &[ChatMessage]) -> Result<String, LlmError> {
        self.calls
            .lock()
            .unwrap()
            .push((model.to_string(), messages.to_vec()));

        let mut replies = self.replies.lock().unwrap();
        let queue = replies
            .get_mut(model)
            .ok_or_else(|| LlmError::RequestFailed(format!("no script for {}", model)))?;
        let reply = if queue.len() > 1 {
            queue.remove(0)
        } else {
            queue[0].clone()
        };
        reply.map_err(LlmError::RequestFailed)
    }
}

// ── Helpers ────────────────────────────────────────────────────────

fn test_config(data_dir: &std::path::Path) -> DebateConfig {
    let mut config = DebateConfig {
        data_dir: data_dir.to_path_buf(),
        templates: TemplateSet::new([
            "Lead with statistics.",
            "Use a vivid analogy.",
            "Concede then pivot.",
        ])
        .unwrap(),
        epsilon: 0.0,
        max_rounds: 3,
        coached_attempts: 2,
        retry_delay: Duration::ZERO,
        ..DebateConfig::default()
    };
    config.models.coached = COACH.to_string();
    config.models.opponent = OPPONENT.to_string();
    config.models.judge = JUDGE.to_string();
    config
}

fn policy(epsilon: f64, stats: &[(usize, TemplateStat)]) -> MemoryPolicyStore {
    MemoryPolicyStore::with_state(PolicyState {
        epsilon: Some(epsilon),
        template_stats: stats.iter().copied().collect(),
    })
}

fn stat(count: u64, sum_reward: f64) -> TemplateStat {
    TemplateStat { count, sum_reward }
}

fn happy_backend() -> ScriptedBackend {
    ScriptedBackend::new()
        .script(COACH, &[Ok("Coached point.")])
        .script(OPPONENT, &[Ok("Opposing point.")])
        .script(JUDGE, &[Ok(NESTED_VERDICT)])
}

// ── Full debate ────────────────────────────────────────────────────

#[tokio::test]
async fn test_three_round_debate_learns_and_records() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    let backend = Arc::new(happy_backend());
    let store = policy(0.0, &[(2, stat(1, 1.0))]).shared();

    let runner = DebateRunner::new(&config, backend.clone(), Arc::clone(&store)).unwrap();
    let outcome = runner.run_debate("Should cities ban cars?", 3).await.unwrap();

    assert_eq!(outcome.rounds.len(), 3);
    for (i, round) in outcome.rounds.iter().enumerate() {
        assert_eq!(round.round, i as u32 + 1);
        assert_eq!(round.selection.index, 2);
        assert_eq!(round.selection.template, "Concede then pivot.");
        assert_eq!(round.reward, 2.0);
    }

    let state = store.load().unwrap();
    assert_eq!(state.stat(2).count, 4);
    assert_eq!(state.stat(2).sum_reward, 7.0);
    assert_eq!(state.stat(0).count, 0);

    let rounds = runner.transcripts().read_rounds(&outcome.debate_id).unwrap();
    let judged = runner.transcripts().read_judgements(&outcome.debate_id).unwrap();
    assert_eq!(rounds.len(), 3);
    assert_eq!(judged.len(), 3);
    assert!(rounds.iter().all(|r| r.action == 2 && r.speaker == "coached"));
    assert_eq!(judged[0].record.notes_coached, "Well supported.");

    let summary = outcome.summary.unwrap();
    assert_eq!(summary.winner, Winner::Coached);
    assert_eq!(summary.sum_coached, 24.0);
    assert_eq!(summary.sum_opponent, 18.0);
    assert_eq!(summary.average_reward, 2.0);
}

#[tokio::test]
async fn test_later_rounds_see_previous_arguments() {
    let dir = tempfile::tempdir().unwrap();
    let backend = Arc::new(
        ScriptedBackend::new()
            .script(COACH, &[Ok("Argument one."), Ok("Argument two."), Ok("Argument three.")])
            .script(OPPONENT, &[Ok("Rebuttal.")])
            .script(JUDGE, &[Ok(NESTED_VERDICT)]),
    );

    let runner = DebateRunner::new(&test_config(dir.path()), backend.clone(), policy(0.0, &[]))
        .unwrap();
    runner.run_debate("school uniforms", 3).await.unwrap();

    let coach_calls = backend.calls_to(COACH);
    assert_eq!(coach_calls.len(), 3);
    assert_eq!(coach_calls[0].len(), 2);

    let history = &coach_calls[2][2].content;
    assert!(history.contains("Argument one."));
    assert!(history.contains("Argument two."));

    let opponent_calls = backend.calls_to(OPPONENT);
    assert!(opponent_calls[1][1].content.contains("Argument two."));
}

// ── Degraded collaborators ─────────────────────────────────────────

#[tokio::test]
async fn test_unparseable_judge_gives_zero_reward() {
    let dir = tempfile::tempdir().unwrap();
    let backend = Arc::new(
        ScriptedBackend::new()
            .script(COACH, &[Ok("Point.")])
            .script(OPPONENT, &[Ok("Counterpoint.")])
            .script(JUDGE, &[Ok("Both were fine, honestly.")]),
    );
    let store = policy(0.0, &[]).shared();

    let runner = DebateRunner::new(&test_config(dir.path()), backend, Arc::clone(&store)).unwrap();
    let outcome = runner.run_debate("tabs vs spaces", 1).await.unwrap();

    let round = &outcome.rounds[0];
    assert!(round.record.is_fallback());
    assert_eq!(round.record.total_coached, 5.0);
    assert_eq!(round.reward, 0.0);
    assert_eq!(store.load().unwrap().stat(0).count, 1);
    assert_eq!(outcome.summary.unwrap().winner, Winner::Tie);
}

#[tokio::test]
async fn test_empty_coach_replies_become_error_text() {
    let dir = tempfile::tempdir().unwrap();
    let backend = Arc::new(
        ScriptedBackend::new()
            .script(COACH, &[Ok("<s></s>")])
            .script(OPPONENT, &[Ok("Nothing to rebut.")])
            .script(JUDGE, &[Ok(NESTED_VERDICT)]),
    );

    let runner = DebateRunner::new(&test_config(dir.path()), backend.clone(), policy(0.0, &[]))
        .unwrap();
    let outcome = runner.run_debate("empty", 1).await.unwrap();

    assert_eq!(backend.calls_to(COACH).len(), 2);
    assert!(outcome.rounds[0]
        .coached_argument
        .starts_with("Error generating coached argument"));
    assert_eq!(outcome.rounds[0].opponent_argument, "Nothing to rebut.");
}

#[tokio::test]
async fn test_judge_outage_falls_back_with_reason() {
    let dir = tempfile::tempdir().unwrap();
    let backend = Arc::new(
        ScriptedBackend::new()
            .script(COACH, &[Ok("Point.")])
            .script(OPPONENT, &[Ok("Counterpoint.")])
            .script(JUDGE, &[Err("503 upstream")]),
    );

    let runner = DebateRunner::new(&test_config(dir.path()), backend, policy(0.0, &[])).unwrap();
    let outcome = runner.run_debate("outage", 2).await.unwrap();

    for round in &outcome.rounds {
        assert!(round.record.is_fallback());
        assert!(round.record.notes_opponent.contains("503 upstream"));
    }
}

// ── Reference material ─────────────────────────────────────────────

#[tokio::test]
async fn test_reference_material_reaches_every_role() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    ReferenceMaterial::new(config.reference_path())
        .store("Transit ridership rose 12% in 2023.")
        .unwrap();

    let backend = Arc::new(happy_backend());
    let runner = DebateRunner::new(&config, backend.clone(), policy(0.0, &[])).unwrap();
    runner.run_debate("transit", 1).await.unwrap();

    for model in [COACH, OPPONENT, JUDGE] {
        let calls = backend.calls_to(model);
        assert!(
            calls[0][1].content.contains("Transit ridership rose 12% in 2023."),
            "{} prompt is missing the reference material",
            model
        );
    }
}

// ── Persistence across runs ────────────────────────────────────────

#[tokio::test]
async fn test_policy_file_carries_over_between_runners() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());

    {
        let runner =
            DebateRunner::new(&config, Arc::new(happy_backend()), config.policy_store()).unwrap();
        runner.run_debate("first", 2).await.unwrap();
    }

    let runner =
        DebateRunner::new(&config, Arc::new(happy_backend()), config.policy_store()).unwrap();
    let report = runner.bandit().report().unwrap();
    assert_eq!(report.epsilon, 0.0);
    assert_eq!(report.rows[0].count, 2);
    assert_eq!(report.rows[0].average_reward, 2.0);

    runner.run_debate("second", 1).await.unwrap();
    assert_eq!(runner.transcripts().list_debates().unwrap().len(), 2);
}
