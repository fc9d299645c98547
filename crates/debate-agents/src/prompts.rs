//! Prompt text and message builders for each debate role.
//!
//! Prompt versioning: bump `PROMPT_VERSION` whenever prompt content changes
//! so logged rounds can be traced back to the wording that produced them.

use coaching::text::sanitize_topic;

use crate::llm::ChatMessage;

/// Prompt version. Bump on any prompt content change.
pub const PROMPT_VERSION: &str = "1.2.0";

/// Reference material beyond this many characters is cut off.
pub const REFERENCE_CHAR_LIMIT: usize = 3000;

/// How many earlier coached arguments are replayed to the debater.
pub const PREVIOUS_ARGUMENTS_SHOWN: usize = 2;

pub const COACHED_SYSTEM: &str = "\
You are an expert debater. Produce a concise, structured argument. \
Keep it 3-6 sentences.";

pub const OPPONENT_SYSTEM: &str = "\
You are an opposing debater. Your job is to rebut the last argument concisely, \
using clear reasoning and evidence where possible.";

pub const JUDGE_SYSTEM: &str = "\
You are a highly analytical and impartial debate judge. Your sole purpose is to \
evaluate two competing arguments based on a specific rubric and provide actionable \
feedback. You must follow all instructions and return ONLY the specified JSON format.";

const JUDGE_RUBRIC: &str = "\
INSTRUCTIONS:
Evaluate both arguments based on the following SCORING RUBRIC.
All scores must be an integer from 1 (poor) to 10 (excellent).

SCORING RUBRIC:
1. **Logic (1-10):** Is the argument sound, well-reasoned, and free of fallacies?
2. **Relevance (1-10):** Does the argument directly address the topic?
3. **Clarity (1-10):** Is the argument easy to understand, concise, and well-structured?
4. **Persuasiveness (1-10):** Is the argument compelling? Does it use effective rhetoric?
5. **Evidence Use (1-10):** How well did the argument use facts or evidence? \
(Score 5 if no evidence was needed or used. Score higher if it used the Reference \
Material effectively. Score lower if it ignored or contradicted the Reference Material.)

OUTPUT FORMAT:
You must return ONLY a single, valid JSON object. Do not include any other text, \
preambles, or explanations.
Use the nested structure below.
The \"notes\" MUST be 1-2 sentences of specific, constructive feedback explaining \
the *reason* for the scores.

{
    \"coached\": {
        \"logic\": <int>,
        \"relevance\": <int>,
        \"clarity\": <int>,
        \"persuasiveness\": <int>,
        \"evidence_use\": <int>,
        \"notes\": \"<string, 1-2 sentences of feedback>\"
    },
    \"opponent\": {
        \"logic\": <int>,
        \"relevance\": <int>,
        \"clarity\": <int>,
        \"persuasiveness\": <int>,
        \"evidence_use\": <int>,
        \"notes\": \"<string, 1-2 sentences of feedback>\"
    }
}";

/// The first [`REFERENCE_CHAR_LIMIT`] characters of `reference`, or `None`
/// when it has no visible content.
fn reference_excerpt(reference: &str) -> Option<String> {
    if reference.trim().is_empty() {
        return None;
    }
    Some(reference.chars().take(REFERENCE_CHAR_LIMIT).collect())
}

/// Messages for the coached debater.
pub fn coached_messages(
    instruction: &str,
    topic: &str,
    reference: &str,
    previous: &[String],
) -> Vec<ChatMessage> {
    let mut content = format!("Instruction: {}\nTopic: {}", instruction, sanitize_topic(topic));
    if let Some(excerpt) = reference_excerpt(reference) {
        content.push_str(&format!("\n\nReference Material:\n{}", excerpt));
    }

    let mut messages = vec![ChatMessage::system(COACHED_SYSTEM), ChatMessage::user(content)];

    if !previous.is_empty() {
        let start = previous.len().saturating_sub(PREVIOUS_ARGUMENTS_SHOWN);
        messages.push(ChatMessage::user(format!(
            "Previous rounds (last two):\n{}",
            previous[start..].join("\n\n")
        )));
    }
    messages
}

/// Messages for the opponent, rebutting `argument`.
pub fn opponent_messages(argument: &str, topic: &str, reference: &str) -> Vec<ChatMessage> {
    let mut content = format!(
        "Topic: {}\n\nYou must rebut the following argument from your opponent:\n\
         \"\"\"\n{}\n\"\"\"\n\nProvide your counter-argument.",
        sanitize_topic(topic),
        argument
    );
    if let Some(excerpt) = reference_excerpt(reference) {
        content.push_str(&format!("\n\nReference Material:\n{}", excerpt));
    }

    vec![ChatMessage::system(OPPONENT_SYSTEM), ChatMessage::user(content)]
}

/// Messages for the judge, scoring both arguments.
pub fn judge_messages(
    topic: &str,
    coached: &str,
    opponent: &str,
    reference: &str,
) -> Vec<ChatMessage> {
    let reference_section = reference_excerpt(reference)
        .map(|excerpt| format!("Reference Material:\n{}\n---\n", excerpt))
        .unwrap_or_default();

    let content = format!(
        "Topic: {}\n\n---\nCOACHED ARGUMENT:\n{}\n---\nOPPONENT ARGUMENT:\n{}\n---\n{}\n{}",
        sanitize_topic(topic),
        coached,
        opponent,
        reference_section,
        JUDGE_RUBRIC
    );

    vec![ChatMessage::system(JUDGE_SYSTEM), ChatMessage::user(content)]
}
