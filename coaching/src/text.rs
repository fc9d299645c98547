//! Text hygiene for model output and debate topics.

use std::sync::LazyLock;

use regex::Regex;

/// Longest sanitized topic, in characters.
pub const MAX_TOPIC_LEN: usize = 50;

static SPECIAL_TOKENS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(<s>|</s>|<pad>|<\|endoftext\|>|\[CLS\]|\[SEP\])")
        .expect("SPECIAL_TOKENS regex should compile")
});
static EMPTY_ANGLES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*<\s*>").expect("EMPTY_ANGLES regex should compile"));
static LEADING_JUNK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\s\-|:;,_]+").expect("LEADING_JUNK regex should compile"));
static TRAILING_JUNK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\s\-|:;,_]+$").expect("TRAILING_JUNK regex should compile"));
static CARRIAGE_RETURNS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\r\n?").expect("CARRIAGE_RETURNS regex should compile"));
static BLANK_RUNS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n{3,}").expect("BLANK_RUNS regex should compile"));
static SPACE_RUNS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[ \t]{2,}").expect("SPACE_RUNS regex should compile"));
static ONLY_SYMBOLS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\W_]+$").expect("ONLY_SYMBOLS regex should compile"));

static TOPIC_FORBIDDEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"[\\/:*?"<>|]"#).expect("TOPIC_FORBIDDEN regex should compile"));
static TOPIC_SEPARATORS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\s_.]+").expect("TOPIC_SEPARATORS regex should compile"));

/// Strip tokenizer artifacts and normalize whitespace in model output.
///
/// Returns an empty string when nothing word-like survives, so callers can
/// treat the result as "no usable output".
pub fn clean_model_output(text: &str) -> String {
    let s = SPECIAL_TOKENS.replace_all(text, "");
    let s = s.replace('\u{2581}', " ");
    let s = EMPTY_ANGLES.replace_all(&s, "");
    let s = LEADING_JUNK.replace_all(&s, "");
    let s = TRAILING_JUNK.replace_all(&s, "");
    let s = CARRIAGE_RETURNS.replace_all(&s, "\n");
    let s = BLANK_RUNS.replace_all(&s, "\n\n");
    let s = SPACE_RUNS.replace_all(&s, " ");
    let s = s.trim();

    if ONLY_SYMBOLS.is_match(s) {
        return String::new();
    }
    s.to_string()
}

/// Turn a free-form topic into a short, filesystem-safe slug.
pub fn sanitize_topic(topic: &str) -> String {
    if topic.is_empty() {
        return "untitled".to_string();
    }

    let lowered = topic.to_lowercase();
    let s = TOPIC_FORBIDDEN.replace_all(&lowered, "");
    let s = TOPIC_SEPARATORS.replace_all(&s, "-");
    let slug: String = s.trim_matches('-').chars().take(MAX_TOPIC_LEN).collect();

    if slug.is_empty() {
        "sanitized-topic".to_string()
    } else {
        slug
    }
}
