//! Pulling a JSON value out of raw judge output.

use serde_json::Value;
use thiserror::Error;

/// What the judge collaborator handed back: plain text, or JSON that an
/// upstream layer already parsed.
#[derive(Debug, Clone, PartialEq)]
pub enum RawJudgeOutput {
    Text(String),
    Structured(Value),
}

impl From<String> for RawJudgeOutput {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<&str> for RawJudgeOutput {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<Value> for RawJudgeOutput {
    fn from(value: Value) -> Self {
        match value {
            // A bare JSON string is still text that needs parsing.
            Value::String(text) => Self::Text(text),
            other => Self::Structured(other),
        }
    }
}

/// Why no JSON value could be extracted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractError {
    #[error("no JSON object found in judge output")]
    NoJsonObject,

    #[error("malformed JSON object in judge output: {0}")]
    Malformed(String),
}

/// Extract the judge's JSON.
///
/// Structured input is used as-is. Text is tried as a whole document
/// first, then as the span from the first `{` to the last `}`.
pub fn extract_json_object(raw: &RawJudgeOutput) -> Result<Value, ExtractError> {
    match raw {
        RawJudgeOutput::Structured(value) => Ok(value.clone()),
        RawJudgeOutput::Text(text) => parse_whole(text)
            .map(Ok)
            .unwrap_or_else(|| parse_braced(text)),
    }
}

fn parse_whole(text: &str) -> Option<Value> {
    serde_json::from_str(text.trim()).ok()
}

fn parse_braced(text: &str) -> Result<Value, ExtractError> {
    let span = braced_span(text).ok_or(ExtractError::NoJsonObject)?;
    serde_json::from_str(span).map_err(|e| ExtractError::Malformed(e.to_string()))
}

/// First `{` through last `}`, inclusive.
fn braced_span(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end > start {
        Some(&text[start..=end])
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_direct_parse() {
        let raw = RawJudgeOutput::from(r#"{"a": 1}"#);
        assert_eq!(extract_json_object(&raw).unwrap(), json!({"a": 1}));
    }

    #[test]
    fn test_prose_wrapped() {
        let raw = RawJudgeOutput::from("Here are my scores:\n{\"a\": {\"b\": 2}}\nHope this helps!");
        assert_eq!(extract_json_object(&raw).unwrap(), json!({"a": {"b": 2}}));
    }

    #[test]
    fn test_fenced_block() {
        let raw = RawJudgeOutput::from("```json\n{\"a\": 1}\n```");
        assert_eq!(extract_json_object(&raw).unwrap(), json!({"a": 1}));
    }

    #[test]
    fn test_structured_passthrough() {
        let raw = RawJudgeOutput::from(json!({"coached": {}}));
        assert!(matches!(raw, RawJudgeOutput::Structured(_)));
        assert_eq!(extract_json_object(&raw).unwrap(), json!({"coached": {}}));
    }

    #[test]
    fn test_json_string_value_is_reparsed() {
        let raw = RawJudgeOutput::from(Value::String(r#"{"a": 1}"#.into()));
        assert_eq!(extract_json_object(&raw).unwrap(), json!({"a": 1}));
    }

    #[test]
    fn test_no_braces() {
        let raw = RawJudgeOutput::from("not json at all");
        assert_eq!(extract_json_object(&raw), Err(ExtractError::NoJsonObject));
    }

    #[test]
    fn test_reversed_braces() {
        let raw = RawJudgeOutput::from("} oops {");
        assert_eq!(extract_json_object(&raw), Err(ExtractError::NoJsonObject));
    }

    #[test]
    fn test_malformed_span() {
        let raw = RawJudgeOutput::from("scores: {logic: 7,} end");
        assert!(matches!(
            extract_json_object(&raw),
            Err(ExtractError::Malformed(_))
        ));
    }
}
