//! Shape classification and per-shape normalization.

use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, warn};

use super::extract::{extract_json_object, RawJudgeOutput};
use super::record::{
    Dimension, ScoreRecord, Side, SideScores, DEFAULT_SCORE, MAX_SCORE, MIN_SCORE, NO_NOTES,
};

/// Note keys accepted inside a nested side object, in priority order.
const NESTED_NOTE_KEYS: [&str; 4] = ["notes", "note", "feedback", "comment"];

/// Note keys accepted for the coached side of a flat object.
const FLAT_COACHED_NOTE_KEYS: [&str; 4] =
    ["notes_coached", "coach_notes", "coached_notes", "notes"];

/// Note keys accepted for the opponent side of a flat object.
const FLAT_OPPONENT_NOTE_KEYS: [&str; 2] = ["notes_opponent", "opponent_notes"];

/// Layout of a parsed judge object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    /// `{"coached": {...}, "opponent": {...}}`
    Nested,
    /// `{"logic_coached": 7, ..., "notes_opponent": "..."}`
    Flat,
    /// Anything else.
    Unknown,
}

impl std::fmt::Display for Shape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Nested => write!(f, "nested"),
            Self::Flat => write!(f, "flat"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

/// A parsed value that cannot be normalized under its claimed shape.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NormalizeError {
    #[error("judge output is not a JSON object")]
    NotAnObject,

    #[error("`{0}` entry is not an object")]
    SideNotObject(Side),
}

/// Classify a parsed judge value.
pub fn classify_shape(value: &Value) -> Shape {
    let Some(obj) = value.as_object() else {
        return Shape::Unknown;
    };

    if obj.contains_key(Side::Coached.as_str()) && obj.contains_key(Side::Opponent.as_str()) {
        return Shape::Nested;
    }

    let has_flat_key = obj.keys().any(|key| {
        let key = key.to_lowercase();
        Side::BOTH
            .iter()
            .any(|&side| Dimension::ALL.iter().any(|dim| dim.flat_key(side) == key))
    });
    if has_flat_key {
        Shape::Flat
    } else {
        Shape::Unknown
    }
}

/// Normalize `{"coached": {...}, "opponent": {...}}`.
///
/// Each side accepts `<dimension>` or `<dimension>_score`. An empty side
/// (`null`, `false`, `0`, `""`, `[]`) counts as `{}`; any other non-object
/// side is an error. Totals are recomputed from the coerced sub-scores.
pub fn normalize_nested(value: &Value) -> Result<ScoreRecord, NormalizeError> {
    let obj = value.as_object().ok_or(NormalizeError::NotAnObject)?;
    let coached = nested_side(obj, Side::Coached)?;
    let opponent = nested_side(obj, Side::Opponent)?;
    Ok(ScoreRecord::from_sides(coached, opponent))
}

fn nested_side(obj: &Map<String, Value>, side: Side) -> Result<SideScores, NormalizeError> {
    let empty = Map::new();
    let blob = match obj.get(side.as_str()) {
        Some(Value::Object(blob)) => blob,
        None => &empty,
        Some(other) if is_empty_value(other) => &empty,
        Some(_) => return Err(NormalizeError::SideNotObject(side)),
    };

    let scores = Dimension::ALL.map(|dim| {
        let value = blob
            .get(dim.as_str())
            .or_else(|| blob.get(&format!("{}_score", dim.as_str())));
        coerce_score(value)
    });
    let notes = pick_note(NESTED_NOTE_KEYS.iter().map(|key| blob.get(*key)));

    Ok(SideScores { scores, notes })
}

/// Normalize a flat `<dimension>_<side>` object.
///
/// Keys match verbatim first, then case-insensitively. Any total supplied
/// by the judge is ignored in favour of the mean of the coerced scores.
pub fn normalize_flat(value: &Value) -> Result<ScoreRecord, NormalizeError> {
    let obj = value.as_object().ok_or(NormalizeError::NotAnObject)?;

    let side_scores = |side: Side, note_keys: &[&str]| SideScores {
        scores: Dimension::ALL.map(|dim| coerce_score(flat_lookup(obj, &dim.flat_key(side)))),
        notes: pick_note(note_keys.iter().map(|key| flat_lookup(obj, key))),
    };

    Ok(ScoreRecord::from_sides(
        side_scores(Side::Coached, &FLAT_COACHED_NOTE_KEYS[..]),
        side_scores(Side::Opponent, &FLAT_OPPONENT_NOTE_KEYS[..]),
    ))
}

fn flat_lookup<'a>(obj: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    obj.get(key).or_else(|| {
        obj.iter()
            .find(|(k, _)| k.to_lowercase() == key)
            .map(|(_, v)| v)
    })
}

/// Normalize raw judge output into a complete score record.
///
/// Never fails: unparseable text, an unrecognized layout, or a side that
/// is not an object all produce [`ScoreRecord::fallback`] with the reason
/// in both notes. Pure; equal input gives equal output.
pub fn evaluate(raw: impl Into<RawJudgeOutput>) -> ScoreRecord {
    let raw = raw.into();

    let value = match extract_json_object(&raw) {
        Ok(value) => value,
        Err(e) => {
            warn!(error = %e, "Judge output unparseable, using fallback scores");
            return ScoreRecord::fallback(&e.to_string());
        }
    };

    let shape = classify_shape(&value);
    debug!(%shape, "Judge output classified");

    let normalized = match shape {
        Shape::Nested => normalize_nested(&value),
        Shape::Flat => normalize_flat(&value),
        Shape::Unknown => {
            warn!("Judge output has an unexpected JSON structure, using fallback scores");
            return ScoreRecord::fallback("unexpected JSON structure");
        }
    };

    normalized.unwrap_or_else(|e| {
        warn!(error = %e, %shape, "Judge output could not be normalized, using fallback scores");
        ScoreRecord::fallback(&e.to_string())
    })
}

/// `null`, `false`, zero, `""`, and `[]`.
fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
    }
}

/// Coerce a rubric value to an integer score in 1..=10.
///
/// Numbers and numeric strings are rounded half-to-even and clamped.
/// Booleans count as 1 and 0 before clamping. Anything else (missing,
/// null, non-numeric text, non-finite) becomes [`DEFAULT_SCORE`].
fn coerce_score(value: Option<&Value>) -> u8 {
    let number = match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::Bool(b)) => Some(if *b { 1.0 } else { 0.0 }),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };

    number
        .filter(|n| n.is_finite())
        .map(|n| n.round_ties_even().clamp(f64::from(MIN_SCORE), f64::from(MAX_SCORE)) as u8)
        .unwrap_or(DEFAULT_SCORE)
}

/// First candidate that is a string with visible content, trimmed.
fn pick_note<'a>(candidates: impl IntoIterator<Item = Option<&'a Value>>) -> String {
    candidates
        .into_iter()
        .flatten()
        .filter_map(Value::as_str)
        .map(str::trim)
        .find(|note| !note.is_empty())
        .unwrap_or(NO_NOTES)
        .to_string()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_classify() {
        assert_eq!(
            classify_shape(&json!({"coached": {}, "opponent": {}})),
            Shape::Nested
        );
        assert_eq!(classify_shape(&json!({"clarity_opponent": 3})), Shape::Flat);
        assert_eq!(classify_shape(&json!({"Logic_Coached": 3})), Shape::Flat);
        assert_eq!(classify_shape(&json!({"coached": {}})), Shape::Unknown);
        assert_eq!(classify_shape(&json!({"score": 9})), Shape::Unknown);
        assert_eq!(classify_shape(&json!([1, 2])), Shape::Unknown);
    }

    #[test]
    fn test_coerce_score() {
        assert_eq!(coerce_score(Some(&json!(7))), 7);
        assert_eq!(coerce_score(Some(&json!(7.6))), 8);
        assert_eq!(coerce_score(Some(&json!(6.5))), 6);
        assert_eq!(coerce_score(Some(&json!(7.5))), 8);
        assert_eq!(coerce_score(Some(&json!(" 9.0 "))), 9);
        assert_eq!(coerce_score(Some(&json!("nine"))), DEFAULT_SCORE);
        assert_eq!(coerce_score(Some(&json!(""))), DEFAULT_SCORE);
        assert_eq!(coerce_score(Some(&json!("NaN"))), DEFAULT_SCORE);
        assert_eq!(coerce_score(Some(&json!(null))), DEFAULT_SCORE);
        assert_eq!(coerce_score(Some(&json!(true))), 1);
        assert_eq!(coerce_score(Some(&json!(false))), 1);
        assert_eq!(coerce_score(Some(&json!([8]))), DEFAULT_SCORE);
        assert_eq!(coerce_score(None), DEFAULT_SCORE);
    }

    #[test]
    fn test_coerce_clamps_to_rubric_range() {
        assert_eq!(coerce_score(Some(&json!(0))), 1);
        assert_eq!(coerce_score(Some(&json!(-4))), 1);
        assert_eq!(coerce_score(Some(&json!(42))), 10);
        assert_eq!(coerce_score(Some(&json!("1e9"))), 10);
    }

    #[test]
    fn test_nested_score_suffix_and_note_aliases() {
        let value = json!({
            "coached": {
                "logic_score": 9, "relevance": "8", "clarity": 7,
                "persuasiveness": 6, "evidence_use": 5,
                "notes": "   ", "feedback": "  Sharp rebuttal.  "
            },
            "opponent": {"comment": "Thin evidence."}
        });
        let record = normalize_nested(&value).unwrap();
        assert_eq!(record.scores(Side::Coached), [9, 8, 7, 6, 5]);
        assert_eq!(record.total_coached, 7.0);
        assert_eq!(record.notes_coached, "Sharp rebuttal.");
        assert_eq!(record.scores(Side::Opponent), [5; 5]);
        assert_eq!(record.notes_opponent, "Thin evidence.");
    }

    #[test]
    fn test_nested_plain_key_wins_over_suffix() {
        let value = json!({
            "coached": {"logic": 3, "logic_score": 9},
            "opponent": {}
        });
        let record = normalize_nested(&value).unwrap();
        assert_eq!(record.logic_coached, 3);
    }

    #[test]
    fn test_nested_ignores_supplied_total() {
        let value = json!({
            "coached": {"logic": 10, "relevance": 10, "clarity": 10,
                        "persuasiveness": 10, "evidence_use": 10, "total": 2},
            "opponent": {"total": 10}
        });
        let record = normalize_nested(&value).unwrap();
        assert_eq!(record.total_coached, 10.0);
        assert_eq!(record.total_opponent, 5.0);
    }

    #[test]
    fn test_nested_null_side_is_empty() {
        let record = normalize_nested(&json!({"coached": null, "opponent": {}})).unwrap();
        assert_eq!(record.notes_coached, NO_NOTES);
        assert_eq!(record.total_coached, 5.0);
    }

    #[test]
    fn test_nested_falsy_side_keeps_other_scores() {
        for empty in [json!(""), json!(0), json!(false), json!([])] {
            let value = json!({"coached": {"logic": 9, "notes": "Sharp."}, "opponent": empty});
            let record = normalize_nested(&value).unwrap();
            assert_eq!(record.logic_coached, 9);
            assert_eq!(record.notes_coached, "Sharp.");
            assert_eq!(record.scores(Side::Opponent), [5; 5]);
            assert_eq!(record.notes_opponent, NO_NOTES);
        }
    }

    #[test]
    fn test_nested_scalar_side_is_error() {
        let err = normalize_nested(&json!({"coached": "great", "opponent": {}})).unwrap_err();
        assert_eq!(err, NormalizeError::SideNotObject(Side::Coached));
    }

    #[test]
    fn test_flat_case_insensitive_and_aliases() {
        let value = json!({
            "LOGIC_COACHED": 9,
            "relevance_coached": 7,
            "coach_notes": "Well argued.",
            "logic_opponent": "4",
            "opponent_notes": "Off topic."
        });
        let record = normalize_flat(&value).unwrap();
        assert_eq!(record.logic_coached, 9);
        assert_eq!(record.relevance_coached, 7);
        assert_eq!(record.clarity_coached, 5);
        assert_eq!(record.logic_opponent, 4);
        assert_eq!(record.notes_coached, "Well argued.");
        assert_eq!(record.notes_opponent, "Off topic.");
    }

    #[test]
    fn test_flat_generic_notes_only_for_coached() {
        let record = normalize_flat(&json!({"logic_coached": 6, "notes": "General."})).unwrap();
        assert_eq!(record.notes_coached, "General.");
        assert_eq!(record.notes_opponent, NO_NOTES);
    }

    #[test]
    fn test_flat_non_string_note_skipped() {
        let value = json!({"logic_coached": 6, "notes_coached": 3, "coached_notes": "Real note"});
        let record = normalize_flat(&value).unwrap();
        assert_eq!(record.notes_coached, "Real note");
    }

    #[test]
    fn test_evaluate_unknown_shape_falls_back() {
        let record = evaluate(r#"{"winner": "coached"}"#);
        assert!(record.is_fallback());
        assert!(record.notes_coached.contains("unexpected JSON structure"));
    }

    #[test]
    fn test_evaluate_scalar_side_falls_back() {
        let record = evaluate(json!({"coached": 8, "opponent": 6}));
        assert!(record.is_fallback());
        assert!(record.notes_opponent.contains("not an object"));
    }
}
