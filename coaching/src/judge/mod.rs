//! Judge-response normalization.
//!
//! Judge models are asked for a nested JSON object but routinely return
//! prose-wrapped JSON, flat key layouts, string-typed scores, or nothing
//! usable at all. [`evaluate`] absorbs all of that and always yields a
//! complete [`ScoreRecord`].
//!
//! ```text
//! raw ─→ extract_json_object ─┬─ None ──────────────→ fallback
//!                             └─ Some(value) ─→ classify_shape
//!                                                 ├─ Nested ─→ normalize_nested
//!                                                 ├─ Flat   ─→ normalize_flat
//!                                                 └─ Unknown ─→ fallback
//! ```

pub mod extract;
pub mod normalize;
pub mod record;

pub use extract::{extract_json_object, ExtractError, RawJudgeOutput};
pub use normalize::{classify_shape, evaluate, normalize_flat, normalize_nested, Shape};
pub use record::{Dimension, ScoreRecord, Side, SideScores, DEFAULT_SCORE, NO_NOTES};
