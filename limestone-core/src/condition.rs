//! Shared types for condition parsing.

use crate::features::FeatureGroups;
use crate::pipeline::TransformerHandle;
use serde::{Deserialize, Serialize};

/// A single `(condition, weight)` pair of a local explanation.
///
/// Serialized as a two-element array, the shape explainers emit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "(String, f64)", into = "(String, f64)")]
pub struct ExplanationItem {
    pub condition: String,
    /// Signed contribution; positive pushes towards the explained class.
    pub weight: f64,
}

impl ExplanationItem {
    pub fn new(condition: impl Into<String>, weight: f64) -> Self {
        Self {
            condition: condition.into(),
            weight,
        }
    }
}

impl From<(String, f64)> for ExplanationItem {
    fn from((condition, weight): (String, f64)) -> Self {
        Self { condition, weight }
    }
}

impl From<ExplanationItem> for (String, f64) {
    fn from(item: ExplanationItem) -> Self {
        (item.condition, item.weight)
    }
}

/// Result of one parser over one condition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Translation {
    pub text: String,
    /// `false` means `text` is the untouched input.
    pub translated: bool,
}

impl Translation {
    pub fn translated(text: String) -> Self {
        Self {
            text,
            translated: true,
        }
    }

    pub fn passthrough(original: &str) -> Self {
        Self {
            text: original.to_string(),
            translated: false,
        }
    }

    pub(crate) fn from_option(result: Option<String>, original: &str) -> Self {
        result.map_or_else(|| Self::passthrough(original), Self::translated)
    }
}

/// Everything a parser may consult. Borrowed, never mutated.
#[derive(Clone, Copy)]
pub struct ParseContext<'a> {
    pub handle: &'a dyn TransformerHandle,
    pub groups: &'a FeatureGroups,
}

impl<'a> ParseContext<'a> {
    pub fn new(handle: &'a dyn TransformerHandle, groups: &'a FeatureGroups) -> Self {
        Self { handle, groups }
    }
}

/// A total parse function: always returns, never panics on bad input.
pub type ConditionParser = fn(&str, &ParseContext<'_>) -> Translation;

/// Signed decimal token as matched by the condition patterns.
pub(crate) const NUMBER: &str = r"-?\d+\.?\d*";

/// Transformed feature-name token.
pub(crate) const FEATURE: &str = r"[a-zA-Z0-9_]+";

/// `numpy.isclose` with default tolerances.
pub(crate) fn is_close(a: f64, b: f64) -> bool {
    (a - b).abs() <= 1e-8 + 1e-5 * b.abs()
}
