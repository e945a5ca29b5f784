//! Explanation translator.
//!
//! Rewrites every condition of a local explanation from transformed feature
//! space to original units. Weights and order are preserved exactly; a
//! condition no parser understands is kept verbatim.

use crate::categorical;
use crate::condition::{ConditionParser, ExplanationItem, ParseContext, Translation};
use crate::error::LimestoneError;
use crate::features::FeatureGroups;
use crate::numeric;
use crate::pipeline::{Pipeline, TransformerHandle, resolve_column_transformer};

/// Parsers in priority order. The first successful translation wins.
const PARSERS: [(&str, ConditionParser); 2] = [
    ("numeric", numeric::parse),
    ("categorical", categorical::parse),
];

/// Translator bound to one transformer handle and feature layout.
///
/// Holds only shared references to `Sync` data, so one instance can serve
/// concurrent callers.
#[derive(Clone, Copy)]
pub struct ConditionTranslator<'a> {
    ctx: ParseContext<'a>,
}

impl<'a> ConditionTranslator<'a> {
    pub fn new(handle: &'a dyn TransformerHandle, groups: &'a FeatureGroups) -> Self {
        Self {
            ctx: ParseContext::new(handle, groups),
        }
    }

    /// Translate one condition string.
    pub fn translate_condition(&self, condition: &str) -> Translation {
        for (name, parser) in PARSERS {
            let result = parser(condition, &self.ctx);
            if result.translated {
                tracing::trace!(condition, parser = name, translated = %result.text, "translated condition");
                return result;
            }
        }
        tracing::warn!(condition, "Could not translate condition");
        Translation::passthrough(condition)
    }

    /// Translate a whole explanation, one output item per input item.
    pub fn translate(&self, explanation: &[ExplanationItem]) -> Vec<ExplanationItem> {
        self.translate_counted(explanation).0
    }

    /// Like [`translate`](Self::translate), also returning how many
    /// conditions were passed through untranslated.
    fn translate_counted(&self, explanation: &[ExplanationItem]) -> (Vec<ExplanationItem>, usize) {
        let mut untranslated = 0;
        let items = explanation
            .iter()
            .map(|item| {
                let result = self.translate_condition(&item.condition);
                if !result.translated {
                    untranslated += 1;
                }
                ExplanationItem {
                    condition: result.text,
                    weight: item.weight,
                }
            })
            .collect();
        (items, untranslated)
    }
}

/// Translate a raw explanation against a full fitted pipeline.
///
/// Fails before touching any condition if the pipeline does not contain a
/// column transformer at `preprocessor` → `preprocessor`.
pub fn translate_explanation(
    raw: &[ExplanationItem],
    pipeline: &Pipeline,
    groups: &FeatureGroups,
) -> Result<Vec<ExplanationItem>, LimestoneError> {
    let column_transformer = resolve_column_transformer(pipeline)?;
    let translator = ConditionTranslator::new(column_transformer, groups);
    let (translated, untranslated) = translator.translate_counted(raw);
    tracing::debug!(
        total = raw.len(),
        untranslated,
        "translated explanation"
    );
    Ok(translated)
}
