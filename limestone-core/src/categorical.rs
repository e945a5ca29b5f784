//! Categorical condition parser.
//!
//! One-hot columns are binary, so a condition over `cat__<feature>_<value>`
//! can only mean "feature is value" or "feature is not value". Conditions that
//! do not pin down one of the two are left untranslated rather than guessed.

use crate::condition::{FEATURE, NUMBER, ParseContext, Translation, is_close};
use crate::features::FeatureGroup;
use regex::Regex;
use std::sync::LazyLock;

static EQUALITY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"^({FEATURE})\s*(={{1,2}})\s*({NUMBER})"))
        .expect("categorical equality pattern is valid")
});

static INEQUALITY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"^({FEATURE})\s*([<>]=?)\s*({NUMBER})"))
        .expect("categorical inequality pattern is valid")
});

static RANGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"^({NUMBER})\s*<=?\s*({FEATURE})\s*<=?\s*({NUMBER})"))
        .expect("categorical range pattern is valid")
});

/// Which side of the indicator a condition selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Branch {
    /// Indicator is 1: the feature takes this category.
    Present,
    /// Indicator is 0.
    Absent,
}

fn equality_branch(value: f64) -> Option<Branch> {
    if is_close(value, 1.0) {
        Some(Branch::Present)
    } else if is_close(value, 0.0) {
        Some(Branch::Absent)
    } else {
        None
    }
}

fn inequality_branch(op: &str, value: f64) -> Option<Branch> {
    match op {
        ">" if value < 0.5 => Some(Branch::Present),
        ">=" if value <= 0.0 => Some(Branch::Present),
        "<" if value > 0.5 => Some(Branch::Absent),
        "<=" if value < 0.5 => Some(Branch::Absent),
        _ => None,
    }
}

fn range_branch(lower: f64, upper: f64) -> Option<Branch> {
    let lower_ok = is_close(lower, 0.0) || lower < 0.5;
    let upper_ok = is_close(upper, 1.0) || upper > 0.5;
    (lower_ok && upper_ok && lower < upper).then_some(Branch::Present)
}

fn is_categorical(feature: &str) -> bool {
    feature.starts_with(FeatureGroup::Categorical.prefix())
}

/// Find the shape, then the branch it selects. The first matching shape wins.
fn classify(condition: &str) -> Option<(&str, Branch)> {
    if let Some(caps) = EQUALITY.captures(condition) {
        let feature = caps.get(1)?.as_str();
        if !is_categorical(feature) {
            return None;
        }
        let value: f64 = caps.get(3)?.as_str().parse().ok()?;
        return equality_branch(value).map(|b| (feature, b));
    }
    if let Some(caps) = INEQUALITY.captures(condition) {
        let feature = caps.get(1)?.as_str();
        if !is_categorical(feature) {
            return None;
        }
        let value: f64 = caps.get(3)?.as_str().parse().ok()?;
        return inequality_branch(caps.get(2)?.as_str(), value).map(|b| (feature, b));
    }
    let caps = RANGE.captures(condition)?;
    let feature = caps.get(2)?.as_str();
    if !is_categorical(feature) {
        return None;
    }
    let lower: f64 = caps.get(1)?.as_str().parse().ok()?;
    let upper: f64 = caps.get(3)?.as_str().parse().ok()?;
    range_branch(lower, upper).map(|b| (feature, b))
}

/// Split `cat__<feature>_<value>` at the first underscore after the prefix.
/// Category values may themselves contain underscores. The column must be
/// one the fitted encoder actually emits.
fn decompose<'c>(feature: &'c str, ctx: &ParseContext<'_>) -> Option<(&'c str, &'c str)> {
    let rest = feature.strip_prefix(FeatureGroup::Categorical.prefix())?;
    if rest.contains("__") {
        return None;
    }
    let (original, category) = rest.split_once('_')?;
    if original.is_empty() || category.is_empty() {
        return None;
    }
    if !ctx.groups.contains(FeatureGroup::Categorical, original) {
        return None;
    }
    (ctx.handle.encoded_column(rest)? == (original, category)).then_some((original, category))
}

fn try_parse(condition: &str, ctx: &ParseContext<'_>) -> Option<String> {
    let (feature, branch) = classify(condition)?;
    let (original, category) = decompose(feature, ctx)?;
    Some(match branch {
        Branch::Present => format!("{original} is {category}"),
        Branch::Absent => format!("{original} is not {category}"),
    })
}

/// Translate a one-hot condition; passes the input through on any failure.
pub fn parse(condition: &str, ctx: &ParseContext<'_>) -> Translation {
    let result = try_parse(condition, ctx);
    if result.is_none() {
        tracing::debug!(condition, "not a decidable categorical condition");
    }
    Translation::from_option(result, condition)
}
