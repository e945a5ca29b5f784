//! Numeric condition parser.
//!
//! Recognizes `<feature> <op> <t>` and `<lo> <op1> <feature> <op2> <hi>` over
//! scaled (and optionally log1p-transformed) features, and rewrites the
//! thresholds in original units.

use crate::condition::{FEATURE, NUMBER, ParseContext, Translation, is_close};
use crate::features::FeatureGroup;
use crate::pipeline::StandardScaler;
use regex::Regex;
use std::sync::LazyLock;

static SIMPLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"^({FEATURE})\s*([<>=!]+)\s*({NUMBER})"))
        .expect("simple numeric condition pattern is valid")
});

static RANGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"^({NUMBER})\s*(<=?)\s*({FEATURE})\s*(<=?)\s*({NUMBER})"))
        .expect("range numeric condition pattern is valid")
});

const OPERATORS: [&str; 6] = ["<", "<=", ">", ">=", "==", "!="];

#[derive(Debug, PartialEq)]
enum Shape<'c> {
    Simple {
        feature: &'c str,
        op: &'c str,
        threshold: f64,
    },
    Range {
        lower: f64,
        op_lower: &'c str,
        feature: &'c str,
        op_upper: &'c str,
        upper: f64,
    },
}

fn lex(condition: &str) -> Option<Shape<'_>> {
    if let Some(caps) = SIMPLE.captures(condition) {
        let op = caps.get(2)?.as_str();
        if OPERATORS.contains(&op) {
            return Some(Shape::Simple {
                feature: caps.get(1)?.as_str(),
                op,
                threshold: caps.get(3)?.as_str().parse().ok()?,
            });
        }
    }
    let caps = RANGE.captures(condition)?;
    Some(Shape::Range {
        lower: caps.get(1)?.as_str().parse().ok()?,
        op_lower: caps.get(2)?.as_str(),
        feature: caps.get(3)?.as_str(),
        op_upper: caps.get(4)?.as_str(),
        upper: caps.get(5)?.as_str().parse().ok()?,
    })
}

/// A transformed feature token resolved against the groups and the handle.
struct ResolvedFeature<'a> {
    name: &'a str,
    index: usize,
    scaler: &'a StandardScaler,
    uses_log: bool,
}

fn resolve<'a>(feature: &'a str, ctx: &ParseContext<'a>) -> Option<ResolvedFeature<'a>> {
    let (group, rest) = FeatureGroup::split_transformed(feature)?;
    let (name, uses_log) = match group {
        FeatureGroup::NumLogIter => match rest.strip_suffix("_log") {
            Some(stripped) => (stripped, true),
            None => (rest, false),
        },
        FeatureGroup::NumMode => (rest, false),
        FeatureGroup::Categorical => return None,
    };
    let index = ctx.groups.position(group, name)?;
    let handle = ctx.handle;
    let scaler = handle.scaler(group)?;
    Some(ResolvedFeature {
        name,
        index,
        scaler,
        uses_log,
    })
}

impl ResolvedFeature<'_> {
    /// Map a transformed-space value back to original units.
    fn invert(&self, transformed: f64) -> Option<f64> {
        let mut row = vec![0.0; self.scaler.n_features_in()];
        *row.get_mut(self.index)? = transformed;
        let value = *self.scaler.inverse_transform_row(&row).ok()?.get(self.index)?;
        if !self.uses_log {
            return Some(value);
        }
        // expm1 of a tiny negative would print as -0.00
        if value < 0.0 && is_close(value, 0.0) {
            return Some(0.0);
        }
        Some(value.exp_m1())
    }
}

fn format_value(value: f64) -> String {
    format!("{value:.2}")
}

fn try_parse(condition: &str, ctx: &ParseContext<'_>) -> Option<String> {
    let shape = lex(condition)?;
    match shape {
        Shape::Simple {
            feature,
            op,
            threshold,
        } => {
            let resolved = resolve(feature, ctx)?;
            let value = resolved.invert(threshold)?;
            Some(format!("{} {} {}", resolved.name, op, format_value(value)))
        }
        Shape::Range {
            lower,
            op_lower,
            feature,
            op_upper,
            upper,
        } => {
            let resolved = resolve(feature, ctx)?;
            let lower = resolved.invert(lower)?;
            let upper = resolved.invert(upper)?;
            Some(format!(
                "{} {} {} {} {}",
                format_value(lower),
                op_lower,
                resolved.name,
                op_upper,
                format_value(upper)
            ))
        }
    }
}

/// Translate a numeric condition; passes the input through on any failure.
pub fn parse(condition: &str, ctx: &ParseContext<'_>) -> Translation {
    let result = try_parse(condition, ctx);
    if result.is_none() {
        tracing::debug!(condition, "not a resolvable numeric condition");
    }
    Translation::from_option(result, condition)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::FeatureGroups;
    use crate::pipeline::TransformerHandle;
    use pretty_assertions::assert_eq;

    struct FixedScalers {
        log_iter: StandardScaler,
        mode: StandardScaler,
    }

    impl TransformerHandle for FixedScalers {
        fn scaler(&self, group: FeatureGroup) -> Option<&StandardScaler> {
            match group {
                FeatureGroup::NumLogIter => Some(&self.log_iter),
                FeatureGroup::NumMode => Some(&self.mode),
                FeatureGroup::Categorical => None,
            }
        }

        fn encoded_column(&self, _: &str) -> Option<(&str, &str)> {
            None
        }
    }

    fn handle() -> FixedScalers {
        FixedScalers {
            log_iter: StandardScaler::new(
                vec![9.7, 11.4, 11.0, 2.0, 4.2, 3.5],
                vec![0.5, 0.5, 0.6, 0.9, 0.9, 0.3],
            )
            .unwrap(),
            mode: StandardScaler::new(vec![0.4, 0.25, 1.2, 21.0], vec![1.1, 0.8, 1.7, 10.0])
                .unwrap(),
        }
    }

    fn run(condition: &str) -> Translation {
        let handle = handle();
        let groups = FeatureGroups::default();
        parse(condition, &ParseContext::new(&handle, &groups))
    }

    #[test]
    fn test_lex_shapes() {
        assert_eq!(
            lex("num_mode__DELINQ > 1.20"),
            Some(Shape::Simple {
                feature: "num_mode__DELINQ",
                op: ">",
                threshold: 1.2
            })
        );
        assert_eq!(
            lex("-0.50 < num_log_iter__CLAGE_log <= 0.20"),
            Some(Shape::Range {
                lower: -0.5,
                op_lower: "<",
                feature: "num_log_iter__CLAGE_log",
                op_upper: "<=",
                upper: 0.2
            })
        );
        assert!(matches!(
            lex("0.1 <= num_mode__NINQ < 1"),
            Some(Shape::Range { op_lower: "<=", op_upper: "<", .. })
        ));
        assert_eq!(lex("num_mode__DELINQ =< 1.0"), None);
        assert_eq!(lex("DELINQ is high"), None);
    }

    #[test]
    fn test_simple_log_feature() {
        let t = run("num_log_iter__CLAGE_log <= -0.43");
        let expected = (-0.43f64 * 0.9 + 4.2).exp_m1();
        assert!(t.translated);
        assert_eq!(t.text, format!("CLAGE <= {expected:.2}"));
    }

    #[test]
    fn test_simple_mode_feature() {
        let t = run("num_mode__CLNO > 0.35");
        assert_eq!(t, Translation::translated("CLNO > 24.50".into()));
    }

    #[test]
    fn test_range_preserves_operators() {
        let t = run("-0.50 < num_log_iter__CLAGE_log <= 0.20");
        assert!(t.translated);
        let lower = (-0.5f64 * 0.9 + 4.2).exp_m1();
        let upper = (0.2f64 * 0.9 + 4.2).exp_m1();
        assert_eq!(t.text, format!("{lower:.2} < CLAGE <= {upper:.2}"));

        let t = run("0.10 <= num_mode__NINQ < 1.00");
        assert_eq!(t.text, "1.37 <= NINQ < 2.90");
    }

    #[test]
    fn test_near_zero_negative_clamps() {
        // -4.2 / 0.9 scales back to zero up to rounding
        let t = run(&format!("num_log_iter__CLAGE_log > {}", -4.2 / 0.9));
        assert_eq!(t.text, "CLAGE > 0.00");
    }

    #[test]
    fn test_log_group_without_suffix() {
        let t = run("num_log_iter__YOJ <= 0.00");
        assert_eq!(t.text, "YOJ <= 2.00");
    }

    #[test]
    fn test_unresolvable_features_pass_through() {
        for condition in [
            "num_mode__INCOME > 0.10",
            "num_log_iter__DELINQ_log > 0.10",
            "num_mode__CLAGE_log > 0.10",
            "cat__JOB_Office > 0.50",
            "remainder__LOAN <= 1.00",
        ] {
            assert_eq!(run(condition), Translation::passthrough(condition));
        }
    }

    #[test]
    fn test_missing_scaler_passes_through() {
        struct NoScalers;
        impl TransformerHandle for NoScalers {
            fn scaler(&self, _: FeatureGroup) -> Option<&StandardScaler> {
                None
            }
            fn encoded_column(&self, _: &str) -> Option<(&str, &str)> {
                None
            }
        }
        let groups = FeatureGroups::default();
        let t = parse("num_mode__DELINQ > 1.00", &ParseContext::new(&NoScalers, &groups));
        assert!(!t.translated);
    }

    #[test]
    fn test_scaler_narrower_than_descriptor() {
        struct Narrow(StandardScaler);
        impl TransformerHandle for Narrow {
            fn scaler(&self, _: FeatureGroup) -> Option<&StandardScaler> {
                Some(&self.0)
            }
            fn encoded_column(&self, _: &str) -> Option<(&str, &str)> {
                None
            }
        }
        let handle = Narrow(StandardScaler::new(vec![0.0], vec![1.0]).unwrap());
        let groups = FeatureGroups::default();
        let t = parse("num_mode__CLNO > 1.00", &ParseContext::new(&handle, &groups));
        assert!(!t.translated);
    }

}
