//! Template-question randomization.
//!
//! Question content may carry `{a}`-style placeholders with declared integer
//! ranges. Each attempt draws fresh values, substitutes them into the question
//! and answer texts, and for linear-equation questions computes the real
//! answer for the `{answer}` placeholder plus near-miss values for the
//! `{wrongAnswer*}` ones.

use std::collections::HashMap;

use rand::Rng;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VarRange {
    pub min: i64,
    pub max: i64,
}

pub type VarRanges = HashMap<String, VarRange>;
pub type VarValues = HashMap<String, i64>;

/// Draw one uniform value per declared variable, inclusive on both ends.
pub fn draw_values<R: Rng + ?Sized>(ranges: &VarRanges, rng: &mut R) -> VarValues {
    ranges
        .iter()
        .map(|(name, range)| {
            let (lo, hi) = (range.min.min(range.max), range.min.max(range.max));
            (name.clone(), rng.gen_range(lo..=hi))
        })
        .collect()
}

/// Replace every `{name}` placeholder with its drawn value.
pub fn substitute(text: &str, values: &VarValues) -> String {
    let mut out = text.to_owned();
    for (name, value) in values {
        out = out.replace(&format!("{{{name}}}"), &value.to_string());
    }
    out
}

fn coefficients(values: &VarValues) -> (f64, f64, f64) {
    let a = *values.get("a").unwrap_or(&1) as f64;
    let b = *values.get("b").unwrap_or(&0) as f64;
    let c = *values.get("c").unwrap_or(&0) as f64;
    (if a == 0.0 { 1.0 } else { a }, b, c)
}

/// Fill the answer placeholders for an `equation` question (ax + b = c).
/// The correct slot gets x = (c - b) / a; the wrong slots get plausible
/// miscalculations: off-by-one-or-two, sign flip on b, and the inverted
/// numerator.
pub fn resolve_answer<R: Rng + ?Sized>(
    content: &str,
    question_type: &str,
    is_correct: bool,
    values: &VarValues,
    rng: &mut R,
) -> String {
    let mut out = content.to_owned();

    if question_type == "equation" {
        let (a, b, c) = coefficients(values);
        let answer = (c - b) / a;
        if is_correct && out.contains("{answer}") {
            out = out.replace("{answer}", &answer.to_string());
        }
        if !is_correct {
            if out.contains("{wrongAnswer1}") {
                let offset = if rng.gen_bool(0.5) { 1.0 } else { 2.0 };
                out = out.replace("{wrongAnswer1}", &(answer + offset).to_string());
            }
            if out.contains("{wrongAnswer2}") {
                out = out.replace("{wrongAnswer2}", &((c + b) / a).to_string());
            }
            if out.contains("{wrongAnswer3}") {
                out = out.replace("{wrongAnswer3}", &((b - c) / a).abs().to_string());
            }
        }
    }

    substitute(&out, values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn values(pairs: &[(&str, i64)]) -> VarValues {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn draw_respects_inclusive_bounds() {
        let mut rng = StdRng::seed_from_u64(11);
        let ranges: VarRanges =
            [("a".to_string(), VarRange { min: 2, max: 5 })].into_iter().collect();
        for _ in 0..50 {
            let v = draw_values(&ranges, &mut rng);
            let a = v["a"];
            assert!((2..=5).contains(&a));
        }
    }

    #[test]
    fn substitute_replaces_every_occurrence() {
        let vals = values(&[("a", 3), ("b", 7)]);
        assert_eq!(
            substitute("{a}x + {b} = {a}", &vals),
            "3x + 7 = 3"
        );
    }

    #[test]
    fn equation_answer_is_computed() {
        let mut rng = StdRng::seed_from_u64(1);
        let vals = values(&[("a", 2), ("b", 1), ("c", 9)]);
        let out = resolve_answer("x = {answer}", "equation", true, &vals, &mut rng);
        assert_eq!(out, "x = 4");
    }

    #[test]
    fn fractional_answers_keep_their_precision() {
        let mut rng = StdRng::seed_from_u64(1);
        let vals = values(&[("a", 2), ("b", 0), ("c", 5)]);
        let out = resolve_answer("x = {answer}", "equation", true, &vals, &mut rng);
        assert_eq!(out, "x = 2.5");
    }

    #[test]
    fn wrong_answers_are_near_misses() {
        let mut rng = StdRng::seed_from_u64(5);
        let vals = values(&[("a", 1), ("b", 2), ("c", 10)]);

        let w1 = resolve_answer("{wrongAnswer1}", "equation", false, &vals, &mut rng);
        let w1: f64 = w1.parse().unwrap();
        assert!(w1 == 9.0 || w1 == 10.0);

        let w2 = resolve_answer("{wrongAnswer2}", "equation", false, &vals, &mut rng);
        assert_eq!(w2, "12");

        let w3 = resolve_answer("{wrongAnswer3}", "equation", false, &vals, &mut rng);
        assert_eq!(w3, "8");
    }

    #[test]
    fn correct_slot_is_never_filled_on_wrong_answers() {
        let mut rng = StdRng::seed_from_u64(5);
        let vals = values(&[("a", 1), ("b", 2), ("c", 10)]);
        let out = resolve_answer("{answer}", "equation", false, &vals, &mut rng);
        assert_eq!(out, "{answer}");
    }

    #[test]
    fn non_equation_types_only_substitute_variables() {
        let mut rng = StdRng::seed_from_u64(5);
        let vals = values(&[("r", 4)]);
        let out = resolve_answer("área de radio {r}: {answer}", "geometry", true, &vals, &mut rng);
        assert_eq!(out, "área de radio 4: {answer}");
    }
}
