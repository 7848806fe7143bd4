//! Pack / gram conversion
//!
//! A flavor's `pack_to_gram` ratio is the only conversion factor. Grams
//! derived from whole packs are rounded to whole grams; pack equivalents of
//! arbitrary gram amounts are fractional and meant for display only.

use serde::{Deserialize, Serialize};

/// Grams needed for `packs` packs, rounded to whole grams.
///
/// A non-positive or non-finite ratio yields 0.
pub fn grams_for_packs(packs: u32, pack_to_gram: f64) -> f64 {
    if !pack_to_gram.is_finite() || pack_to_gram <= 0.0 {
        return 0.0;
    }
    (f64::from(packs) * pack_to_gram).round()
}

/// Pack equivalent of `grams`, or `None` when the ratio is unknown.
///
/// Returning `None` rather than 0 keeps gram-only OEM lots from showing as
/// "0 packs".
pub fn packs_equivalent(grams: f64, pack_to_gram: f64) -> Option<f64> {
    (pack_to_gram.is_finite() && pack_to_gram > 0.0 && grams.is_finite())
        .then(|| grams / pack_to_gram)
}

/// A recipe ingredient line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeLine {
    pub ingredient: String,
    /// Nominal quantity; only the proportions between lines matter
    pub qty: f64,
    pub unit: String,
}

/// Expected amount of one ingredient for a production run
#[derive(Debug, Clone, PartialEq)]
pub struct ScaledIngredient {
    pub ingredient: String,
    pub grams: f64,
    pub unit: String,
}

/// Scale a recipe to a total batch weight.
///
/// Each ingredient gets `round(total * qty / sum(qty))`. When the recipe sums
/// to zero or the total is not positive, every line is 0.
pub fn scale_recipe(recipe: &[RecipeLine], total_grams: f64) -> Vec<ScaledIngredient> {
    let sum: f64 = recipe
        .iter()
        .map(|r| if r.qty.is_finite() { r.qty } else { 0.0 })
        .sum();
    let scalable = sum > 0.0 && total_grams.is_finite() && total_grams > 0.0;

    recipe
        .iter()
        .map(|r| {
            let grams = if scalable && r.qty.is_finite() {
                (total_grams * r.qty / sum).round()
            } else {
                0.0
            };
            ScaledIngredient {
                ingredient: r.ingredient.clone(),
                grams,
                unit: r.unit.clone(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(ingredient: &str, qty: f64) -> RecipeLine {
        RecipeLine {
            ingredient: ingredient.to_string(),
            qty,
            unit: "g".to_string(),
        }
    }

    #[test]
    fn test_grams_for_packs_is_exact_for_whole_packs() {
        assert_eq!(grams_for_packs(160, 850.0), 136_000.0);
        assert_eq!(grams_for_packs(0, 850.0), 0.0);
        assert_eq!(grams_for_packs(3, 333.3), 1000.0);
        assert_eq!(grams_for_packs(10, 0.0), 0.0);
        assert_eq!(grams_for_packs(10, f64::NAN), 0.0);
    }

    #[test]
    fn test_packs_equivalent_unknown_ratio() {
        assert_eq!(packs_equivalent(5000.0, 0.0), None);
        assert_eq!(packs_equivalent(5000.0, -1.0), None);
        assert_eq!(packs_equivalent(4250.0, 850.0), Some(5.0));
    }

    #[test]
    fn test_conversions_are_inverse_within_rounding() {
        for ratio in [850.0, 333.3, 12.75, 1.0, 1000.5] {
            for packs in [0u32, 1, 7, 60, 100, 160, 999] {
                let grams = grams_for_packs(packs, ratio);
                let back = packs_equivalent(grams, ratio).unwrap();
                assert!(
                    (back - f64::from(packs)).abs() <= 0.5 / ratio + 1e-9,
                    "ratio={ratio} packs={packs} back={back}"
                );
            }
        }
    }

    #[test]
    fn test_scale_recipe_proportions() {
        let recipe = vec![line("果汁", 3.0), line("砂糖", 1.0)];
        let scaled = scale_recipe(&recipe, 1000.0);
        assert_eq!(scaled[0].grams, 750.0);
        assert_eq!(scaled[1].grams, 250.0);
        assert_eq!(scaled[0].ingredient, "果汁");
    }

    #[test]
    fn test_scale_recipe_degenerate_inputs() {
        let recipe = vec![line("果汁", 0.0), line("砂糖", 0.0)];
        assert!(scale_recipe(&recipe, 1000.0).iter().all(|s| s.grams == 0.0));

        let recipe = vec![line("果汁", 3.0)];
        assert_eq!(scale_recipe(&recipe, 0.0)[0].grams, 0.0);
        assert!(scale_recipe(&[], 1000.0).is_empty());
    }
}
