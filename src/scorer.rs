//! # Recommendation Scorer
//!
//! Scores each recipe by the share of its requirements present in the
//! availability set and ranks the catalog from most to least feasible.
//!
//! ## Ordering
//!
//! - Higher feasibility first. Ratios are compared by cross-multiplying the
//!   integer counts, so 1/3 and 2/6 tie exactly.
//! - Equal feasibility: recipe name ascending.
//! - Equal names: catalog order (the sort is stable).
//!
//! Ranks start at 1 and are never shared, even between tied recipes.

use serde::Serialize;
use std::cmp::Ordering;

use crate::aggregator::Availability;
use crate::recipe::Recipe;

/// A ranked recipe, the unit of output of the engine
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    /// 1-indexed position in the ranking
    pub rank: usize,
    /// Percentage of requirements available, in `[0, 100]`
    pub score: f64,
    pub recipe: Recipe,
}

#[derive(Debug)]
struct ScoredRecipe {
    recipe: Recipe,
    matched: usize,
    total: usize,
}

impl ScoredRecipe {
    fn evaluate(availability: &Availability, recipe: Recipe) -> Self {
        let matched = count_matched(availability, &recipe);
        let total = recipe.requirements().len();
        Self {
            recipe,
            matched,
            total,
        }
    }

    fn score(&self) -> f64 {
        self.matched as f64 / self.total as f64 * 100.0
    }

    /// Descending feasibility, then ascending name
    fn rank_order(&self, other: &Self) -> Ordering {
        let ours = self.matched * other.total;
        let theirs = other.matched * self.total;
        theirs
            .cmp(&ours)
            .then_with(|| self.recipe.name().cmp(other.recipe.name()))
    }
}

fn count_matched(availability: &Availability, recipe: &Recipe) -> usize {
    recipe
        .requirements()
        .iter()
        .filter(|requirement| availability.contains(&requirement.name))
        .count()
}

/// Feasibility score of a single recipe
pub fn score_recipe(availability: &Availability, recipe: &Recipe) -> f64 {
    count_matched(availability, recipe) as f64 / recipe.requirements().len() as f64 * 100.0
}

/// Score and rank a whole catalog
///
/// The output has one entry per catalog recipe, ranked `1..=N`.
pub fn rank_recipes(availability: &Availability, catalog: Vec<Recipe>) -> Vec<Recommendation> {
    let mut scored: Vec<ScoredRecipe> = catalog
        .into_iter()
        .map(|recipe| ScoredRecipe::evaluate(availability, recipe))
        .collect();

    scored.sort_by(|a, b| a.rank_order(b));

    scored
        .into_iter()
        .enumerate()
        .map(|(index, scored)| Recommendation {
            rank: index + 1,
            score: scored.score(),
            recipe: scored.recipe,
        })
        .collect()
}
