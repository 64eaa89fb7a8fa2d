//! # Recommendation Engine
//!
//! Wires the two read-side collaborators to the aggregator and the scorer.
//!
//! The engine reads the ingredient holdings first and the recipe catalog
//! second. A failing supplier aborts the call; nothing is retried and no
//! partial ranking is returned.

use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

use crate::aggregator::{aggregate_ingredients, Availability};
use crate::errors::RecommendationError;
use crate::ingredient::{IngredientEntry, IngredientRecord};
use crate::recipe::Recipe;
use crate::scorer::{rank_recipes, Recommendation};

/// Source of the current ingredient holdings
#[async_trait]
pub trait IngredientSupply: Send + Sync {
    /// Raw holdings; may contain several records per name
    async fn supply_ingredients(&self) -> Result<Vec<IngredientRecord>>;
}

/// Source of the full recipe catalog
#[async_trait]
pub trait RecipeSupply: Send + Sync {
    async fn supply_recipes(&self) -> Result<Vec<Recipe>>;
}

#[async_trait]
impl<T: IngredientSupply + ?Sized> IngredientSupply for Arc<T> {
    async fn supply_ingredients(&self) -> Result<Vec<IngredientRecord>> {
        (**self).supply_ingredients().await
    }
}

#[async_trait]
impl<T: RecipeSupply + ?Sized> RecipeSupply for Arc<T> {
    async fn supply_recipes(&self) -> Result<Vec<Recipe>> {
        (**self).supply_recipes().await
    }
}

/// Read-write ingredient storage
#[async_trait]
pub trait IngredientStore: IngredientSupply {
    /// Store a holding, returning its id
    async fn add_ingredient(&self, record: IngredientRecord) -> Result<i64>;

    /// Every stored holding with its id, oldest first
    async fn list_entries(&self) -> Result<Vec<IngredientEntry>>;

    /// Replace a holding; `false` when the id is unknown
    async fn update_ingredient(&self, id: i64, record: IngredientRecord) -> Result<bool>;

    /// Remove a holding; `false` when the id is unknown
    async fn delete_ingredient(&self, id: i64) -> Result<bool>;

    /// Holdings aggregated by name, sorted by name
    async fn find_ingredients(&self) -> Result<Vec<IngredientRecord>> {
        let records = self.supply_ingredients().await?;
        Ok(aggregate_ingredients(&records).into_records())
    }
}

/// Read-write recipe storage
#[async_trait]
pub trait RecipeStore: RecipeSupply {
    /// Store a recipe, returning its id. Names are unique.
    async fn add_recipe(&self, recipe: Recipe) -> Result<i64>;

    /// Remove a recipe and its requirements; `false` when the id is unknown
    async fn delete_recipe(&self, id: i64) -> Result<bool>;
}

/// Error raised by stores when a recipe name is already taken
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateRecipe(pub String);

impl std::fmt::Display for DuplicateRecipe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "a recipe named '{}' already exists", self.0)
    }
}

impl std::error::Error for DuplicateRecipe {}

/// Ranks the recipe catalog against the current holdings
#[derive(Debug, Clone)]
pub struct RecommendationEngine<I, R> {
    ingredients: I,
    recipes: R,
}

impl<I, R> RecommendationEngine<I, R>
where
    I: IngredientSupply,
    R: RecipeSupply,
{
    pub fn new(ingredients: I, recipes: R) -> Self {
        Self {
            ingredients,
            recipes,
        }
    }

    pub fn recipes(&self) -> &R {
        &self.recipes
    }

    /// Read both suppliers, then aggregate, score and rank
    ///
    /// An ingredient supply failure is returned before the recipe catalog
    /// is requested.
    pub async fn recommend(&self) -> Result<Vec<Recommendation>, RecommendationError> {
        let records = self
            .ingredients
            .supply_ingredients()
            .await
            .map_err(RecommendationError::IngredientSupply)?;

        let catalog = self
            .recipes
            .supply_recipes()
            .await
            .map_err(RecommendationError::RecipeSupply)?;

        Ok(recommend_from(&records, catalog))
    }
}

/// Rank a catalog against raw holdings without touching any supplier
pub fn recommend_from(records: &[IngredientRecord], catalog: Vec<Recipe>) -> Vec<Recommendation> {
    let availability = aggregate_ingredients(records);
    recommend_with(&availability, catalog)
}

/// Rank a catalog against an already aggregated availability set
pub fn recommend_with(availability: &Availability, catalog: Vec<Recipe>) -> Vec<Recommendation> {
    let catalog_size = catalog.len();
    let recommendations = rank_recipes(availability, catalog);
    debug!(
        available = availability.len(),
        recipes = catalog_size,
        "Ranked recipe catalog"
    );
    recommendations
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str) -> IngredientRecord {
        IngredientRecord::new(name, "unit", 1).unwrap()
    }

    #[test]
    fn test_recommend_from_aggregates_first() {
        let catalog = vec![
            Recipe::new("Garlic Bread", vec![record("Garlic"), record("Bread")]).unwrap(),
            Recipe::new("Toast", vec![record("Bread")]).unwrap(),
        ];
        let ranked = recommend_from(&[record("Bread"), record("Bread")], catalog);

        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].recipe.name(), "Toast");
        assert_eq!(ranked[0].score, 100.0);
        assert_eq!(ranked[1].score, 50.0);
    }

    #[test]
    fn test_duplicate_recipe_message() {
        assert_eq!(
            DuplicateRecipe("Fries".to_string()).to_string(),
            "a recipe named 'Fries' already exists"
        );
    }
}
