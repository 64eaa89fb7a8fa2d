//! # Engine Tests
//!
//! End-to-end behaviour of `RecommendationEngine::recommend` over in-memory
//! stores and failing suppliers.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use pantry::engine::{IngredientSupply, RecipeSupply, RecommendationEngine};
use pantry::in_memory::{InMemoryIngredientStore, InMemoryRecipeStore};
use pantry::ingredient::IngredientRecord;
use pantry::recipe::Recipe;
use pantry::RecommendationError;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};

fn ingredient(name: &str, measure_type: &str, quantity: i64) -> IngredientRecord {
    IngredientRecord::new(name, measure_type, quantity).unwrap()
}

fn recipe(name: &str, requirements: &[(&str, &str, i64)]) -> Recipe {
    Recipe::new(
        name,
        requirements
            .iter()
            .map(|(n, m, q)| ingredient(n, m, *q))
            .collect(),
    )
    .unwrap()
}

fn rice_catalog() -> Vec<Recipe> {
    vec![
        recipe(
            "Rice with Onion and Garlic",
            &[("Onion", "unit", 1), ("Rice", "mg", 500), ("Garlic", "unit", 2)],
        ),
        recipe("Rice with Garlic", &[("Rice", "mg", 500), ("Garlic", "unit", 2)]),
        recipe("Rice with Onion", &[("Onion", "unit", 1), ("Rice", "mg", 500)]),
        recipe("Fries", &[("Potato", "unit", 2)]),
    ]
}

struct FailingIngredients;

#[async_trait]
impl IngredientSupply for FailingIngredients {
    async fn supply_ingredients(&self) -> Result<Vec<IngredientRecord>> {
        Err(anyhow!("storage unavailable"))
    }
}

#[derive(Default)]
struct FailingRecipes {
    called: AtomicBool,
}

#[async_trait]
impl RecipeSupply for FailingRecipes {
    async fn supply_recipes(&self) -> Result<Vec<Recipe>> {
        self.called.store(true, Ordering::SeqCst);
        Err(anyhow!("catalog unavailable"))
    }
}

#[tokio::test]
async fn test_end_to_end_ranking() -> Result<()> {
    let engine = RecommendationEngine::new(
        InMemoryIngredientStore::with_records(vec![
            ingredient("Onion", "unit", 1),
            ingredient("Rice", "mg", 500),
        ]),
        InMemoryRecipeStore::with_recipes(rice_catalog()),
    );

    let recommendations = engine.recommend().await?;

    let ranking: Vec<(usize, &str)> = recommendations
        .iter()
        .map(|r| (r.rank, r.recipe.name()))
        .collect();
    assert_eq!(
        ranking,
        vec![
            (1, "Rice with Onion"),
            (2, "Rice with Onion and Garlic"),
            (3, "Rice with Garlic"),
            (4, "Fries"),
        ]
    );

    assert_eq!(recommendations[0].score, 100.0);
    assert!((recommendations[1].score - 66.67).abs() < 0.01);
    assert_eq!(recommendations[2].score, 50.0);
    assert_eq!(recommendations[3].score, 0.0);

    Ok(())
}

#[tokio::test]
async fn test_duplicate_holdings_count_once_for_presence() -> Result<()> {
    let engine = RecommendationEngine::new(
        InMemoryIngredientStore::with_records(vec![
            ingredient("onion", "unit", 10),
            ingredient("garlic", "unit", 2),
            ingredient("onion", "unit", 10),
        ]),
        InMemoryRecipeStore::with_recipes(vec![recipe(
            "Onion Garlic Soup",
            &[("onion", "unit", 3), ("garlic", "unit", 1)],
        )]),
    );

    let recommendations = engine.recommend().await?;
    assert_eq!(recommendations.len(), 1);
    assert_eq!(recommendations[0].score, 100.0);

    Ok(())
}

#[tokio::test]
async fn test_ranks_are_dense_and_total() -> Result<()> {
    let catalog: Vec<Recipe> = (0..25)
        .map(|i| {
            let requirements: Vec<(String, &str, i64)> = (0..=(i % 4))
                .map(|j| (format!("item-{}", (i + j) % 7), "unit", 1))
                .collect();
            let borrowed: Vec<(&str, &str, i64)> = requirements
                .iter()
                .map(|(n, m, q)| (n.as_str(), *m, *q))
                .collect();
            recipe(&format!("Recipe {i:02}"), &borrowed)
        })
        .collect();

    let engine = RecommendationEngine::new(
        InMemoryIngredientStore::with_records(vec![
            ingredient("item-1", "unit", 1),
            ingredient("item-4", "unit", 1),
        ]),
        InMemoryRecipeStore::with_recipes(catalog),
    );

    let recommendations = engine.recommend().await?;
    assert_eq!(recommendations.len(), 25);

    let ranks: HashSet<usize> = recommendations.iter().map(|r| r.rank).collect();
    assert_eq!(ranks, (1..=25).collect::<HashSet<usize>>());
    assert!(recommendations
        .windows(2)
        .all(|pair| pair[0].score >= pair[1].score));

    Ok(())
}

#[tokio::test]
async fn test_empty_catalog_is_not_an_error() -> Result<()> {
    let engine = RecommendationEngine::new(
        InMemoryIngredientStore::with_records(vec![ingredient("Onion", "unit", 1)]),
        InMemoryRecipeStore::new(),
    );

    assert!(engine.recommend().await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_empty_inventory_keeps_every_recipe() -> Result<()> {
    let engine = RecommendationEngine::new(
        InMemoryIngredientStore::new(),
        InMemoryRecipeStore::with_recipes(rice_catalog()),
    );

    let recommendations = engine.recommend().await?;
    assert_eq!(recommendations.len(), 4);
    assert!(recommendations.iter().all(|r| r.score == 0.0));

    // Ties are ordered by recipe name
    let names: Vec<&str> = recommendations.iter().map(|r| r.recipe.name()).collect();
    assert_eq!(
        names,
        vec![
            "Fries",
            "Rice with Garlic",
            "Rice with Onion",
            "Rice with Onion and Garlic"
        ]
    );
    Ok(())
}

#[tokio::test]
async fn test_ranking_is_reproducible() -> Result<()> {
    let engine = RecommendationEngine::new(
        InMemoryIngredientStore::with_records(vec![ingredient("Rice", "mg", 1)]),
        InMemoryRecipeStore::with_recipes(rice_catalog()),
    );

    let first = engine.recommend().await?;
    for _ in 0..5 {
        assert_eq!(engine.recommend().await?, first);
    }
    Ok(())
}

#[tokio::test]
async fn test_ingredient_failure_propagates() {
    let engine = RecommendationEngine::new(
        FailingIngredients,
        InMemoryRecipeStore::with_recipes(rice_catalog()),
    );

    match engine.recommend().await {
        Err(RecommendationError::IngredientSupply(err)) => {
            assert!(err.to_string().contains("storage unavailable"));
        }
        other => panic!("expected ingredient supply failure, got {other:?}"),
    }
}

#[tokio::test]
async fn test_ingredient_failure_takes_precedence() {
    let engine = RecommendationEngine::new(FailingIngredients, FailingRecipes::default());

    let result = engine.recommend().await;
    assert!(matches!(result, Err(RecommendationError::IngredientSupply(_))));
    assert!(!engine.recipes().called.load(Ordering::SeqCst));
}

#[tokio::test]
async fn test_recipe_failure_propagates() {
    let engine = RecommendationEngine::new(
        InMemoryIngredientStore::with_records(vec![ingredient("Onion", "unit", 1)]),
        FailingRecipes::default(),
    );

    let result = engine.recommend().await;
    assert!(matches!(result, Err(RecommendationError::RecipeSupply(_))));
}
