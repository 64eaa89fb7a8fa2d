//! # Error Types Module
//!
//! This module defines the error types surfaced by the recommendation engine
//! and by the validated constructors of the domain types.

use std::fmt;

/// Errors returned by `RecommendationEngine::recommend`
#[derive(Debug)]
pub enum RecommendationError {
    /// The ingredient holdings could not be read
    IngredientSupply(anyhow::Error),
    /// The recipe catalog could not be read
    RecipeSupply(anyhow::Error),
    /// A recipe that violates the recipe invariants was presented
    ///
    /// Stores raise this while rebuilding their catalog, so `recommend`
    /// reports it as the cause inside `RecipeSupply`.
    InvalidRecipe(RecipeError),
}

impl fmt::Display for RecommendationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecommendationError::IngredientSupply(err) => {
                write!(f, "Ingredient supply error: {err:#}")
            }
            RecommendationError::RecipeSupply(err) => write!(f, "Recipe supply error: {err:#}"),
            RecommendationError::InvalidRecipe(err) => write!(f, "Invalid recipe: {err}"),
        }
    }
}

impl std::error::Error for RecommendationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RecommendationError::IngredientSupply(err) | RecommendationError::RecipeSupply(err) => {
                Some(err.as_ref())
            }
            RecommendationError::InvalidRecipe(err) => Some(err),
        }
    }
}

impl From<RecipeError> for RecommendationError {
    fn from(err: RecipeError) -> Self {
        RecommendationError::InvalidRecipe(err)
    }
}

/// Field-level violations found while building an `IngredientRecord`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    violations: Vec<String>,
}

impl ValidationError {
    pub(crate) fn new(violations: Vec<String>) -> Self {
        Self { violations }
    }

    /// Every violation, in field order
    pub fn violations(&self) -> &[String] {
        &self.violations
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.violations.join("; "))
    }
}

impl std::error::Error for ValidationError {}

/// Reasons a `Recipe` cannot be constructed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecipeError {
    /// The name is empty or whitespace only
    EmptyName,
    /// The name exceeds the storage limit
    NameTooLong(usize),
    /// The recipe lists no ingredients
    NoRequirements,
    /// One of the listed ingredients is itself invalid
    InvalidRequirement { position: usize, error: ValidationError },
}

impl fmt::Display for RecipeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecipeError::EmptyName => write!(f, "recipe name cannot be empty"),
            RecipeError::NameTooLong(len) => {
                write!(f, "recipe name is {len} characters long, the limit is 255")
            }
            RecipeError::NoRequirements => write!(f, "recipe must have at least one ingredient"),
            RecipeError::InvalidRequirement { position, error } => {
                write!(f, "ingredient #{} is invalid: {error}", position + 1)
            }
        }
    }
}

impl std::error::Error for RecipeError {}
