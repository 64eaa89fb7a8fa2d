//! # Recipe Data Model
//!
//! A recipe is a unique name plus an ordered, non-empty list of ingredient
//! requirements. The invariants are enforced on every construction path,
//! including deserialization, so an invalid recipe never reaches the scorer.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::errors::RecipeError;
use crate::ingredient::RecipeIngredientRequirement;

/// Longest recipe name accepted, in characters
pub const MAX_RECIPE_NAME_LENGTH: usize = 255;

/// A validated recipe
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RecipeDraft")]
pub struct Recipe {
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<i64>,
    name: String,
    #[serde(rename = "ingredients")]
    requirements: Vec<RecipeIngredientRequirement>,
}

/// Unvalidated wire shape of a recipe
#[derive(Debug, Deserialize)]
struct RecipeDraft {
    #[serde(default)]
    id: Option<i64>,
    name: String,
    #[serde(default)]
    ingredients: Vec<RecipeIngredientRequirement>,
}

impl TryFrom<RecipeDraft> for Recipe {
    type Error = RecipeError;

    fn try_from(draft: RecipeDraft) -> Result<Self, Self::Error> {
        let recipe = Recipe::new(&draft.name, draft.ingredients)?;
        Ok(match draft.id {
            Some(id) => recipe.with_id(id),
            None => recipe,
        })
    }
}

impl Recipe {
    /// Build a recipe, validating the name and every requirement
    ///
    /// Requirements are trimmed; when two share a name only the first is
    /// kept, matching the `(recipe_id, name)` key used by the database.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use pantry::ingredient::IngredientRecord;
    /// use pantry::recipe::Recipe;
    ///
    /// let fries = Recipe::new(
    ///     "Fries",
    ///     vec![IngredientRecord::new("Potato", "unit", 2).unwrap()],
    /// )
    /// .unwrap();
    /// assert_eq!(fries.requirements().len(), 1);
    ///
    /// assert!(Recipe::new("Nothing", Vec::new()).is_err());
    /// ```
    pub fn new(
        name: &str,
        requirements: Vec<RecipeIngredientRequirement>,
    ) -> Result<Self, RecipeError> {
        let name = validate_recipe_name(name)?;
        if requirements.is_empty() {
            return Err(RecipeError::NoRequirements);
        }

        let mut seen = HashSet::new();
        let mut normalized = Vec::with_capacity(requirements.len());
        for (position, requirement) in requirements.iter().enumerate() {
            let requirement = requirement
                .normalized()
                .map_err(|error| RecipeError::InvalidRequirement { position, error })?;
            if seen.insert(requirement.name.clone()) {
                normalized.push(requirement);
            }
        }

        Ok(Self {
            id: None,
            name,
            requirements: normalized,
        })
    }

    /// Attach the storage identifier
    pub fn with_id(mut self, id: i64) -> Self {
        self.id = Some(id);
        self
    }

    pub fn id(&self) -> Option<i64> {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Requirements in the order they were listed; never empty
    pub fn requirements(&self) -> &[RecipeIngredientRequirement] {
        &self.requirements
    }
}

/// Validates a recipe name input, returning it trimmed
pub fn validate_recipe_name(name: &str) -> Result<String, RecipeError> {
    let trimmed = name.trim();

    if trimmed.is_empty() {
        return Err(RecipeError::EmptyName);
    }

    let length = trimmed.chars().count();
    if length > MAX_RECIPE_NAME_LENGTH {
        return Err(RecipeError::NameTooLong(length));
    }

    Ok(trimmed.to_string())
}
