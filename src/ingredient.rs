//! # Ingredient Data Model
//!
//! This module defines the ingredient record shared by the inventory and the
//! recipe catalog. A record in the inventory is a *holding*; the same shape
//! inside a recipe is a *requirement*.
//!
//! ## Usage
//!
//! ```rust
//! use pantry::ingredient::IngredientRecord;
//!
//! let onion = IngredientRecord::new("onion", "unit", 2).unwrap();
//! assert_eq!(onion.name, "onion");
//!
//! // Every violation is reported at once
//! let err = IngredientRecord::new(" ", "", -1).unwrap_err();
//! assert_eq!(err.violations().len(), 3);
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::ValidationError;

/// An ingredient name, its measure type and an integer quantity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngredientRecord {
    /// Ingredient name, the aggregation identity (e.g., "onion", "rice")
    pub name: String,

    /// Kind of unit the quantity is expressed in (e.g., "unit", "mg")
    #[serde(rename = "measureType")]
    pub measure_type: String,

    /// Non-negative amount held or required
    pub quantity: i64,
}

/// A requirement listed by a recipe. Only the name takes part in scoring.
pub type RecipeIngredientRequirement = IngredientRecord;

/// A single stored holding, before aggregation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IngredientEntry {
    pub id: i64,
    #[serde(flatten)]
    pub record: IngredientRecord,
    #[serde(rename = "addedAt")]
    pub added_at: DateTime<Utc>,
}

impl IngredientRecord {
    /// Build a validated record, trimming the name and measure type
    pub fn new(name: &str, measure_type: &str, quantity: i64) -> Result<Self, ValidationError> {
        let record = Self {
            name: name.trim().to_string(),
            measure_type: measure_type.trim().to_string(),
            quantity,
        };
        record.validate()?;
        Ok(record)
    }

    /// Check the record invariants, collecting every violation
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut violations = Vec::new();
        if self.name.trim().is_empty() {
            violations.push("name must be a non-empty string".to_string());
        }
        if self.measure_type.trim().is_empty() {
            violations.push("measureType must be a non-empty string".to_string());
        }
        if self.quantity < 0 {
            violations.push(format!("quantity must not be negative, got {}", self.quantity));
        }

        if violations.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::new(violations))
        }
    }

    /// Return a trimmed copy, validated
    pub(crate) fn normalized(&self) -> Result<Self, ValidationError> {
        Self::new(&self.name, &self.measure_type, self.quantity)
    }
}

impl fmt::Display for IngredientRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.quantity, self.measure_type, self.name)
    }
}
