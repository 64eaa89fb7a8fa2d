//! # Availability Aggregator
//!
//! Collapses raw ingredient holdings into one record per ingredient name.
//! The identity is the exact name; the measure type of the first record seen
//! for a name is kept and quantities are summed.

use std::collections::HashMap;

use crate::ingredient::IngredientRecord;

/// Canonical set of available ingredients, keyed by name
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Availability {
    by_name: HashMap<String, IngredientRecord>,
}

impl Availability {
    /// Whether an ingredient with this exact name is held
    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&IngredientRecord> {
        self.by_name.get(name)
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }

    /// Aggregated records, sorted by name
    pub fn into_records(self) -> Vec<IngredientRecord> {
        let mut records: Vec<IngredientRecord> = self.by_name.into_values().collect();
        records.sort_by(|a, b| a.name.cmp(&b.name));
        records
    }
}

impl FromIterator<IngredientRecord> for Availability {
    fn from_iter<T: IntoIterator<Item = IngredientRecord>>(iter: T) -> Self {
        let mut by_name: HashMap<String, IngredientRecord> = HashMap::new();
        for record in iter {
            match by_name.get_mut(&record.name) {
                Some(existing) => {
                    existing.quantity = existing.quantity.saturating_add(record.quantity);
                }
                None => {
                    by_name.insert(record.name.clone(), record);
                }
            }
        }
        Self { by_name }
    }
}

/// Sum the quantities of records sharing a name
pub fn aggregate_ingredients(records: &[IngredientRecord]) -> Availability {
    records.iter().cloned().collect()
}
