//! In-memory ingredient and recipe stores.
//!
//! Same contract as the PostgreSQL store in `db`. The binary falls back to
//! these when no `DATABASE_URL` is configured, and the tests use them to
//! drive the engine and the HTTP routes without a database.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::Utc;
use std::sync::RwLock;
use tracing::{debug, warn};

use crate::engine::{DuplicateRecipe, IngredientStore, IngredientSupply, RecipeStore, RecipeSupply};
use crate::ingredient::{IngredientEntry, IngredientRecord};
use crate::recipe::Recipe;

#[derive(Debug)]
struct Table<T> {
    next_id: i64,
    rows: Vec<(i64, T)>,
}

impl<T> Default for Table<T> {
    fn default() -> Self {
        Self {
            next_id: 0,
            rows: Vec::new(),
        }
    }
}

impl<T> Table<T> {
    fn insert(&mut self, row: T) -> i64 {
        self.next_id += 1;
        self.rows.push((self.next_id, row));
        self.next_id
    }

    fn remove(&mut self, id: i64) -> bool {
        let before = self.rows.len();
        self.rows.retain(|(row_id, _)| *row_id != id);
        self.rows.len() != before
    }
}

fn poisoned<E>(_: E) -> anyhow::Error {
    anyhow!("In-memory store lock poisoned")
}

/// Ingredient holdings kept in a vector, in insertion order
#[derive(Debug, Default)]
pub struct InMemoryIngredientStore {
    table: RwLock<Table<IngredientEntry>>,
}

impl InMemoryIngredientStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store pre-filled with holdings
    pub fn with_records(records: impl IntoIterator<Item = IngredientRecord>) -> Self {
        let store = Self::new();
        if let Ok(mut table) = store.table.write() {
            for record in records {
                insert_entry(&mut table, record);
            }
        }
        store
    }
}

fn insert_entry(table: &mut Table<IngredientEntry>, record: IngredientRecord) -> i64 {
    let id = table.next_id + 1;
    table.insert(IngredientEntry {
        id,
        record,
        added_at: Utc::now(),
    })
}

#[async_trait]
impl IngredientSupply for InMemoryIngredientStore {
    async fn supply_ingredients(&self) -> Result<Vec<IngredientRecord>> {
        let table = self.table.read().map_err(poisoned)?;
        Ok(table.rows.iter().map(|(_, entry)| entry.record.clone()).collect())
    }
}

#[async_trait]
impl IngredientStore for InMemoryIngredientStore {
    async fn add_ingredient(&self, record: IngredientRecord) -> Result<i64> {
        record.validate()?;
        let mut table = self.table.write().map_err(poisoned)?;
        let id = insert_entry(&mut table, record);
        debug!(ingredient_id = id, "Stored ingredient in memory");
        Ok(id)
    }

    async fn list_entries(&self) -> Result<Vec<IngredientEntry>> {
        let table = self.table.read().map_err(poisoned)?;
        Ok(table.rows.iter().map(|(_, entry)| entry.clone()).collect())
    }

    async fn update_ingredient(&self, id: i64, record: IngredientRecord) -> Result<bool> {
        record.validate()?;
        let mut table = self.table.write().map_err(poisoned)?;
        match table.rows.iter_mut().find(|(row_id, _)| *row_id == id) {
            Some((_, entry)) => {
                entry.record = record;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_ingredient(&self, id: i64) -> Result<bool> {
        let mut table = self.table.write().map_err(poisoned)?;
        Ok(table.remove(id))
    }
}

/// Recipe catalog kept in a vector, in insertion order
#[derive(Debug, Default)]
pub struct InMemoryRecipeStore {
    table: RwLock<Table<Recipe>>,
}

impl InMemoryRecipeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store pre-filled with recipes; later duplicates are skipped
    pub fn with_recipes(recipes: impl IntoIterator<Item = Recipe>) -> Self {
        let store = Self::new();
        if let Ok(mut table) = store.table.write() {
            for recipe in recipes {
                if let Err(e) = insert_recipe(&mut table, recipe) {
                    warn!(error = %e, "Skipping recipe while seeding in-memory store");
                }
            }
        }
        store
    }
}

fn insert_recipe(table: &mut Table<Recipe>, recipe: Recipe) -> Result<i64> {
    if table.rows.iter().any(|(_, existing)| existing.name() == recipe.name()) {
        return Err(DuplicateRecipe(recipe.name().to_string()).into());
    }
    let id = table.next_id + 1;
    Ok(table.insert(recipe.with_id(id)))
}

#[async_trait]
impl RecipeSupply for InMemoryRecipeStore {
    async fn supply_recipes(&self) -> Result<Vec<Recipe>> {
        let table = self.table.read().map_err(poisoned)?;
        Ok(table.rows.iter().map(|(_, recipe)| recipe.clone()).collect())
    }
}

#[async_trait]
impl RecipeStore for InMemoryRecipeStore {
    async fn add_recipe(&self, recipe: Recipe) -> Result<i64> {
        let mut table = self.table.write().map_err(poisoned)?;
        let id = insert_recipe(&mut table, recipe)?;
        debug!(recipe_id = id, "Stored recipe in memory");
        Ok(id)
    }

    async fn delete_recipe(&self, id: i64) -> Result<bool> {
        let mut table = self.table.write().map_err(poisoned)?;
        Ok(table.remove(id))
    }
}
