//! # Database Module
//!
//! PostgreSQL storage for ingredient holdings and the recipe catalog.
//!
//! Holdings are kept one row per addition in `ingredients_storage`; the
//! aggregated view groups them by name, the same identity the in-memory
//! aggregator uses. Recipes live in `recipes`, their requirements in
//! `recipes_ingredients` keyed by `(recipe_id, name)` and ordered by
//! `position`.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rand::Rng;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::DatabaseConfig;
use crate::engine::{DuplicateRecipe, IngredientStore, IngredientSupply, RecipeStore, RecipeSupply};
use crate::errors::RecommendationError;
use crate::ingredient::{IngredientEntry, IngredientRecord};
use crate::recipe::Recipe;

/// Connect to PostgreSQL, retrying with capped exponential backoff and jitter
pub async fn connect_with_retry(config: &DatabaseConfig) -> Result<PgPool> {
    let mut attempt = 0;
    loop {
        let result = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect(&config.url)
            .await;

        match result {
            Ok(pool) => {
                info!(attempt = attempt + 1, "Connected to database");
                return Ok(pool);
            }
            Err(e) if attempt < config.retry.max_retries => {
                let base = config.retry.delay_for_attempt(attempt);
                let jitter_ms = rand::thread_rng().gen_range(0..=base.as_millis() as u64 / 4);
                let delay = base + Duration::from_millis(jitter_ms);
                warn!(
                    attempt = attempt + 1,
                    max_retries = config.retry.max_retries,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "Database connection failed, retrying"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => {
                return Err(e).with_context(|| {
                    format!("Failed to connect to database after {} attempts", attempt + 1)
                });
            }
        }
    }
}

/// Initialize the database schema
pub async fn init_database_schema(pool: &PgPool) -> Result<()> {
    info!("Initializing database schema...");

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS ingredients_storage (
            id BIGSERIAL PRIMARY KEY,
            name TEXT NOT NULL,
            measure_type TEXT NOT NULL,
            quantity BIGINT NOT NULL CHECK (quantity >= 0),
            added_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )",
    )
    .execute(pool)
    .await
    .context("Failed to create ingredients_storage table")?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS recipes (
            id BIGSERIAL PRIMARY KEY,
            name TEXT NOT NULL UNIQUE
        )",
    )
    .execute(pool)
    .await
    .context("Failed to create recipes table")?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS recipes_ingredients (
            recipe_id BIGINT NOT NULL REFERENCES recipes(id) ON DELETE CASCADE,
            position INT NOT NULL,
            name TEXT NOT NULL,
            measure_type TEXT NOT NULL,
            quantity BIGINT NOT NULL,
            PRIMARY KEY (recipe_id, name)
        )",
    )
    .execute(pool)
    .await
    .context("Failed to create recipes_ingredients table")?;

    info!("Database schema initialized successfully");
    Ok(())
}

/// Store one ingredient holding
pub async fn add_ingredient(pool: &PgPool, record: &IngredientRecord) -> Result<i64> {
    record.validate()?;
    debug!(name = %record.name, quantity = record.quantity, "Adding ingredient");

    let id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO ingredients_storage (name, measure_type, quantity) VALUES ($1, $2, $3) RETURNING id",
    )
    .bind(&record.name)
    .bind(&record.measure_type)
    .bind(record.quantity)
    .fetch_one(pool)
    .await
    .context("Failed to add ingredient")?;

    info!(ingredient_id = id, "Ingredient stored");
    Ok(id)
}

/// Every holding, one record per stored row, oldest first
pub async fn find_raw_ingredients(pool: &PgPool) -> Result<Vec<IngredientRecord>> {
    let rows = sqlx::query_as::<_, (String, String, i64)>(
        "SELECT name, measure_type, quantity FROM ingredients_storage ORDER BY id",
    )
    .fetch_all(pool)
    .await
    .context("Failed to query ingredients")?;

    Ok(rows
        .into_iter()
        .map(|(name, measure_type, quantity)| IngredientRecord {
            name,
            measure_type,
            quantity,
        })
        .collect())
}

/// Holdings summed by name; the measure type of the oldest row is kept
pub async fn find_aggregated_ingredients(pool: &PgPool) -> Result<Vec<IngredientRecord>> {
    let rows = sqlx::query_as::<_, (String, String, i64)>(
        "SELECT name,
                (ARRAY_AGG(measure_type ORDER BY id))[1] AS measure_type,
                SUM(quantity)::BIGINT AS quantity
         FROM ingredients_storage
         GROUP BY name
         ORDER BY name COLLATE \"C\"",
    )
    .fetch_all(pool)
    .await
    .context("Failed to aggregate ingredients")?;

    Ok(rows
        .into_iter()
        .map(|(name, measure_type, quantity)| IngredientRecord {
            name,
            measure_type,
            quantity,
        })
        .collect())
}

/// Every holding with its id and insertion time
pub async fn list_ingredient_entries(pool: &PgPool) -> Result<Vec<IngredientEntry>> {
    let rows = sqlx::query_as::<_, (i64, String, String, i64, DateTime<Utc>)>(
        "SELECT id, name, measure_type, quantity, added_at FROM ingredients_storage ORDER BY id",
    )
    .fetch_all(pool)
    .await
    .context("Failed to list ingredient entries")?;

    Ok(rows
        .into_iter()
        .map(|(id, name, measure_type, quantity, added_at)| IngredientEntry {
            id,
            record: IngredientRecord {
                name,
                measure_type,
                quantity,
            },
            added_at,
        })
        .collect())
}

/// Replace a holding
pub async fn update_ingredient(pool: &PgPool, id: i64, record: &IngredientRecord) -> Result<bool> {
    record.validate()?;
    info!(ingredient_id = id, "Updating ingredient");

    let rows_affected = sqlx::query(
        "UPDATE ingredients_storage SET name = $1, measure_type = $2, quantity = $3 WHERE id = $4",
    )
    .bind(&record.name)
    .bind(&record.measure_type)
    .bind(record.quantity)
    .bind(id)
    .execute(pool)
    .await
    .context("Failed to update ingredient")?
    .rows_affected();

    if rows_affected == 0 {
        info!(ingredient_id = id, "No ingredient found");
    }
    Ok(rows_affected > 0)
}

/// Remove a holding
pub async fn delete_ingredient(pool: &PgPool, id: i64) -> Result<bool> {
    info!(ingredient_id = id, "Deleting ingredient");

    let rows_affected = sqlx::query("DELETE FROM ingredients_storage WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete ingredient")?
        .rows_affected();

    Ok(rows_affected > 0)
}

/// Store a recipe and its requirements in one transaction
pub async fn add_recipe(pool: &PgPool, recipe: &Recipe) -> Result<i64> {
    info!(recipe = %recipe.name(), "Adding recipe");

    let mut tx = pool.begin().await.context("Failed to begin transaction")?;

    let inserted = sqlx::query_scalar::<_, i64>("INSERT INTO recipes (name) VALUES ($1) RETURNING id")
        .bind(recipe.name())
        .fetch_one(&mut *tx)
        .await;

    let recipe_id = match inserted {
        Ok(id) => id,
        Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
            return Err(DuplicateRecipe(recipe.name().to_string()).into());
        }
        Err(e) => return Err(e).context("Failed to insert recipe"),
    };

    for (position, requirement) in recipe.requirements().iter().enumerate() {
        sqlx::query(
            "INSERT INTO recipes_ingredients (recipe_id, position, name, measure_type, quantity)
             VALUES ($1, $2, $3, $4, $5)
             ON CONFLICT (recipe_id, name) DO NOTHING",
        )
        .bind(recipe_id)
        .bind(position as i32)
        .bind(&requirement.name)
        .bind(&requirement.measure_type)
        .bind(requirement.quantity)
        .execute(&mut *tx)
        .await
        .context("Failed to insert a recipe ingredient")?;
    }

    tx.commit().await.context("Failed to commit recipe")?;

    info!(recipe_id, "Recipe stored");
    Ok(recipe_id)
}

/// The full recipe catalog, ordered by id, requirements in listed order
///
/// A recipe row that cannot be rebuilt into a valid `Recipe`, including
/// one with no requirement rows, fails the whole read.
pub async fn get_all_recipes(pool: &PgPool) -> Result<Vec<Recipe>> {
    let rows = sqlx::query_as::<_, (i64, String, Option<String>, Option<String>, Option<i64>)>(
        "SELECT r.id, r.name, i.name, i.measure_type, i.quantity
         FROM recipes r
         LEFT JOIN recipes_ingredients i ON r.id = i.recipe_id
         ORDER BY r.id, i.position",
    )
    .fetch_all(pool)
    .await
    .context("Failed to query recipes")?;

    let mut recipes = Vec::new();
    let mut current: Option<(i64, String, Vec<IngredientRecord>)> = None;

    for (recipe_id, recipe_name, name, measure_type, quantity) in rows {
        let requirement = match (name, measure_type, quantity) {
            (Some(name), Some(measure_type), Some(quantity)) => Some(IngredientRecord {
                name,
                measure_type,
                quantity,
            }),
            _ => None,
        };
        match current.as_mut() {
            Some((id, _, requirements)) if *id == recipe_id => requirements.extend(requirement),
            _ => {
                if let Some(done) = current.take() {
                    recipes.push(build_recipe(done)?);
                }
                current = Some((recipe_id, recipe_name, requirement.into_iter().collect()));
            }
        }
    }
    if let Some(done) = current {
        recipes.push(build_recipe(done)?);
    }

    debug!(count = recipes.len(), "Loaded recipe catalog");
    Ok(recipes)
}

fn build_recipe((id, name, requirements): (i64, String, Vec<IngredientRecord>)) -> Result<Recipe> {
    let recipe = Recipe::new(&name, requirements)
        .map_err(RecommendationError::from)
        .with_context(|| format!("Stored recipe {id} is invalid"))?;
    Ok(recipe.with_id(id))
}

/// Remove a recipe; its requirements cascade
pub async fn delete_recipe(pool: &PgPool, id: i64) -> Result<bool> {
    info!(recipe_id = id, "Deleting recipe");

    let rows_affected = sqlx::query("DELETE FROM recipes WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete recipe")?
        .rows_affected();

    Ok(rows_affected > 0)
}

/// PostgreSQL-backed implementation of both stores
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl IngredientSupply for PgStore {
    async fn supply_ingredients(&self) -> Result<Vec<IngredientRecord>> {
        find_raw_ingredients(&self.pool).await
    }
}

#[async_trait]
impl IngredientStore for PgStore {
    async fn add_ingredient(&self, record: IngredientRecord) -> Result<i64> {
        add_ingredient(&self.pool, &record).await
    }

    async fn list_entries(&self) -> Result<Vec<IngredientEntry>> {
        list_ingredient_entries(&self.pool).await
    }

    async fn update_ingredient(&self, id: i64, record: IngredientRecord) -> Result<bool> {
        update_ingredient(&self.pool, id, &record).await
    }

    async fn delete_ingredient(&self, id: i64) -> Result<bool> {
        delete_ingredient(&self.pool, id).await
    }

    async fn find_ingredients(&self) -> Result<Vec<IngredientRecord>> {
        find_aggregated_ingredients(&self.pool).await
    }
}

#[async_trait]
impl RecipeSupply for PgStore {
    async fn supply_recipes(&self) -> Result<Vec<Recipe>> {
        get_all_recipes(&self.pool).await
    }
}

#[async_trait]
impl RecipeStore for PgStore {
    async fn add_recipe(&self, recipe: Recipe) -> Result<i64> {
        add_recipe(&self.pool, &recipe).await
    }

    async fn delete_recipe(&self, id: i64) -> Result<bool> {
        delete_recipe(&self.pool, id).await
    }
}
