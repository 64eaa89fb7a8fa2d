//! # Pantry
//!
//! Tracks an inventory of food ingredients and a catalog of recipes, and
//! recommends the recipes that can best be cooked with what is on hand.
//!
//! The core is pure: [`aggregator`] folds raw holdings into one record per
//! ingredient name and [`scorer`] ranks recipes by the share of their
//! ingredients that are available. [`engine`] wires them to the storage
//! collaborators in [`db`] and [`in_memory`]; [`api`] exposes everything
//! over HTTP.

pub mod aggregator;
pub mod api;
pub mod config;
pub mod db;
pub mod engine;
pub mod errors;
pub mod in_memory;
pub mod ingredient;
pub mod recipe;
pub mod scorer;

pub use engine::{RecommendationEngine, recommend_from};
pub use errors::RecommendationError;
pub use scorer::Recommendation;
