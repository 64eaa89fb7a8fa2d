//! HTTP adapter over the stores and the recommendation engine.
//!
//! Routes:
//! - `GET /health`
//! - `POST /ingredient`, `GET /ingredient`, `GET /ingredient/entries`
//! - `PATCH /ingredient/{id}`, `DELETE /ingredient/{id}`
//! - `POST /recipe`, `GET /recipe`, `DELETE /recipe/{id}`
//! - `GET /recommendation`
//!
//! Every error body is `{"message": "..."}`.

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, patch},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::{error, info};

use crate::engine::{
    DuplicateRecipe, IngredientStore, RecipeStore, RecipeSupply, RecommendationEngine,
};
use crate::errors::{RecommendationError, ValidationError};
use crate::in_memory::{InMemoryIngredientStore, InMemoryRecipeStore};
use crate::ingredient::{IngredientEntry, IngredientRecord};
use crate::recipe::Recipe;
use crate::scorer::Recommendation;

type SharedIngredients = Arc<dyn IngredientStore>;
type SharedRecipes = Arc<dyn RecipeStore>;

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    ingredients: SharedIngredients,
    recipes: SharedRecipes,
    engine: Arc<RecommendationEngine<SharedIngredients, SharedRecipes>>,
}

impl AppState {
    pub fn new(ingredients: SharedIngredients, recipes: SharedRecipes) -> Self {
        let engine = RecommendationEngine::new(Arc::clone(&ingredients), Arc::clone(&recipes));
        Self {
            ingredients,
            recipes,
            engine: Arc::new(engine),
        }
    }

    /// State backed by empty in-memory stores
    pub fn in_memory() -> Self {
        Self::new(
            Arc::new(InMemoryIngredientStore::new()),
            Arc::new(InMemoryRecipeStore::new()),
        )
    }
}

/// Build the application router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/ingredient", get(list_ingredients).post(add_ingredient))
        .route("/ingredient/entries", get(list_ingredient_entries))
        .route(
            "/ingredient/{id}",
            patch(update_ingredient).delete(delete_ingredient),
        )
        .route("/recipe", get(list_recipes).post(add_recipe))
        .route("/recipe/{id}", delete(delete_recipe))
        .route("/recommendation", get(recommend))
        .with_state(state)
}

/// Errors returned by the handlers
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    NotFound(String),
    Conflict(String),
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };
        (status, Json(json!({ "message": message }))).into_response()
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        if let Some(duplicate) = err.downcast_ref::<DuplicateRecipe>() {
            return ApiError::Conflict(duplicate.to_string());
        }
        if let Some(invalid) = err.downcast_ref::<ValidationError>() {
            return ApiError::BadRequest(invalid.to_string());
        }
        error!(error = %format!("{err:#}"), "Store operation failed");
        ApiError::Internal("internal server error".to_string())
    }
}

impl From<RecommendationError> for ApiError {
    fn from(err: RecommendationError) -> Self {
        error!(error = %err, "Recommendation failed");
        let message = match &err {
            RecommendationError::IngredientSupply(_) => "failed to retrieve ingredients",
            RecommendationError::RecipeSupply(cause) if holds_invalid_recipe(cause) => {
                "recipe catalog contains an invalid recipe"
            }
            RecommendationError::RecipeSupply(_) => "failed to retrieve recipes",
            RecommendationError::InvalidRecipe(_) => "recipe catalog contains an invalid recipe",
        };
        ApiError::Internal(message.to_string())
    }
}

fn holds_invalid_recipe(cause: &anyhow::Error) -> bool {
    cause.chain().any(|e| {
        matches!(
            e.downcast_ref::<RecommendationError>(),
            Some(RecommendationError::InvalidRecipe(_))
        )
    })
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(format!("invalid request body: {}", rejection.body_text()))
    }
}

impl From<PathRejection> for ApiError {
    fn from(_: PathRejection) -> Self {
        ApiError::BadRequest("invalid id parameter".to_string())
    }
}

#[derive(Debug, Deserialize)]
struct IngredientInput {
    name: String,
    #[serde(rename = "measureType")]
    measure_type: String,
    quantity: i64,
}

impl IngredientInput {
    fn into_record(self) -> Result<IngredientRecord, ApiError> {
        IngredientRecord::new(&self.name, &self.measure_type, self.quantity)
            .map_err(|e| ApiError::BadRequest(e.to_string()))
    }
}

#[derive(Debug, Deserialize)]
struct RecipeInput {
    name: String,
    #[serde(default)]
    ingredients: Vec<IngredientRecord>,
}

async fn add_ingredient(
    State(state): State<AppState>,
    body: Result<Json<IngredientInput>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(input) = body?;
    let record = input.into_record()?;
    let id = state.ingredients.add_ingredient(record).await?;
    Ok((StatusCode::CREATED, Json(json!({ "id": id }))))
}

async fn list_ingredients(
    State(state): State<AppState>,
) -> Result<Json<Vec<IngredientRecord>>, ApiError> {
    Ok(Json(state.ingredients.find_ingredients().await?))
}

async fn list_ingredient_entries(
    State(state): State<AppState>,
) -> Result<Json<Vec<IngredientEntry>>, ApiError> {
    Ok(Json(state.ingredients.list_entries().await?))
}

async fn update_ingredient(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
    body: Result<Json<IngredientInput>, JsonRejection>,
) -> Result<StatusCode, ApiError> {
    let Path(id) = id?;
    let Json(input) = body?;
    let record = input.into_record()?;
    if state.ingredients.update_ingredient(id, record).await? {
        Ok(StatusCode::OK)
    } else {
        Err(ApiError::NotFound(format!("no ingredient with id {id}")))
    }
}

async fn delete_ingredient(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<StatusCode, ApiError> {
    let Path(id) = id?;
    if state.ingredients.delete_ingredient(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound(format!("no ingredient with id {id}")))
    }
}

async fn add_recipe(
    State(state): State<AppState>,
    body: Result<Json<RecipeInput>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(input) = body?;
    let recipe = Recipe::new(&input.name, input.ingredients)
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;
    let id = state.recipes.add_recipe(recipe).await?;
    info!(recipe_id = id, "Recipe created");
    Ok((StatusCode::CREATED, Json(json!({ "id": id }))))
}

async fn list_recipes(State(state): State<AppState>) -> Result<Json<Vec<Recipe>>, ApiError> {
    Ok(Json(state.recipes.supply_recipes().await?))
}

async fn delete_recipe(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<StatusCode, ApiError> {
    let Path(id) = id?;
    if state.recipes.delete_recipe(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound(format!("no recipe with id {id}")))
    }
}

async fn recommend(State(state): State<AppState>) -> Result<Json<Vec<Recommendation>>, ApiError> {
    Ok(Json(state.engine.recommend().await?))
}
