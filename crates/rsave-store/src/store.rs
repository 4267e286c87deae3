//! The storage seam used by the API and the worker.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use rsave_models::{Ingredient, Instruction, Recipe, RecipeId, RecipeUpdate};

use crate::error::StoreResult;

/// Persistence operations on recipe records.
///
/// Mutating operations return `false` when the target row no longer
/// exists. Callers treat that as a successful no-op so a deleted
/// recipe is never written back into existence by an in-flight job.
#[async_trait]
pub trait RecipeStore: Send + Sync {
    /// Insert a freshly submitted recipe row.
    async fn insert_recipe(&self, recipe: &Recipe) -> StoreResult<()>;

    /// Fetch a recipe by id.
    async fn get_recipe(&self, id: RecipeId) -> StoreResult<Option<Recipe>>;

    /// Fetch a recipe by id, scoped to its owner.
    async fn get_recipe_for_user(
        &self,
        id: RecipeId,
        user_id: &str,
    ) -> StoreResult<Option<Recipe>>;

    /// Apply a partial update. Returns `false` if the row is gone.
    async fn update_recipe(&self, id: RecipeId, update: RecipeUpdate) -> StoreResult<bool>;

    /// Mark a recipe failed with `reason`, but only while it is still
    /// non-terminal. Returns `false` when the row is gone or already
    /// reached `completed`/`failed`, so a late failure write can never
    /// regress a terminal status.
    async fn fail_if_not_terminal(&self, id: RecipeId, reason: &str) -> StoreResult<bool>;

    /// Atomically mark a recipe completed and replace its ingredient
    /// and instruction rows. Returns `false` if the row is gone.
    async fn complete_recipe(
        &self,
        id: RecipeId,
        update: RecipeUpdate,
        ingredients: Vec<Ingredient>,
        instructions: Vec<Instruction>,
    ) -> StoreResult<bool>;

    /// Ingredient rows for a recipe, ordered by `order_index`.
    async fn ingredients(&self, id: RecipeId) -> StoreResult<Vec<Ingredient>>;

    /// Instruction rows for a recipe, ordered by `step_number`.
    async fn instructions(&self, id: RecipeId) -> StoreResult<Vec<Instruction>>;

    /// Non-terminal recipes whose last update is older than `cutoff`.
    async fn list_stale(&self, cutoff: DateTime<Utc>) -> StoreResult<Vec<Recipe>>;
}
