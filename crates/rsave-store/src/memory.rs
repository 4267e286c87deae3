//! In-memory recipe store for tests and local development.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use rsave_models::{Ingredient, Instruction, Recipe, RecipeId, RecipeUpdate};

use crate::error::StoreResult;
use crate::store::RecipeStore;

#[derive(Default)]
struct Inner {
    recipes: HashMap<RecipeId, Recipe>,
    ingredients: HashMap<RecipeId, Vec<Ingredient>>,
    instructions: HashMap<RecipeId, Vec<Instruction>>,
}

/// HashMap-backed store with the same conditional-update semantics as
/// the SQLite backend.
#[derive(Clone, Default)]
pub struct MemoryRecipeStore {
    inner: Arc<RwLock<Inner>>,
}

impl MemoryRecipeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove a recipe outright, simulating a user deletion while a
    /// job is in flight.
    pub async fn delete_recipe(&self, id: RecipeId) -> bool {
        let mut inner = self.inner.write().await;
        inner.ingredients.remove(&id);
        inner.instructions.remove(&id);
        inner.recipes.remove(&id).is_some()
    }

    fn apply_update(recipe: &mut Recipe, update: RecipeUpdate) {
        if let Some(status) = update.status {
            recipe.status = status;
        }
        if let Some(title) = update.title {
            recipe.title = title;
        }
        if update.description.is_some() {
            recipe.description = update.description;
        }
        if update.thumbnail_url.is_some() {
            recipe.thumbnail_url = update.thumbnail_url;
        }
        if update.video_url.is_some() {
            recipe.video_url = update.video_url;
        }
        if update.prep_time_minutes.is_some() {
            recipe.prep_time_minutes = update.prep_time_minutes;
        }
        if update.cook_time_minutes.is_some() {
            recipe.cook_time_minutes = update.cook_time_minutes;
        }
        if update.servings.is_some() {
            recipe.servings = update.servings;
        }
        if update.cuisine.is_some() {
            recipe.cuisine = update.cuisine;
        }
        if update.error_message.is_some() {
            recipe.error_message = update.error_message;
        }
        recipe.updated_at = Utc::now();
    }
}

#[async_trait]
impl RecipeStore for MemoryRecipeStore {
    async fn insert_recipe(&self, recipe: &Recipe) -> StoreResult<()> {
        let mut inner = self.inner.write().await;
        inner.recipes.insert(recipe.id, recipe.clone());
        Ok(())
    }

    async fn get_recipe(&self, id: RecipeId) -> StoreResult<Option<Recipe>> {
        let inner = self.inner.read().await;
        Ok(inner.recipes.get(&id).cloned())
    }

    async fn get_recipe_for_user(
        &self,
        id: RecipeId,
        user_id: &str,
    ) -> StoreResult<Option<Recipe>> {
        let inner = self.inner.read().await;
        Ok(inner
            .recipes
            .get(&id)
            .filter(|r| r.user_id == user_id)
            .cloned())
    }

    async fn update_recipe(&self, id: RecipeId, update: RecipeUpdate) -> StoreResult<bool> {
        let mut inner = self.inner.write().await;
        match inner.recipes.get_mut(&id) {
            Some(recipe) => {
                Self::apply_update(recipe, update);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn fail_if_not_terminal(&self, id: RecipeId, reason: &str) -> StoreResult<bool> {
        let mut inner = self.inner.write().await;
        match inner.recipes.get_mut(&id) {
            Some(recipe) if !recipe.status.is_terminal() => {
                Self::apply_update(recipe, RecipeUpdate::failed(reason));
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn complete_recipe(
        &self,
        id: RecipeId,
        update: RecipeUpdate,
        ingredients: Vec<Ingredient>,
        instructions: Vec<Instruction>,
    ) -> StoreResult<bool> {
        let mut inner = self.inner.write().await;
        if !inner.recipes.contains_key(&id) {
            return Ok(false);
        }
        if let Some(recipe) = inner.recipes.get_mut(&id) {
            Self::apply_update(recipe, update);
        }
        inner.ingredients.insert(id, ingredients);
        inner.instructions.insert(id, instructions);
        Ok(true)
    }

    async fn ingredients(&self, id: RecipeId) -> StoreResult<Vec<Ingredient>> {
        let inner = self.inner.read().await;
        Ok(inner.ingredients.get(&id).cloned().unwrap_or_default())
    }

    async fn instructions(&self, id: RecipeId) -> StoreResult<Vec<Instruction>> {
        let inner = self.inner.read().await;
        Ok(inner.instructions.get(&id).cloned().unwrap_or_default())
    }

    async fn list_stale(&self, cutoff: DateTime<Utc>) -> StoreResult<Vec<Recipe>> {
        let inner = self.inner.read().await;
        let mut stale: Vec<Recipe> = inner
            .recipes
            .values()
            .filter(|r| !r.status.is_terminal() && r.updated_at < cutoff)
            .cloned()
            .collect();
        stale.sort_by_key(|r| r.updated_at);
        Ok(stale)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rsave_models::{Platform, RecipeStatus};

    #[tokio::test]
    async fn update_after_delete_is_noop() {
        let store = MemoryRecipeStore::new();
        let recipe = Recipe::new("user-1", "https://youtu.be/abc", Platform::Youtube);
        store.insert_recipe(&recipe).await.unwrap();

        assert!(store.delete_recipe(recipe.id).await);

        let applied = store
            .update_recipe(recipe.id, RecipeUpdate::status(RecipeStatus::Downloading))
            .await
            .unwrap();
        assert!(!applied);
        assert!(store.get_recipe(recipe.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn fail_if_not_terminal_leaves_completed_rows() {
        let store = MemoryRecipeStore::new();
        let mut recipe = Recipe::new("user-1", "https://youtu.be/abc", Platform::Youtube);
        recipe.status = RecipeStatus::Completed;
        store.insert_recipe(&recipe).await.unwrap();

        let applied = store
            .fail_if_not_terminal(recipe.id, "timed out")
            .await
            .unwrap();
        assert!(!applied);

        let fetched = store.get_recipe(recipe.id).await.unwrap().unwrap();
        assert_eq!(fetched.status, RecipeStatus::Completed);
        assert!(fetched.error_message.is_none());
    }

    #[tokio::test]
    async fn failed_update_sets_reason() {
        let store = MemoryRecipeStore::new();
        let recipe = Recipe::new("user-1", "https://youtu.be/abc", Platform::Youtube);
        store.insert_recipe(&recipe).await.unwrap();

        store
            .update_recipe(recipe.id, RecipeUpdate::failed("no recipe detected"))
            .await
            .unwrap();

        let fetched = store.get_recipe(recipe.id).await.unwrap().unwrap();
        assert_eq!(fetched.status, RecipeStatus::Failed);
        assert_eq!(fetched.error_message.as_deref(), Some("no recipe detected"));
    }
}
