//! Application state.

use std::sync::Arc;

use rsave_queue::{JobQueue, RedisJobQueue};
use rsave_store::{RecipeStore, SqliteRecipeStore};

use crate::config::ApiConfig;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub store: Arc<dyn RecipeStore>,
    pub queue: Arc<dyn JobQueue>,
}

impl AppState {
    /// Create production state backed by SQLite and Redis.
    pub async fn new(config: ApiConfig) -> Result<Self, Box<dyn std::error::Error>> {
        let store = SqliteRecipeStore::connect(&config.database_url).await?;
        let queue = RedisJobQueue::new(&config.redis_url)?;

        Ok(Self {
            config,
            store: Arc::new(store),
            queue: Arc::new(queue),
        })
    }

    /// Assemble state from already-built backends, used by tests.
    pub fn with_backends(
        config: ApiConfig,
        store: Arc<dyn RecipeStore>,
        queue: Arc<dyn JobQueue>,
    ) -> Self {
        Self {
            config,
            store,
            queue,
        }
    }
}
