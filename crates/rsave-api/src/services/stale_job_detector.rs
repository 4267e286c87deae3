//! Background service for failing recipes abandoned by a crashed worker.
//!
//! The orchestrator persists a status update before every stage, so a
//! recipe whose row has not been touched for longer than the stale
//! threshold has no live worker behind it. The reaper moves such rows
//! to `failed` so clients stop polling a job that will never finish.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::time::interval;
use tracing::{error, info, warn};

use rsave_store::RecipeStore;

use crate::config::ApiConfig;

/// Reason recorded on recipes the reaper fails.
const STALE_REASON: &str = "timed out";

/// Stale job detector service.
pub struct StaleJobDetector {
    store: Arc<dyn RecipeStore>,
    stale_after: Duration,
    sweep_interval: Duration,
    enabled: bool,
}

impl StaleJobDetector {
    pub fn new(store: Arc<dyn RecipeStore>, config: &ApiConfig) -> Self {
        Self {
            store,
            stale_after: config.stale_after,
            sweep_interval: config.reaper_interval,
            enabled: config.stale_detection_enabled,
        }
    }

    /// Start the background detection loop.
    ///
    /// Runs indefinitely and should be spawned as a background task.
    pub async fn run(&self) {
        if !self.enabled {
            info!("Stale job detection is disabled");
            return;
        }

        info!(
            interval_secs = self.sweep_interval.as_secs(),
            stale_after_secs = self.stale_after.as_secs(),
            "Starting stale job detector"
        );

        let mut ticker = interval(self.sweep_interval);

        loop {
            ticker.tick().await;

            if let Err(e) = self.check_once().await {
                error!("Stale job detection error: {}", e);
            }
        }
    }

    /// Run a single sweep. Returns how many recipes were failed.
    pub async fn check_once(&self) -> anyhow::Result<u32> {
        let cutoff = Utc::now()
            - chrono::Duration::from_std(self.stale_after).unwrap_or(chrono::Duration::zero());
        let stale = self.store.list_stale(cutoff).await?;

        if stale.is_empty() {
            return Ok(0);
        }

        let mut reaped = 0u32;
        for recipe in stale {
            warn!(
                recipe_id = %recipe.id,
                status = %recipe.status,
                updated_at = %recipe.updated_at,
                "Detected stale recipe, marking failed"
            );

            // The write is guarded on the row still being non-terminal:
            // a worker can finish the recipe between the listing and
            // this write, and a terminal status must never regress.
            match self
                .store
                .fail_if_not_terminal(recipe.id, STALE_REASON)
                .await
            {
                Ok(true) => reaped += 1,
                Ok(false) => {
                    info!(recipe_id = %recipe.id, "Recipe finished or vanished before reaping, skipped");
                }
                Err(e) => {
                    error!(recipe_id = %recipe.id, "Failed to reap stale recipe: {}", e);
                }
            }
        }

        if reaped > 0 {
            info!(reaped, "Stale recipe sweep complete");
        }

        Ok(reaped)
    }
}
