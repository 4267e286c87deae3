//! The job payload exchanged between API and worker.
//!
//! The wire shape is part of the enqueue contract: a flat JSON object
//! `{recipe_id, url, user_id, created_at}`. The worker re-reads the
//! recipe row before doing any work, so the payload carries identity
//! and the URL, nothing derived.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use rsave_models::RecipeId;

/// An enqueued extraction job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionJob {
    pub recipe_id: RecipeId,
    pub url: String,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
}

impl ExtractionJob {
    pub fn new(recipe_id: RecipeId, url: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            recipe_id,
            url: url.into(),
            user_id: user_id.into(),
            created_at: Utc::now(),
        }
    }
}
