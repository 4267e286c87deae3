//! Recipe records and their child rows.

use crate::{Platform, RecipeStatus};
use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a recipe extraction job.
///
/// Doubles as the idempotency key for the pipeline: re-processing a
/// recipe id that already advanced past `pending` is a no-op.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(transparent)]
pub struct RecipeId(pub Uuid);

impl RecipeId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn parse(s: &str) -> Option<Self> {
        Uuid::parse_str(s).ok().map(Self)
    }
}

impl Default for RecipeId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RecipeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A recipe aggregate row.
///
/// Created in `pending` state at submission time with a placeholder
/// title, then mutated only by the pipeline until it reaches a
/// terminal status. Structured content is populated at completion.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Recipe {
    pub id: RecipeId,
    /// Owner of the recipe; updates never cross user boundaries.
    pub user_id: String,
    /// Source URL exactly as submitted.
    pub original_url: String,
    pub platform: Platform,
    pub status: RecipeStatus,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prep_time_minutes: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cook_time_minutes: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub servings: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cuisine: Option<String>,
    pub is_favorite: bool,
    /// Human-readable failure reason, set only when status is `failed`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Title shown until the analyzer produces a real one.
pub const PLACEHOLDER_TITLE: &str = "Processing recipe...";

impl Recipe {
    /// Create a new pending recipe for a submitted URL.
    pub fn new(
        user_id: impl Into<String>,
        original_url: impl Into<String>,
        platform: Platform,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: RecipeId::new(),
            user_id: user_id.into(),
            original_url: original_url.into(),
            platform,
            status: RecipeStatus::Pending,
            title: PLACEHOLDER_TITLE.to_string(),
            description: None,
            notes: None,
            thumbnail_url: None,
            video_url: None,
            prep_time_minutes: None,
            cook_time_minutes: None,
            servings: None,
            cuisine: None,
            is_favorite: false,
            error_message: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial update applied to a recipe row.
///
/// `None` fields are left untouched. Stores apply updates conditionally
/// so that a row deleted mid-flight is never resurrected.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecipeUpdate {
    pub status: Option<RecipeStatus>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub thumbnail_url: Option<String>,
    pub video_url: Option<String>,
    pub prep_time_minutes: Option<u32>,
    pub cook_time_minutes: Option<u32>,
    pub servings: Option<f64>,
    pub cuisine: Option<String>,
    pub error_message: Option<String>,
}

impl RecipeUpdate {
    pub fn status(status: RecipeStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }

    /// Update for a failed job with its failure reason.
    pub fn failed(reason: impl Into<String>) -> Self {
        Self {
            status: Some(RecipeStatus::Failed),
            error_message: Some(reason.into()),
            ..Default::default()
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_thumbnail_url(mut self, url: impl Into<String>) -> Self {
        self.thumbnail_url = Some(url.into());
        self
    }

    pub fn with_video_url(mut self, url: impl Into<String>) -> Self {
        self.video_url = Some(url.into());
        self
    }

    pub fn with_cuisine(mut self, cuisine: impl Into<String>) -> Self {
        self.cuisine = Some(cuisine.into());
        self
    }

    pub fn with_prep_time_minutes(mut self, minutes: u32) -> Self {
        self.prep_time_minutes = Some(minutes);
        self
    }

    pub fn with_cook_time_minutes(mut self, minutes: u32) -> Self {
        self.cook_time_minutes = Some(minutes);
        self
    }

    pub fn with_servings(mut self, servings: f64) -> Self {
        self.servings = Some(servings);
        self
    }
}

/// A parsed ingredient row.
///
/// `raw_text` always carries the analyzer's line verbatim; `quantity`,
/// `unit` and `item` are best-effort parses and may be null when the
/// line does not follow the quantity-unit-item shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Ingredient {
    pub recipe_id: RecipeId,
    /// Zero-based position within the recipe, contiguous.
    pub order_index: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    pub item: String,
    pub raw_text: String,
}

/// A numbered instruction step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Instruction {
    pub recipe_id: RecipeId,
    /// One-based step number, contiguous.
    pub step_number: u32,
    pub text: String,
}
