//! Shared data models for the RecipeSave extraction pipeline.
//!
//! This crate provides Serde-serializable types for:
//! - Platform classification of submitted URLs
//! - Recipe, ingredient and instruction records
//! - The pipeline status state machine and its published progress mapping
//! - The analyzer output contract

pub mod analysis;
pub mod platform;
pub mod recipe;
pub mod status;

// Re-export common types
pub use analysis::AnalyzedRecipe;
pub use platform::{Platform, PlatformError};
pub use recipe::{Ingredient, Instruction, Recipe, RecipeId, RecipeUpdate, PLACEHOLDER_TITLE};
pub use status::RecipeStatus;
