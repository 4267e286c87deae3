//! Output contract of the recipe analyzer.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Structured recipe candidate extracted from a transcript.
///
/// Ingredient lines are kept as raw strings here; the schema mapper
/// owns the deterministic quantity/unit/item parse downstream.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AnalyzedRecipe {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub cuisine: Option<String>,
    #[serde(default)]
    pub prep_time_minutes: Option<u32>,
    #[serde(default)]
    pub cook_time_minutes: Option<u32>,
    #[serde(default)]
    pub servings: Option<f64>,
    #[serde(default)]
    pub ingredients: Vec<String>,
    #[serde(default)]
    pub instructions: Vec<String>,
}

impl AnalyzedRecipe {
    /// Whether the analyzer found any usable recipe content.
    ///
    /// A title alone does not count; a recipe needs at least one
    /// ingredient or one instruction step.
    pub fn has_content(&self) -> bool {
        !self.ingredients.is_empty() || !self.instructions.is_empty()
    }
}
