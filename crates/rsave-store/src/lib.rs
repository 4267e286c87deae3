//! Recipe persistence.
//!
//! The [`RecipeStore`] trait is the seam between the pipeline and its
//! storage backend. [`SqliteRecipeStore`] is the production backend;
//! [`MemoryRecipeStore`] backs tests and local development.

pub mod error;
pub mod memory;
pub mod sqlite;
pub mod store;

pub use error::{StoreError, StoreResult};
pub use memory::MemoryRecipeStore;
pub use sqlite::SqliteRecipeStore;
pub use store::RecipeStore;
