//! Request handlers.

pub mod health;
pub mod recipes;

pub use health::health;
pub use recipes::{recipe_status, submit_recipe};
