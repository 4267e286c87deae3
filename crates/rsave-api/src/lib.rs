//! HTTP boundary for recipe extraction.
//!
//! Accepts video URL submissions, exposes status polling, and runs the
//! stale-job reaper that fails recipes abandoned by a crashed worker.

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod services;
pub mod state;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use services::StaleJobDetector;
pub use state::AppState;
