//! Recipe extraction worker.
//!
//! Pulls jobs from the queue and drives each one through the five
//! pipeline stages, persisting every status transition. One job is
//! processed fully before the next is pulled.

pub mod config;
pub mod error;
pub mod executor;
pub mod mapper;
pub mod pipeline;
pub mod retry;

pub use config::WorkerConfig;
pub use error::{WorkerError, WorkerResult};
pub use executor::JobExecutor;
pub use pipeline::RecipePipeline;
pub use retry::{retry_async, RetryConfig};
