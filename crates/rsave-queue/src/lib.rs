//! Job queue connecting the API to the worker.
//!
//! Jobs are JSON payloads on a Redis list: the API pushes with RPUSH,
//! the worker blocks on BLPOP. [`MemoryJobQueue`] provides the same
//! contract in-process for tests.

pub mod error;
pub mod job;
pub mod queue;

pub use error::{QueueError, QueueResult};
pub use job::ExtractionJob;
pub use queue::{JobQueue, MemoryJobQueue, RedisJobQueue};
