//! Queue implementations.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use redis::AsyncCommands;
use tokio::sync::{Mutex, Notify};
use tracing::{debug, info};

use crate::error::QueueResult;
use crate::job::ExtractionJob;

/// Redis list key holding pending extraction jobs.
pub const QUEUE_KEY: &str = "recipe-extraction-jobs";

/// FIFO queue of extraction jobs.
#[async_trait]
pub trait JobQueue: Send + Sync {
    /// Push a job onto the tail of the queue.
    async fn enqueue(&self, job: &ExtractionJob) -> QueueResult<()>;

    /// Pop the next job, blocking up to `timeout`. `None` on timeout.
    async fn dequeue(&self, timeout: Duration) -> QueueResult<Option<ExtractionJob>>;
}

/// Redis-backed queue using RPUSH/BLPOP.
#[derive(Clone)]
pub struct RedisJobQueue {
    client: redis::Client,
    key: String,
}

impl RedisJobQueue {
    pub fn new(redis_url: &str) -> QueueResult<Self> {
        let client = redis::Client::open(redis_url)?;
        Ok(Self {
            client,
            key: QUEUE_KEY.to_string(),
        })
    }

}

#[async_trait]
impl JobQueue for RedisJobQueue {
    async fn enqueue(&self, job: &ExtractionJob) -> QueueResult<()> {
        let payload = serde_json::to_string(job)?;
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let () = conn.rpush(&self.key, payload).await?;
        info!(recipe_id = %job.recipe_id, "Enqueued extraction job");
        Ok(())
    }

    async fn dequeue(&self, timeout: Duration) -> QueueResult<Option<ExtractionJob>> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        // BLPOP timeout is in seconds; zero would block forever, so a
        // sub-second timeout rounds up to one second.
        let secs = timeout.as_secs_f64().max(1.0);
        let result: Option<(String, String)> = conn.blpop(&self.key, secs).await?;

        match result {
            Some((_, payload)) => {
                let job: ExtractionJob = serde_json::from_str(&payload)?;
                debug!(recipe_id = %job.recipe_id, "Dequeued extraction job");
                Ok(Some(job))
            }
            None => Ok(None),
        }
    }
}

/// In-process queue with the same blocking-pop contract.
#[derive(Clone, Default)]
pub struct MemoryJobQueue {
    jobs: Arc<Mutex<VecDeque<ExtractionJob>>>,
    notify: Arc<Notify>,
}

impl MemoryJobQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.jobs.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.jobs.lock().await.is_empty()
    }
}

#[async_trait]
impl JobQueue for MemoryJobQueue {
    async fn enqueue(&self, job: &ExtractionJob) -> QueueResult<()> {
        self.jobs.lock().await.push_back(job.clone());
        self.notify.notify_one();
        Ok(())
    }

    async fn dequeue(&self, timeout: Duration) -> QueueResult<Option<ExtractionJob>> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            if let Some(job) = self.jobs.lock().await.pop_front() {
                return Ok(Some(job));
            }
            let notified = self.notify.notified();
            if tokio::time::timeout_at(deadline, notified).await.is_err() {
                return Ok(None);
            }
        }
    }
}
