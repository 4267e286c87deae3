//! The worker loop: dequeue, process, repeat.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{error, info, warn};

use rsave_queue::{JobQueue, QueueError};

use crate::pipeline::RecipePipeline;

/// Pulls jobs off the queue and runs them one at a time.
///
/// One job is processed fully before the next dequeue; concurrency is
/// achieved by running more worker processes, never within one.
pub struct JobExecutor {
    queue: Arc<dyn JobQueue>,
    pipeline: RecipePipeline,
    dequeue_timeout: Duration,
}

impl JobExecutor {
    pub fn new(queue: Arc<dyn JobQueue>, pipeline: RecipePipeline, dequeue_timeout: Duration) -> Self {
        Self {
            queue,
            pipeline,
            dequeue_timeout,
        }
    }

    /// Run until the shutdown signal flips.
    ///
    /// Shutdown is only observed between jobs; an in-flight job always
    /// runs to its terminal state.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        info!("Worker loop started");

        loop {
            if *shutdown.borrow() {
                break;
            }

            let dequeued = tokio::select! {
                result = self.queue.dequeue(self.dequeue_timeout) => result,
                _ = shutdown.changed() => break,
            };

            match dequeued {
                Ok(Some(job)) => {
                    info!(recipe_id = %job.recipe_id, "Processing job");
                    if let Err(e) = self.pipeline.run(&job).await {
                        error!(recipe_id = %job.recipe_id, error = %e, "Job processing error");
                    }
                }
                Ok(None) => {}
                Err(QueueError::MalformedPayload(e)) => {
                    // The payload is gone from the list; requeuing a
                    // payload that never parses would loop forever.
                    warn!(error = %e, "Dropping malformed job payload");
                }
                Err(e) => {
                    error!(error = %e, "Queue error, backing off");
                    tokio::time::sleep(Duration::from_secs(1)).await;
                }
            }
        }

        info!("Worker loop stopped");
    }
}
