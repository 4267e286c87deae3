//! Recipe extraction worker binary.

use std::sync::Arc;

use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use rsave_media::{FfmpegExtractor, YtDlpFetcher};
use rsave_ml_client::{OpenAiAnalyzer, WhisperClient};
use rsave_queue::RedisJobQueue;
use rsave_store::SqliteRecipeStore;
use rsave_worker::{JobExecutor, RecipePipeline, WorkerConfig};

#[tokio::main]
async fn main() {
    // Install rustls crypto provider (required for TLS/HTTPS)
    rustls::crypto::ring::default_provider()
        .install_default()
        .expect("Failed to install rustls crypto provider");

    // Load environment variables
    dotenvy::dotenv().ok();

    // Colored output for dev, JSON for production
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::from_default_env()
        .add_directive("rsave=info".parse().unwrap())
        .add_directive("sqlx=warn".parse().unwrap());

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }

    info!("Starting rsave-worker");

    let config = WorkerConfig::from_env();
    if config.openai_api_key.is_empty() {
        error!("OPENAI_API_KEY not set");
        std::process::exit(1);
    }

    let store = match SqliteRecipeStore::connect(&config.database_url).await {
        Ok(s) => Arc::new(s),
        Err(e) => {
            error!("Failed to connect to database: {}", e);
            std::process::exit(1);
        }
    };

    let queue = match RedisJobQueue::new(&config.redis_url) {
        Ok(q) => Arc::new(q),
        Err(e) => {
            error!("Failed to create job queue: {}", e);
            std::process::exit(1);
        }
    };

    let pipeline = RecipePipeline::new(
        store,
        Arc::new(YtDlpFetcher::new()),
        Arc::new(FfmpegExtractor::new()),
        Arc::new(WhisperClient::new(config.openai_api_key.clone())),
        Arc::new(OpenAiAnalyzer::new(config.openai_api_key.clone())),
        config.clone(),
    );

    let executor = JobExecutor::new(queue, pipeline, config.dequeue_timeout);

    // Flip the shutdown flag on ctrl-c; the loop drains its current job first.
    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("Received shutdown signal");
        shutdown_tx.send(true).ok();
    });

    executor.run(shutdown_rx).await;

    info!("Worker shutdown complete");
}
