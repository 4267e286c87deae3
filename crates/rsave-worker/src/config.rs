//! Worker configuration from environment variables.

use std::time::Duration;

/// Runtime configuration for the worker process.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Redis connection string for the job queue.
    pub redis_url: String,
    /// SQLite connection string for the recipe store.
    pub database_url: String,
    /// OpenAI API key for transcription and analysis.
    pub openai_api_key: String,
    /// Wall-clock budget for a single download attempt.
    pub fetch_timeout: Duration,
    /// Wall-clock budget for audio extraction.
    pub extract_timeout: Duration,
    /// Wall-clock budget for a single transcription attempt.
    pub transcribe_timeout: Duration,
    /// Wall-clock budget for a single analysis attempt.
    pub analyze_timeout: Duration,
    /// How long a blocking dequeue waits before re-checking shutdown.
    pub dequeue_timeout: Duration,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            redis_url: "redis://127.0.0.1:6379".to_string(),
            database_url: "sqlite://recipes.db".to_string(),
            openai_api_key: String::new(),
            fetch_timeout: Duration::from_secs(180),
            extract_timeout: Duration::from_secs(60),
            transcribe_timeout: Duration::from_secs(120),
            analyze_timeout: Duration::from_secs(90),
            dequeue_timeout: Duration::from_secs(5),
        }
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_secs(key: &str, default: Duration) -> Duration {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .map(Duration::from_secs)
        .unwrap_or(default)
}

impl WorkerConfig {
    /// Load configuration from environment variables, with defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            redis_url: env_or("REDIS_URL", &defaults.redis_url),
            database_url: env_or("DATABASE_URL", &defaults.database_url),
            openai_api_key: env_or("OPENAI_API_KEY", ""),
            fetch_timeout: env_secs("FETCH_TIMEOUT_SECS", defaults.fetch_timeout),
            extract_timeout: env_secs("EXTRACT_TIMEOUT_SECS", defaults.extract_timeout),
            transcribe_timeout: env_secs("TRANSCRIBE_TIMEOUT_SECS", defaults.transcribe_timeout),
            analyze_timeout: env_secs("ANALYZE_TIMEOUT_SECS", defaults.analyze_timeout),
            dequeue_timeout: env_secs("DEQUEUE_TIMEOUT_SECS", defaults.dequeue_timeout),
        }
    }
}
