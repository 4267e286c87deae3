//! The job orchestrator.
//!
//! Drives one job through the five pipeline stages in fixed order,
//! persisting each stage's status before starting its work so a crash
//! leaves the job visibly stuck in the prior stage rather than
//! silently reverted. Terminal outcomes are written exactly once.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use rsave_media::{AudioExtractor, MediaFetcher};
use rsave_ml_client::{AnalysisContext, RecipeAnalyzer, TranscriptionClient};
use rsave_models::{Platform, RecipeId, RecipeStatus, RecipeUpdate};
use rsave_queue::ExtractionJob;
use rsave_store::RecipeStore;

use crate::config::WorkerConfig;
use crate::error::{WorkerError, WorkerResult};
use crate::mapper;
use crate::retry::{retry_async, RetryConfig};

/// Fallback when neither the analyzer nor the platform provides one.
const UNTITLED: &str = "Untitled Recipe";

/// Orchestrates a single extraction job end to end.
pub struct RecipePipeline {
    store: Arc<dyn RecipeStore>,
    fetcher: Arc<dyn MediaFetcher>,
    extractor: Arc<dyn AudioExtractor>,
    transcriber: Arc<dyn TranscriptionClient>,
    analyzer: Arc<dyn RecipeAnalyzer>,
    config: WorkerConfig,
}

async fn stage_timeout<T>(
    stage: &'static str,
    budget: Duration,
    fut: impl Future<Output = WorkerResult<T>>,
) -> WorkerResult<T> {
    match tokio::time::timeout(budget, fut).await {
        Ok(result) => result,
        Err(_) => Err(WorkerError::StageTimeout {
            stage,
            secs: budget.as_secs(),
        }),
    }
}

impl RecipePipeline {
    pub fn new(
        store: Arc<dyn RecipeStore>,
        fetcher: Arc<dyn MediaFetcher>,
        extractor: Arc<dyn AudioExtractor>,
        transcriber: Arc<dyn TranscriptionClient>,
        analyzer: Arc<dyn RecipeAnalyzer>,
        config: WorkerConfig,
    ) -> Self {
        Self {
            store,
            fetcher,
            extractor,
            transcriber,
            analyzer,
            config,
        }
    }

    /// Process one job to a terminal outcome.
    ///
    /// Every failure path records a reason on the recipe row; `Err` is
    /// returned only when the store itself is unreachable and not even
    /// the failure can be persisted.
    pub async fn run(&self, job: &ExtractionJob) -> WorkerResult<()> {
        // Entry guard: the recipe row is the source of truth, not the
        // queue payload.
        let Some(recipe) = self.store.get_recipe(job.recipe_id).await? else {
            info!(recipe_id = %job.recipe_id, "Recipe deleted before processing, skipping job");
            return Ok(());
        };
        if recipe.status != RecipeStatus::Pending {
            info!(
                recipe_id = %job.recipe_id,
                status = %recipe.status,
                "Recipe already picked up, skipping duplicate delivery"
            );
            return Ok(());
        }

        match self.execute(job).await {
            Ok(()) => Ok(()),
            Err(err) => {
                if let WorkerError::Store(_) = err {
                    return Err(err);
                }
                let reason = err.failure_reason();
                warn!(
                    recipe_id = %job.recipe_id,
                    reason = reason,
                    error = %err,
                    "Extraction failed"
                );
                let applied = self
                    .store
                    .update_recipe(job.recipe_id, RecipeUpdate::failed(reason))
                    .await?;
                if !applied {
                    info!(recipe_id = %job.recipe_id, "Recipe deleted mid-flight, failure not recorded");
                }
                Ok(())
            }
        }
    }

    /// Persist the stage's status before its work begins.
    ///
    /// Returns `false` when the row vanished, which aborts the job
    /// without treating it as an error.
    async fn advance(&self, id: RecipeId, status: RecipeStatus) -> WorkerResult<bool> {
        let applied = self
            .store
            .update_recipe(id, RecipeUpdate::status(status))
            .await?;
        if applied {
            info!(
                recipe_id = %id,
                status = %status,
                progress = status.progress_percent(),
                "Stage transition"
            );
        } else {
            info!(recipe_id = %id, "Recipe deleted mid-flight, abandoning job");
        }
        Ok(applied)
    }

    async fn execute(&self, job: &ExtractionJob) -> WorkerResult<()> {
        // Defensive re-resolution: jobs can be replayed from the queue
        // after the supported-platform set changed.
        let platform = Platform::resolve(&job.url)?;
        let workdir = tempfile::tempdir()?;

        // Stage 1: download
        if !self.advance(job.recipe_id, RecipeStatus::Downloading).await? {
            return Ok(());
        }
        let fetch_retry = RetryConfig::new("download")
            .with_max_retries(2)
            .with_base_delay(Duration::from_millis(500));
        let fetched = retry_async(&fetch_retry, |e: &WorkerError| e.is_transient(), || async {
            stage_timeout("download", self.config.fetch_timeout, async {
                Ok(self
                    .fetcher
                    .fetch(&job.url, platform, workdir.path())
                    .await?)
            })
            .await
        })
        .await?;

        // Stage 2: audio extraction (local transform, no retry)
        if !self
            .advance(job.recipe_id, RecipeStatus::ExtractingAudio)
            .await?
        {
            return Ok(());
        }
        let extracted = stage_timeout("extract_audio", self.config.extract_timeout, async {
            Ok(self
                .extractor
                .extract(&fetched.video_path, workdir.path())
                .await?)
        })
        .await?;

        // Stage 3: transcription
        if !self.advance(job.recipe_id, RecipeStatus::Transcribing).await? {
            return Ok(());
        }
        let transcribe_retry = RetryConfig::new("transcribe")
            .with_max_retries(1)
            .with_base_delay(Duration::from_millis(500));
        let transcript = retry_async(
            &transcribe_retry,
            |e: &WorkerError| e.is_transient(),
            || async {
                stage_timeout("transcribe", self.config.transcribe_timeout, async {
                    Ok(self.transcriber.transcribe(&extracted.audio_path).await?)
                })
                .await
            },
        )
        .await?;

        // Stage 4: analysis
        if !self.advance(job.recipe_id, RecipeStatus::Analyzing).await? {
            return Ok(());
        }
        let context = AnalysisContext {
            video_title: fetched.metadata.title.clone(),
            video_description: fetched.metadata.description.clone(),
        };
        let analyze_retry = RetryConfig::new("analyze")
            .with_max_retries(1)
            .with_base_delay(Duration::from_millis(500));
        let analyzed = retry_async(
            &analyze_retry,
            |e: &WorkerError| e.is_transient(),
            || async {
                stage_timeout("analyze", self.config.analyze_timeout, async {
                    Ok(self.analyzer.analyze(&transcript, &context).await?)
                })
                .await
            },
        )
        .await?;

        // Stage 5: map and complete in one conditional write
        let (ingredients, instructions) = mapper::map_recipe(job.recipe_id, &analyzed);

        let title = analyzed
            .title
            .clone()
            .filter(|t| !t.trim().is_empty())
            .or_else(|| fetched.metadata.title.clone())
            .unwrap_or_else(|| UNTITLED.to_string());

        let mut update = RecipeUpdate::status(RecipeStatus::Completed).with_title(title);
        if let Some(description) = analyzed
            .description
            .clone()
            .or_else(|| fetched.metadata.description.clone())
        {
            update = update.with_description(description);
        }
        if let Some(thumbnail) = fetched.metadata.thumbnail.clone() {
            update = update.with_thumbnail_url(thumbnail);
        }
        if let Some(video_url) = fetched.metadata.webpage_url.clone() {
            update = update.with_video_url(video_url);
        }
        if let Some(cuisine) = analyzed.cuisine.clone() {
            update = update.with_cuisine(cuisine);
        }
        if let Some(minutes) = analyzed.prep_time_minutes {
            update = update.with_prep_time_minutes(minutes);
        }
        if let Some(minutes) = analyzed.cook_time_minutes {
            update = update.with_cook_time_minutes(minutes);
        }
        if let Some(servings) = analyzed.servings {
            update = update.with_servings(servings);
        }

        let ingredient_count = ingredients.len();
        let instruction_count = instructions.len();
        let applied = self
            .store
            .complete_recipe(job.recipe_id, update, ingredients, instructions)
            .await?;

        if applied {
            info!(
                recipe_id = %job.recipe_id,
                platform = %platform,
                ingredients = ingredient_count,
                instructions = instruction_count,
                had_local_thumbnail = extracted.thumbnail_path.is_some(),
                "Recipe extraction completed"
            );
        } else {
            info!(recipe_id = %job.recipe_id, "Recipe deleted mid-flight, completion not recorded");
        }
        Ok(())
    }
}
