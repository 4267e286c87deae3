//! Orchestrator tests against fake stage implementations.

use std::path::Path;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use rsave_media::audio::ExtractedAudio;
use rsave_media::fetch::{FetchedMedia, VideoMetadata};
use rsave_media::{AudioExtractor, MediaError, MediaFetcher, MediaResult};
use rsave_ml_client::{AnalysisContext, MlError, MlResult, RecipeAnalyzer, TranscriptionClient};
use rsave_models::{AnalyzedRecipe, Platform, Recipe, RecipeStatus};
use rsave_queue::ExtractionJob;
use rsave_store::{MemoryRecipeStore, RecipeStore};
use rsave_worker::{RecipePipeline, WorkerConfig};

struct FakeFetcher {
    calls: Arc<AtomicU32>,
    fail_with: Option<fn() -> MediaError>,
}

#[async_trait]
impl MediaFetcher for FakeFetcher {
    async fn fetch(
        &self,
        _url: &str,
        _platform: Platform,
        workdir: &Path,
    ) -> MediaResult<FetchedMedia> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(make_error) = self.fail_with {
            return Err(make_error());
        }
        Ok(FetchedMedia {
            video_path: workdir.join("video.mp4"),
            metadata: VideoMetadata {
                title: Some("Garlic Noodles in 60 Seconds".to_string()),
                description: Some("the best noodles".to_string()),
                uploader: Some("chef".to_string()),
                thumbnail: Some("https://cdn.example.com/thumb.jpg".to_string()),
                webpage_url: Some("https://www.tiktok.com/@chef/video/123".to_string()),
                duration: Some(58.0),
            },
        })
    }
}

struct FakeExtractor;

#[async_trait]
impl AudioExtractor for FakeExtractor {
    async fn extract(&self, _video_path: &Path, workdir: &Path) -> MediaResult<ExtractedAudio> {
        Ok(ExtractedAudio {
            audio_path: workdir.join("audio.mp3"),
            thumbnail_path: None,
        })
    }
}

struct FakeTranscriber;

#[async_trait]
impl TranscriptionClient for FakeTranscriber {
    async fn transcribe(&self, _audio_path: &Path) -> MlResult<String> {
        Ok("boil noodles, mince two cloves of garlic, toss with soy sauce".to_string())
    }
}

struct FakeAnalyzer {
    result: fn() -> MlResult<AnalyzedRecipe>,
}

#[async_trait]
impl RecipeAnalyzer for FakeAnalyzer {
    async fn analyze(
        &self,
        _transcript: &str,
        _context: &AnalysisContext,
    ) -> MlResult<AnalyzedRecipe> {
        (self.result)()
    }
}

fn good_analysis() -> MlResult<AnalyzedRecipe> {
    Ok(AnalyzedRecipe {
        title: Some("Garlic Noodles".to_string()),
        description: None,
        cuisine: Some("Chinese".to_string()),
        prep_time_minutes: Some(5),
        cook_time_minutes: Some(10),
        servings: Some(2.0),
        ingredients: vec![
            "8 oz noodles".to_string(),
            "2 cloves garlic".to_string(),
            "1 tbsp soy sauce".to_string(),
        ],
        instructions: vec![
            "Boil the noodles".to_string(),
            "Mince the garlic".to_string(),
            "Toss everything together".to_string(),
        ],
    })
}

struct Harness {
    store: MemoryRecipeStore,
    pipeline: RecipePipeline,
    fetch_calls: Arc<AtomicU32>,
}

fn harness(fetch_failure: Option<fn() -> MediaError>, analysis: fn() -> MlResult<AnalyzedRecipe>) -> Harness {
    let store = MemoryRecipeStore::new();
    let fetch_calls = Arc::new(AtomicU32::new(0));
    let config = WorkerConfig {
        fetch_timeout: Duration::from_secs(5),
        extract_timeout: Duration::from_secs(5),
        transcribe_timeout: Duration::from_secs(5),
        analyze_timeout: Duration::from_secs(5),
        ..WorkerConfig::default()
    };
    let pipeline = RecipePipeline::new(
        Arc::new(store.clone()),
        Arc::new(FakeFetcher {
            calls: fetch_calls.clone(),
            fail_with: fetch_failure,
        }),
        Arc::new(FakeExtractor),
        Arc::new(FakeTranscriber),
        Arc::new(FakeAnalyzer { result: analysis }),
        config,
    );
    Harness {
        store,
        pipeline,
        fetch_calls,
    }
}

async fn submit(store: &MemoryRecipeStore, url: &str, platform: Platform) -> (Recipe, ExtractionJob) {
    let recipe = Recipe::new("user-1", url, platform);
    store.insert_recipe(&recipe).await.unwrap();
    let job = ExtractionJob::new(recipe.id, url, "user-1");
    (recipe, job)
}

#[tokio::test]
async fn tiktok_submission_completes_end_to_end() {
    let h = harness(None, good_analysis);
    let (recipe, job) = submit(
        &h.store,
        "https://www.tiktok.com/@chef/video/123",
        Platform::Tiktok,
    )
    .await;

    h.pipeline.run(&job).await.unwrap();

    let done = h.store.get_recipe(recipe.id).await.unwrap().unwrap();
    assert_eq!(done.status, RecipeStatus::Completed);
    assert_eq!(done.status.progress_percent(), 100);
    assert_eq!(done.platform, Platform::Tiktok);
    assert_eq!(done.title, "Garlic Noodles");
    assert_eq!(done.cuisine.as_deref(), Some("Chinese"));
    assert_eq!(done.servings, Some(2.0));
    assert_eq!(
        done.thumbnail_url.as_deref(),
        Some("https://cdn.example.com/thumb.jpg")
    );
    assert!(done.error_message.is_none());

    let ingredients = h.store.ingredients(recipe.id).await.unwrap();
    assert_eq!(ingredients.len(), 3);
    let indices: Vec<u32> = ingredients.iter().map(|i| i.order_index).collect();
    assert_eq!(indices, vec![0, 1, 2]);
    assert_eq!(ingredients[0].raw_text, "8 oz noodles");
    assert_eq!(ingredients[0].quantity, Some(8.0));
    assert_eq!(ingredients[0].unit.as_deref(), Some("oz"));

    let instructions = h.store.instructions(recipe.id).await.unwrap();
    let steps: Vec<u32> = instructions.iter().map(|i| i.step_number).collect();
    assert_eq!(steps, vec![1, 2, 3]);
}

#[tokio::test]
async fn no_recipe_detected_fails_without_child_rows() {
    let h = harness(None, || Err(MlError::NoRecipeDetected));
    let (recipe, job) = submit(
        &h.store,
        "https://www.instagram.com/reel/ABC/",
        Platform::Instagram,
    )
    .await;

    h.pipeline.run(&job).await.unwrap();

    let failed = h.store.get_recipe(recipe.id).await.unwrap().unwrap();
    assert_eq!(failed.status, RecipeStatus::Failed);
    assert_eq!(failed.status.progress_percent(), 0);
    assert_eq!(failed.error_message.as_deref(), Some("no recipe detected"));
    assert!(h.store.ingredients(recipe.id).await.unwrap().is_empty());
    assert!(h.store.instructions(recipe.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn rate_limit_exhaustion_reaches_failed_without_looping() {
    let h = harness(
        Some(|| MediaError::RateLimited("429 Too Many Requests".to_string())),
        good_analysis,
    );
    let (recipe, job) = submit(&h.store, "https://youtu.be/abc123def45", Platform::Youtube).await;

    h.pipeline.run(&job).await.unwrap();

    // Initial attempt plus two retries, then a terminal failure.
    assert_eq!(h.fetch_calls.load(Ordering::SeqCst), 3);
    let failed = h.store.get_recipe(recipe.id).await.unwrap().unwrap();
    assert_eq!(failed.status, RecipeStatus::Failed);
    assert_eq!(
        failed.error_message.as_deref(),
        Some("platform is rate limiting downloads, try again later")
    );
}

#[tokio::test]
async fn unavailable_video_fails_immediately_without_retry() {
    let h = harness(
        Some(|| MediaError::Unavailable("Private video".to_string())),
        good_analysis,
    );
    let (recipe, job) = submit(
        &h.store,
        "https://www.facebook.com/reel/9",
        Platform::Facebook,
    )
    .await;

    h.pipeline.run(&job).await.unwrap();

    assert_eq!(h.fetch_calls.load(Ordering::SeqCst), 1);
    let failed = h.store.get_recipe(recipe.id).await.unwrap().unwrap();
    assert_eq!(failed.status, RecipeStatus::Failed);
    assert_eq!(failed.error_message.as_deref(), Some("video unavailable"));
}

#[tokio::test]
async fn terminal_recipe_is_skipped_without_side_effects() {
    let h = harness(None, good_analysis);
    let (mut recipe, job) = submit(
        &h.store,
        "https://www.tiktok.com/@chef/video/123",
        Platform::Tiktok,
    )
    .await;

    recipe.status = RecipeStatus::Completed;
    h.store.insert_recipe(&recipe).await.unwrap();

    h.pipeline.run(&job).await.unwrap();

    assert_eq!(h.fetch_calls.load(Ordering::SeqCst), 0);
    let unchanged = h.store.get_recipe(recipe.id).await.unwrap().unwrap();
    assert_eq!(unchanged.status, RecipeStatus::Completed);
}

#[tokio::test]
async fn in_flight_recipe_is_skipped_on_duplicate_delivery() {
    let h = harness(None, good_analysis);
    let (mut recipe, job) = submit(
        &h.store,
        "https://www.tiktok.com/@chef/video/123",
        Platform::Tiktok,
    )
    .await;

    recipe.status = RecipeStatus::Transcribing;
    h.store.insert_recipe(&recipe).await.unwrap();

    h.pipeline.run(&job).await.unwrap();

    assert_eq!(h.fetch_calls.load(Ordering::SeqCst), 0);
    let unchanged = h.store.get_recipe(recipe.id).await.unwrap().unwrap();
    assert_eq!(unchanged.status, RecipeStatus::Transcribing);
}

#[tokio::test]
async fn deleted_recipe_makes_job_a_noop() {
    let h = harness(None, good_analysis);
    let job = ExtractionJob::new(
        rsave_models::RecipeId::new(),
        "https://www.tiktok.com/@chef/video/123",
        "user-1",
    );

    h.pipeline.run(&job).await.unwrap();

    assert_eq!(h.fetch_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn unresolvable_url_in_replayed_job_fails_with_reason() {
    let h = harness(None, good_analysis);
    let (recipe, _) = submit(
        &h.store,
        "https://vimeo.com/12345",
        // Row predates a platform being dropped from support.
        Platform::Tiktok,
    )
    .await;
    let job = ExtractionJob::new(recipe.id, "https://vimeo.com/12345", "user-1");

    h.pipeline.run(&job).await.unwrap();

    assert_eq!(h.fetch_calls.load(Ordering::SeqCst), 0);
    let failed = h.store.get_recipe(recipe.id).await.unwrap().unwrap();
    assert_eq!(failed.status, RecipeStatus::Failed);
    assert_eq!(
        failed.error_message.as_deref(),
        Some("unsupported or invalid video URL")
    );
}
