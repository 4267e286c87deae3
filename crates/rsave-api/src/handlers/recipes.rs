//! Recipe submission and status handlers.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::info;

use rsave_models::{Platform, PlatformError, Recipe, RecipeId, RecipeStatus};
use rsave_queue::ExtractionJob;

use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Recipe submission request.
#[derive(Deserialize)]
pub struct SubmitRecipeRequest {
    pub url: String,
}

/// Recipe submission response.
#[derive(Serialize)]
pub struct SubmitRecipeResponse {
    pub recipe_id: RecipeId,
    pub status: RecipeStatus,
    pub message: String,
}

/// Status polling response.
#[derive(Serialize)]
pub struct RecipeStatusResponse {
    pub recipe_id: RecipeId,
    pub status: RecipeStatus,
    pub progress: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

/// Submit a video URL for recipe extraction.
///
/// Validation is synchronous and rejects before anything is persisted:
/// a malformed URL and a well-formed URL on an unsupported host get
/// distinct 400 messages. On success the recipe row exists in `pending`
/// before the job is enqueued, so the worker's entry guard always finds
/// it.
pub async fn submit_recipe(
    State(state): State<AppState>,
    user: AuthUser,
    Json(request): Json<SubmitRecipeRequest>,
) -> ApiResult<(StatusCode, Json<SubmitRecipeResponse>)> {
    let platform = Platform::resolve(&request.url).map_err(|e| match e {
        PlatformError::InvalidUrl(detail) => {
            ApiError::bad_request(format!("Invalid video URL: {detail}"))
        }
        PlatformError::Unsupported(host) => {
            ApiError::bad_request(format!("Unsupported video platform: {host}"))
        }
    })?;

    let recipe = Recipe::new(&user.user_id, request.url.trim(), platform);
    state.store.insert_recipe(&recipe).await?;

    let job = ExtractionJob::new(recipe.id, recipe.original_url.clone(), &user.user_id);
    state.queue.enqueue(&job).await?;

    info!(
        recipe_id = %recipe.id,
        user_id = %user.user_id,
        platform = %platform,
        "Recipe submitted"
    );

    Ok((
        StatusCode::ACCEPTED,
        Json(SubmitRecipeResponse {
            recipe_id: recipe.id,
            status: recipe.status,
            message: "Recipe extraction started".to_string(),
        }),
    ))
}

/// Poll extraction status for a recipe.
///
/// 404 for an unknown id, 403 when the recipe belongs to another user.
pub async fn recipe_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    user: AuthUser,
) -> ApiResult<Json<RecipeStatusResponse>> {
    let recipe_id =
        RecipeId::parse(&id).ok_or_else(|| ApiError::not_found("Recipe not found"))?;

    let recipe = state
        .store
        .get_recipe(recipe_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Recipe not found"))?;

    if recipe.user_id != user.user_id {
        return Err(ApiError::forbidden("Recipe belongs to another user"));
    }

    Ok(Json(RecipeStatusResponse {
        recipe_id: recipe.id,
        status: recipe.status,
        progress: recipe.status.progress_percent(),
        error_message: recipe.error_message,
    }))
}
