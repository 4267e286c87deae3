//! Transcript analysis via OpenAI chat completions.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use rsave_models::AnalyzedRecipe;

use crate::error::{MlError, MlResult};

const ANALYSIS_MODEL: &str = "gpt-4o-mini";
const ANALYSIS_TEMPERATURE: f64 = 0.3;

const CLASSIFICATION_PROMPT: &str = "You are a classifier. Decide whether the following \
video transcript describes cooking a dish or preparing food. Reply with exactly one word: \
RECIPE if it does, NOT_RECIPE if it does not.";

const EXTRACTION_PROMPT: &str = "You are a recipe extraction assistant. Extract the recipe \
from the following video transcript. Respond with a single JSON object and nothing else, \
using this shape:\n\
{\n\
  \"title\": \"short dish name\",\n\
  \"description\": \"one or two sentence summary\",\n\
  \"cuisine\": \"cuisine name or null\",\n\
  \"prep_time_minutes\": 10,\n\
  \"cook_time_minutes\": 20,\n\
  \"servings\": 4,\n\
  \"ingredients\": [\"2 cups flour\", \"1 tsp salt\"],\n\
  \"instructions\": [\"Mix the dry ingredients\", \"Bake for 20 minutes\"]\n\
}\n\
Use null for any field the speaker does not give. Each ingredient is one line with \
quantity, unit and item where the speaker gives them. Each instruction is one step in \
order. Omit nothing the speaker says about the dish; invent nothing they do not.";

/// Optional platform metadata passed alongside the transcript.
///
/// A caption or title often names the dish when the speaker never
/// does, so it is worth feeding to the model.
#[derive(Debug, Clone, Default)]
pub struct AnalysisContext {
    pub video_title: Option<String>,
    pub video_description: Option<String>,
}

/// Extracts a structured recipe from a transcript.
#[async_trait]
pub trait RecipeAnalyzer: Send + Sync {
    /// Analyze a transcript.
    ///
    /// Returns [`MlError::NoRecipeDetected`] when the transcript has no
    /// recipe content. That is a final content outcome, not a failure
    /// to retry.
    async fn analyze(
        &self,
        transcript: &str,
        context: &AnalysisContext,
    ) -> MlResult<AnalyzedRecipe>;
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f64,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

/// OpenAI chat-completions recipe analyzer.
pub struct OpenAiAnalyzer {
    api_key: String,
    base_url: String,
    client: Client,
}

/// Strip a markdown code fence wrapping a JSON payload.
///
/// Models frequently wrap JSON in ```json fences despite being told
/// not to. Content without a fence passes through untouched.
fn strip_code_fences(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    let rest = rest.strip_suffix("```").unwrap_or(rest);
    rest.trim()
}

impl OpenAiAnalyzer {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: "https://api.openai.com/v1".to_string(),
            client: Client::new(),
        }
    }

    /// Override the API base URL (used by tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    async fn chat(&self, system_prompt: &str, transcript: &str) -> MlResult<String> {
        let request = ChatRequest {
            model: ANALYSIS_MODEL,
            temperature: ANALYSIS_TEMPERATURE,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: transcript,
                },
            ],
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            if status.as_u16() == 429 {
                warn!("Chat completion rate limit hit");
                return Err(MlError::RateLimited(body));
            }
            return Err(MlError::api(status.as_u16(), body));
        }

        let parsed: ChatResponse = response.json().await?;
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| MlError::malformed("response contained no choices"))
    }

    /// Cheap pre-check before the full extraction call.
    ///
    /// An unexpected reply fails open: the extraction call is the
    /// authority on whether a recipe is actually there.
    async fn looks_like_recipe(&self, transcript: &str) -> MlResult<bool> {
        let reply = self.chat(CLASSIFICATION_PROMPT, transcript).await?;
        let verdict = reply.trim().to_ascii_uppercase();
        debug!(verdict = %verdict, "Classification verdict");
        Ok(verdict != "NOT_RECIPE")
    }
}

#[async_trait]
impl RecipeAnalyzer for OpenAiAnalyzer {
    async fn analyze(
        &self,
        transcript: &str,
        context: &AnalysisContext,
    ) -> MlResult<AnalyzedRecipe> {
        if transcript.trim().is_empty() {
            return Err(MlError::EmptyTranscript);
        }

        if !self.looks_like_recipe(transcript).await? {
            info!("Transcript classified as non-recipe content");
            return Err(MlError::NoRecipeDetected);
        }

        let mut user_content = String::new();
        if let Some(title) = &context.video_title {
            user_content.push_str(&format!("Video title: {title}\n"));
        }
        if let Some(description) = &context.video_description {
            user_content.push_str(&format!("Video caption: {description}\n"));
        }
        user_content.push_str("Transcript:\n");
        user_content.push_str(transcript);

        let reply = self.chat(EXTRACTION_PROMPT, &user_content).await?;
        let payload = strip_code_fences(&reply);

        let recipe: AnalyzedRecipe = serde_json::from_str(payload)
            .map_err(|e| MlError::malformed(format!("extraction output is not valid JSON: {e}")))?;

        if !recipe.has_content() {
            info!("Extraction produced no ingredients or instructions");
            return Err(MlError::NoRecipeDetected);
        }

        info!(
            ingredients = recipe.ingredients.len(),
            instructions = recipe.instructions.len(),
            "Recipe extracted from transcript"
        );
        Ok(recipe)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn chat_reply(content: &str) -> serde_json::Value {
        serde_json::json!({
            "choices": [{"message": {"role": "assistant", "content": content}}]
        })
    }

    #[test]
    fn strips_json_fences() {
        assert_eq!(
            strip_code_fences("```json\n{\"title\": \"x\"}\n```"),
            "{\"title\": \"x\"}"
        );
        assert_eq!(strip_code_fences("```\n{}\n```"), "{}");
        assert_eq!(strip_code_fences("  {\"a\": 1}  "), "{\"a\": 1}");
    }

    #[tokio::test]
    async fn extracts_recipe_after_classification() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(body_string_contains("RECIPE if it does"))
            .respond_with(ResponseTemplate::new(200).set_body_json(chat_reply("RECIPE")))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(body_string_contains("recipe extraction assistant"))
            .respond_with(ResponseTemplate::new(200).set_body_json(chat_reply(
                r#"{"title": "Garlic Noodles", "ingredients": ["2 cloves garlic"], "instructions": ["Mince the garlic"]}"#,
            )))
            .expect(1)
            .mount(&server)
            .await;

        let analyzer =
            OpenAiAnalyzer::new("test-key").with_base_url(format!("{}/v1", server.uri()));
        let recipe = analyzer
            .analyze("mince the garlic and toss", &AnalysisContext::default())
            .await
            .unwrap();
        assert_eq!(recipe.title.as_deref(), Some("Garlic Noodles"));
        assert_eq!(recipe.ingredients, vec!["2 cloves garlic"]);
    }

    #[tokio::test]
    async fn non_recipe_classification_short_circuits() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(chat_reply("NOT_RECIPE")))
            .expect(1)
            .mount(&server)
            .await;

        let analyzer =
            OpenAiAnalyzer::new("test-key").with_base_url(format!("{}/v1", server.uri()));
        let err = analyzer
            .analyze("a video about cats", &AnalysisContext::default())
            .await
            .unwrap_err();
        assert!(matches!(err, MlError::NoRecipeDetected));
    }

    #[tokio::test]
    async fn fenced_extraction_output_parses() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(body_string_contains("RECIPE if it does"))
            .respond_with(ResponseTemplate::new(200).set_body_json(chat_reply("RECIPE")))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(body_string_contains("recipe extraction assistant"))
            .respond_with(ResponseTemplate::new(200).set_body_json(chat_reply(
                "```json\n{\"ingredients\": [\"1 cup rice\"], \"instructions\": []}\n```",
            )))
            .mount(&server)
            .await;

        let analyzer =
            OpenAiAnalyzer::new("test-key").with_base_url(format!("{}/v1", server.uri()));
        let recipe = analyzer
            .analyze("rinse one cup of rice", &AnalysisContext::default())
            .await
            .unwrap();
        assert_eq!(recipe.ingredients, vec!["1 cup rice"]);
    }

    #[tokio::test]
    async fn empty_extraction_is_no_recipe() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(body_string_contains("RECIPE if it does"))
            .respond_with(ResponseTemplate::new(200).set_body_json(chat_reply("RECIPE")))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(body_string_contains("recipe extraction assistant"))
            .respond_with(ResponseTemplate::new(200).set_body_json(chat_reply(
                r#"{"title": "Untitled", "ingredients": [], "instructions": []}"#,
            )))
            .mount(&server)
            .await;

        let analyzer =
            OpenAiAnalyzer::new("test-key").with_base_url(format!("{}/v1", server.uri()));
        let err = analyzer
            .analyze("someone talks vaguely about food", &AnalysisContext::default())
            .await
            .unwrap_err();
        assert!(matches!(err, MlError::NoRecipeDetected));
    }

    #[tokio::test]
    async fn garbled_classification_fails_open() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(body_string_contains("RECIPE if it does"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(chat_reply("I think it might be food")),
            )
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(body_string_contains("recipe extraction assistant"))
            .respond_with(ResponseTemplate::new(200).set_body_json(chat_reply(
                r#"{"ingredients": ["1 egg"], "instructions": ["Fry the egg"]}"#,
            )))
            .mount(&server)
            .await;

        let analyzer =
            OpenAiAnalyzer::new("test-key").with_base_url(format!("{}/v1", server.uri()));
        // Garbled verdicts proceed to extraction rather than failing the job.
        let recipe = analyzer
            .analyze("crack an egg into the pan", &AnalysisContext::default())
            .await
            .unwrap();
        assert_eq!(recipe.instructions, vec!["Fry the egg"]);
    }

    #[tokio::test]
    async fn non_json_extraction_is_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(body_string_contains("RECIPE if it does"))
            .respond_with(ResponseTemplate::new(200).set_body_json(chat_reply("RECIPE")))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(body_string_contains("recipe extraction assistant"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(chat_reply("Sure! Here is the recipe:")),
            )
            .mount(&server)
            .await;

        let analyzer =
            OpenAiAnalyzer::new("test-key").with_base_url(format!("{}/v1", server.uri()));
        let err = analyzer
            .analyze("boil water", &AnalysisContext::default())
            .await
            .unwrap_err();
        assert!(matches!(err, MlError::MalformedResponse(_)));
        assert!(!err.is_transient());
    }
}
