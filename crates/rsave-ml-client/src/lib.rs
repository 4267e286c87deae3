//! OpenAI clients for the transcription and analysis stages.
//!
//! [`WhisperClient`] uploads extracted audio for speech-to-text;
//! [`OpenAiAnalyzer`] turns the transcript into a structured recipe.
//! Both are behind traits so the pipeline can run against fakes.

pub mod analyzer;
pub mod error;
pub mod transcribe;

pub use analyzer::{AnalysisContext, OpenAiAnalyzer, RecipeAnalyzer};
pub use error::{MlError, MlResult};
pub use transcribe::{TranscriptionClient, WhisperClient};
