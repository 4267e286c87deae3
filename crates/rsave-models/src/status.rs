//! Pipeline status state machine.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle status of a recipe extraction job.
///
/// Statuses advance monotonically through the pipeline stages. `Failed`
/// is reachable from any non-terminal state; `Completed` and `Failed`
/// are terminal and never transition again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum RecipeStatus {
    /// Accepted and enqueued, no worker has picked it up yet.
    Pending,
    /// Fetching the source video from the platform.
    Downloading,
    /// Extracting the audio track from the downloaded video.
    ExtractingAudio,
    /// Transcribing the audio to text.
    Transcribing,
    /// Analyzing the transcript for recipe content.
    Analyzing,
    /// Structured recipe persisted.
    Completed,
    /// Extraction failed; see the error message for the reason.
    Failed,
}

impl RecipeStatus {
    /// Get string representation of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            RecipeStatus::Pending => "pending",
            RecipeStatus::Downloading => "downloading",
            RecipeStatus::ExtractingAudio => "extracting_audio",
            RecipeStatus::Transcribing => "transcribing",
            RecipeStatus::Analyzing => "analyzing",
            RecipeStatus::Completed => "completed",
            RecipeStatus::Failed => "failed",
        }
    }

    /// Parse a status tag previously produced by [`RecipeStatus::as_str`].
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(RecipeStatus::Pending),
            "downloading" => Some(RecipeStatus::Downloading),
            "extracting_audio" => Some(RecipeStatus::ExtractingAudio),
            "transcribing" => Some(RecipeStatus::Transcribing),
            "analyzing" => Some(RecipeStatus::Analyzing),
            "completed" => Some(RecipeStatus::Completed),
            "failed" => Some(RecipeStatus::Failed),
            _ => None,
        }
    }

    /// Check if this is a terminal status.
    pub fn is_terminal(&self) -> bool {
        matches!(self, RecipeStatus::Completed | RecipeStatus::Failed)
    }

    /// Progress percentage published to clients for this status.
    ///
    /// The mapping is part of the status API contract and must not drift.
    pub fn progress_percent(&self) -> u8 {
        match self {
            RecipeStatus::Pending => 5,
            RecipeStatus::Downloading => 15,
            RecipeStatus::ExtractingAudio => 35,
            RecipeStatus::Transcribing => 55,
            RecipeStatus::Analyzing => 80,
            RecipeStatus::Completed => 100,
            RecipeStatus::Failed => 0,
        }
    }

    /// Ordinal position in the pipeline, used to enforce monotonic advance.
    fn stage_order(&self) -> u8 {
        match self {
            RecipeStatus::Pending => 0,
            RecipeStatus::Downloading => 1,
            RecipeStatus::ExtractingAudio => 2,
            RecipeStatus::Transcribing => 3,
            RecipeStatus::Analyzing => 4,
            RecipeStatus::Completed => 5,
            RecipeStatus::Failed => 6,
        }
    }

    /// Check whether a transition to `next` is legal.
    ///
    /// Forward moves through the stage sequence are allowed, skips
    /// included. Terminal states accept no transitions. `Failed` is
    /// reachable from every non-terminal state.
    pub fn can_transition_to(&self, next: RecipeStatus) -> bool {
        if self.is_terminal() {
            return false;
        }
        if next == RecipeStatus::Failed {
            return true;
        }
        next.stage_order() > self.stage_order()
    }
}

impl fmt::Display for RecipeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
