//! Video fetching using yt-dlp.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::process::Command;
use tracing::{debug, info, warn};

use rsave_models::Platform;

use crate::error::{MediaError, MediaResult};

const USER_AGENT: &str = "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X) \
AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.0 Mobile/15E148 Safari/604.1";

/// Metadata reported by the platform for a video.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VideoMetadata {
    pub title: Option<String>,
    pub description: Option<String>,
    pub uploader: Option<String>,
    /// Platform-hosted thumbnail URL.
    pub thumbnail: Option<String>,
    /// Canonical watch-page URL.
    pub webpage_url: Option<String>,
    pub duration: Option<f64>,
}

/// A downloaded video plus its platform metadata.
#[derive(Debug, Clone)]
pub struct FetchedMedia {
    pub video_path: PathBuf,
    pub metadata: VideoMetadata,
}

/// Fetches source videos for the pipeline.
#[async_trait]
pub trait MediaFetcher: Send + Sync {
    /// Download the video at `url` into `workdir`.
    async fn fetch(
        &self,
        url: &str,
        platform: Platform,
        workdir: &Path,
    ) -> MediaResult<FetchedMedia>;
}

/// yt-dlp backed fetcher.
#[derive(Debug, Clone, Default)]
pub struct YtDlpFetcher;

impl YtDlpFetcher {
    pub fn new() -> Self {
        Self
    }

    /// Classify a failed yt-dlp run from its stderr.
    ///
    /// Permanent unavailability markers beat rate-limit markers; a
    /// private video stays private no matter how long we back off.
    fn classify_failure(stderr: &str) -> MediaError {
        let lowered = stderr.to_ascii_lowercase();
        let last_line = stderr.lines().last().unwrap_or("Unknown error").to_string();

        const UNAVAILABLE_MARKERS: &[&str] = &[
            "private video",
            "video unavailable",
            "this video is unavailable",
            "video has been removed",
            "account is private",
            "content is not available",
            "unable to extract",
            "unsupported url",
            "requested content is not available",
        ];
        if UNAVAILABLE_MARKERS.iter().any(|m| lowered.contains(m)) {
            return MediaError::Unavailable(last_line);
        }

        if stderr.contains("429")
            || lowered.contains("too many requests")
            || lowered.contains("rate limit")
        {
            return MediaError::RateLimited(last_line);
        }

        MediaError::download_failed(format!("yt-dlp failed: {last_line}"))
    }

    /// Platform-specific extractor arguments.
    fn extractor_args(platform: Platform) -> Option<&'static str> {
        match platform {
            // The TikTok web extractor is frequently blocked; the API
            // extractor with a mobile UA is much more reliable.
            Platform::Tiktok => Some("tiktok:api_hostname=api22-normal-c-useast2a.tiktokv.com"),
            Platform::Youtube => Some("youtube:player_client=web"),
            _ => None,
        }
    }

    async fn run_ytdlp(args: &[&str]) -> MediaResult<std::process::Output> {
        which::which("yt-dlp").map_err(|_| MediaError::YtDlpNotFound)?;

        let output = Command::new("yt-dlp")
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await?;
        Ok(output)
    }

    /// Probe platform metadata without downloading the video.
    async fn probe_metadata(url: &str, platform: Platform) -> MediaResult<VideoMetadata> {
        let mut args = vec!["--dump-json", "--no-download", "--user-agent", USER_AGENT];
        if let Some(extractor) = Self::extractor_args(platform) {
            args.push("--extractor-args");
            args.push(extractor);
        }
        args.push(url);

        let output = Self::run_ytdlp(&args).await?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            debug!("yt-dlp metadata probe stderr: {}", stderr);
            return Err(Self::classify_failure(&stderr));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let metadata: VideoMetadata = serde_json::from_str(stdout.trim())?;
        Ok(metadata)
    }
}

#[async_trait]
impl MediaFetcher for YtDlpFetcher {
    async fn fetch(
        &self,
        url: &str,
        platform: Platform,
        workdir: &Path,
    ) -> MediaResult<FetchedMedia> {
        let metadata = Self::probe_metadata(url, platform).await?;

        let output_path = workdir.join("video.mp4");
        let output_path_str = output_path.to_string_lossy().to_string();

        info!(url = %url, platform = %platform, "Downloading video");

        let mut args = vec![
            "--no-playlist",
            "--user-agent",
            USER_AGENT,
            "-f",
            "best[ext=mp4]/best",
            "--merge-output-format",
            "mp4",
            "-o",
            &output_path_str,
        ];
        if let Some(extractor) = Self::extractor_args(platform) {
            args.push("--extractor-args");
            args.push(extractor);
        }
        args.push(url);

        let output = Self::run_ytdlp(&args).await?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            debug!("yt-dlp stderr: {}", stderr);
            let err = Self::classify_failure(&stderr);
            if matches!(err, MediaError::RateLimited(_)) {
                warn!(url = %url, platform = %platform, "Platform rate limit detected");
            }
            return Err(err);
        }

        if !output_path.exists() {
            return Err(MediaError::download_failed("Output file not created"));
        }

        let file_size = output_path.metadata()?.len();
        if file_size == 0 {
            return Err(MediaError::download_failed("Downloaded file is empty"));
        }

        info!(
            output = %output_path.display(),
            size_mb = file_size as f64 / (1024.0 * 1024.0),
            "Downloaded video successfully"
        );

        Ok(FetchedMedia {
            video_path: output_path,
            metadata,
        })
    }
}
