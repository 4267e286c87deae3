//! Audio extraction and thumbnail capture using ffmpeg.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::error::{MediaError, MediaResult};

/// Extracted audio plus an optional thumbnail frame.
#[derive(Debug, Clone)]
pub struct ExtractedAudio {
    pub audio_path: PathBuf,
    /// Thumbnail capture is best-effort; `None` when it failed.
    pub thumbnail_path: Option<PathBuf>,
}

/// Extracts the audio track from a downloaded video.
#[async_trait]
pub trait AudioExtractor: Send + Sync {
    /// Extract a mono mp3 (and a thumbnail frame) from `video_path`
    /// into `workdir`.
    async fn extract(&self, video_path: &Path, workdir: &Path) -> MediaResult<ExtractedAudio>;
}

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    streams: Vec<ProbeStream>,
}

#[derive(Debug, Deserialize)]
struct ProbeStream {
    codec_type: Option<String>,
}

/// ffmpeg backed extractor.
#[derive(Debug, Clone, Default)]
pub struct FfmpegExtractor;

impl FfmpegExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Check the video actually carries an audio stream.
    ///
    /// Running ffmpeg on a silent video produces an empty or missing
    /// output file with a confusing error, so probe up front.
    async fn has_audio_stream(video_path: &Path) -> MediaResult<bool> {
        which::which("ffprobe").map_err(|_| MediaError::FfprobeNotFound)?;

        let output = Command::new("ffprobe")
            .args([
                "-v",
                "error",
                "-show_streams",
                "-of",
                "json",
            ])
            .arg(video_path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).to_string();
            return Err(MediaError::ffprobe_failed(
                "ffprobe failed to inspect video",
                Some(stderr),
            ));
        }

        let probe: ProbeOutput = serde_json::from_slice(&output.stdout)?;
        Ok(probe
            .streams
            .iter()
            .any(|s| s.codec_type.as_deref() == Some("audio")))
    }

    /// Capture a single frame one second in as a thumbnail.
    ///
    /// Failure here never fails the job; the recipe just has no image.
    async fn capture_thumbnail(video_path: &Path, workdir: &Path) -> Option<PathBuf> {
        let thumbnail_path = workdir.join("thumbnail.jpg");

        let result = Command::new("ffmpeg")
            .args(["-y", "-ss", "1", "-i"])
            .arg(video_path)
            .args(["-frames:v", "1", "-q:v", "2"])
            .arg(&thumbnail_path)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .await;

        match result {
            Ok(output) if output.status.success() && thumbnail_path.exists() => {
                debug!(path = %thumbnail_path.display(), "Captured thumbnail");
                Some(thumbnail_path)
            }
            Ok(output) => {
                warn!(
                    stderr = %String::from_utf8_lossy(&output.stderr),
                    "Thumbnail capture failed, continuing without one"
                );
                None
            }
            Err(e) => {
                warn!(error = %e, "Thumbnail capture failed, continuing without one");
                None
            }
        }
    }
}

#[async_trait]
impl AudioExtractor for FfmpegExtractor {
    async fn extract(&self, video_path: &Path, workdir: &Path) -> MediaResult<ExtractedAudio> {
        if !video_path.exists() {
            return Err(MediaError::FileNotFound(video_path.to_path_buf()));
        }

        which::which("ffmpeg").map_err(|_| MediaError::FfmpegNotFound)?;

        if !Self::has_audio_stream(video_path).await? {
            return Err(MediaError::NoAudioStream);
        }

        let audio_path = workdir.join("audio.mp3");

        info!(video = %video_path.display(), "Extracting audio track");

        // Mono keeps the file small for the transcription upload limit
        // without hurting speech recognition quality.
        let output = Command::new("ffmpeg")
            .args(["-y", "-i"])
            .arg(video_path)
            .args(["-vn", "-acodec", "libmp3lame", "-q:a", "2", "-ac", "1"])
            .arg(&audio_path)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).to_string();
            debug!("ffmpeg stderr: {}", stderr);
            return Err(MediaError::ffmpeg_failed(
                "audio extraction failed",
                Some(stderr),
                output.status.code(),
            ));
        }

        if !audio_path.exists() || audio_path.metadata()?.len() == 0 {
            return Err(MediaError::EmptyAudio);
        }

        let thumbnail_path = Self::capture_thumbnail(video_path, workdir).await;

        info!(
            audio = %audio_path.display(),
            size_kb = audio_path.metadata()?.len() / 1024,
            has_thumbnail = thumbnail_path.is_some(),
            "Extracted audio successfully"
        );

        Ok(ExtractedAudio {
            audio_path,
            thumbnail_path,
        })
    }
}
