//! Media handling for the extraction pipeline.
//!
//! Two stages live here:
//! - Fetching source videos with yt-dlp ([`fetch`])
//! - Extracting mono audio and a thumbnail frame with ffmpeg ([`audio`])
//!
//! Both stages are behind traits so the pipeline can be driven with
//! in-memory fakes in tests.

pub mod audio;
pub mod error;
pub mod fetch;

pub use audio::{AudioExtractor, FfmpegExtractor};
pub use error::{MediaError, MediaResult};
pub use fetch::{FetchedMedia, MediaFetcher, VideoMetadata, YtDlpFetcher};
