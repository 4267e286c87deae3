//! Platform classification for submitted video URLs.
//!
//! The resolver runs at the submission boundary before a job is ever
//! enqueued, and again defensively inside the worker since jobs can be
//! replayed from the durable queue after code changes.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use url::Url;

/// Supported video platforms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    Tiktok,
    Instagram,
    Youtube,
    Facebook,
}

/// Errors from URL classification.
///
/// A malformed URL is deliberately distinct from a well-formed URL on an
/// unsupported host, so the API can tell the user which problem they have.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlatformError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Unsupported platform: {0}")]
    Unsupported(String),
}

impl Platform {
    /// Get string representation of the platform.
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Tiktok => "tiktok",
            Platform::Instagram => "instagram",
            Platform::Youtube => "youtube",
            Platform::Facebook => "facebook",
        }
    }

    /// Parse a platform tag previously produced by [`Platform::as_str`].
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "tiktok" => Some(Platform::Tiktok),
            "instagram" => Some(Platform::Instagram),
            "youtube" => Some(Platform::Youtube),
            "facebook" => Some(Platform::Facebook),
            _ => None,
        }
    }

    /// Classify a URL to a supported platform.
    ///
    /// Validates the string is a well-formed absolute http(s) URL first,
    /// then matches the host against each platform's known domains.
    /// First match wins; no match is a rejection, never a guess.
    pub fn resolve(raw: &str) -> Result<Self, PlatformError> {
        let url = Url::parse(raw.trim()).map_err(|e| PlatformError::InvalidUrl(e.to_string()))?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(PlatformError::InvalidUrl(format!(
                "unsupported scheme '{}'",
                url.scheme()
            )));
        }

        let host = url
            .host_str()
            .ok_or_else(|| PlatformError::InvalidUrl("missing host".to_string()))?
            .to_ascii_lowercase();

        const DOMAINS: &[(Platform, &[&str])] = &[
            (Platform::Tiktok, &["tiktok.com", "vm.tiktok.com", "vt.tiktok.com"]),
            (Platform::Instagram, &["instagram.com"]),
            (Platform::Youtube, &["youtube.com", "youtu.be"]),
            (Platform::Facebook, &["facebook.com", "fb.watch"]),
        ];

        for (platform, domains) in DOMAINS {
            for domain in domains.iter() {
                if host == *domain || host.ends_with(&format!(".{domain}")) {
                    return Ok(*platform);
                }
            }
        }

        Err(PlatformError::Unsupported(host))
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
