//! Platform policy table: maps a URL to one named policy from a closed set,
//! where the policy affects only the options passed to the extractor.
//!
//! Selection is a pure host-substring lookup so it stays deterministic and
//! testable separately from network execution.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Named download policy for a platform family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum PlatformPolicy {
    /// Short clips; prefer the watermark-free rendition
    ShortFormVideo,
    /// Photo/reel platforms; prefer HD renditions
    PhotoSharing,
    /// Long-form video; merge best video+audio into mp4
    LongFormVideo,
    /// Everything else
    Generic,
}

/// Options handed to the extractor, derived from the selected policy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOptions {
    /// Format-selection expression
    pub format: String,
    /// Referer header required by some platforms
    pub referer: Option<String>,
    /// Container to merge separate streams into, when applicable
    pub merge_output_format: Option<String>,
}

impl PlatformPolicy {
    /// Select the policy for a URL via host substring checks
    pub fn for_url(url: &str) -> Self {
        if url.contains("tiktok.com") || url.contains("vm.tiktok.com") || url.contains("vt.tiktok.com")
        {
            PlatformPolicy::ShortFormVideo
        } else if url.contains("instagram.com") {
            PlatformPolicy::PhotoSharing
        } else if url.contains("youtube.com") || url.contains("youtu.be") {
            PlatformPolicy::LongFormVideo
        } else {
            PlatformPolicy::Generic
        }
    }

    /// Kebab-case policy name for logging
    pub fn name(&self) -> &'static str {
        match self {
            PlatformPolicy::ShortFormVideo => "short-form-video",
            PlatformPolicy::PhotoSharing => "photo-sharing",
            PlatformPolicy::LongFormVideo => "long-form-video",
            PlatformPolicy::Generic => "generic",
        }
    }

    /// Build the extractor options for this policy
    pub fn fetch_options(&self) -> FetchOptions {
        match self {
            PlatformPolicy::ShortFormVideo => FetchOptions {
                format: "best/bestvideo+bestaudio/best".to_string(),
                referer: Some("https://www.tiktok.com/".to_string()),
                merge_output_format: None,
            },
            PlatformPolicy::PhotoSharing => FetchOptions {
                format: "best[height>=720]/best".to_string(),
                referer: None,
                merge_output_format: None,
            },
            PlatformPolicy::LongFormVideo => FetchOptions {
                format: "bestvideo[ext=mp4]+bestaudio[ext=m4a]/best[ext=mp4]/best".to_string(),
                referer: None,
                merge_output_format: Some("mp4".to_string()),
            },
            PlatformPolicy::Generic => FetchOptions {
                format: "best[ext=mp4]/best".to_string(),
                referer: None,
                merge_output_format: None,
            },
        }
    }
}
