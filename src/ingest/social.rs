//! Social post extraction through an external scraping service.
//!
//! Each supported platform maps to one scraper actor. Actor responses are
//! loosely shaped JSON, so author and body are read from a list of candidate
//! fields and the first non-empty one wins.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, instrument};

use crate::adapters::ScrapeService;
use crate::core::error::{PipelineError, PipelineResult};
use crate::domain::{ExtractionResult, SourceKind};

use super::sanitize::clean_for_storage;

/// Known platforms, by URL host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    Facebook,
    Threads,
    Instagram,
    X,
}

impl Platform {
    /// Match a URL host against the platform table
    pub fn from_host(host: &str) -> Option<Self> {
        let host = host.trim_end_matches('.').to_ascii_lowercase();
        let matches = |domain: &str| host == domain || host.ends_with(&format!(".{}", domain));

        if matches("facebook.com") || matches("fb.com") || matches("fb.watch") {
            Some(Platform::Facebook)
        } else if matches("threads.net") || matches("threads.com") {
            Some(Platform::Threads)
        } else if matches("instagram.com") {
            Some(Platform::Instagram)
        } else if matches("x.com") || matches("twitter.com") {
            Some(Platform::X)
        } else {
            None
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Platform::Facebook => "Facebook",
            Platform::Threads => "Threads",
            Platform::Instagram => "Instagram",
            Platform::X => "X",
        }
    }

    /// Source kind for platforms with a scraper integration
    pub fn source_kind(&self) -> Option<SourceKind> {
        match self {
            Platform::Facebook => Some(SourceKind::SocialFacebook),
            Platform::Threads => Some(SourceKind::SocialThreads),
            Platform::Instagram | Platform::X => None,
        }
    }

    pub fn is_supported(&self) -> bool {
        self.source_kind().is_some()
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Scraper actor per platform
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SocialActors {
    #[serde(default = "default_facebook_actor")]
    pub facebook_actor: String,

    #[serde(default = "default_threads_actor")]
    pub threads_actor: String,
}

fn default_facebook_actor() -> String {
    "apify~facebook-posts-scraper".to_string()
}
fn default_threads_actor() -> String {
    "curious_coder~threads-scraper".to_string()
}

impl Default for SocialActors {
    fn default() -> Self {
        Self {
            facebook_actor: default_facebook_actor(),
            threads_actor: default_threads_actor(),
        }
    }
}

impl SocialActors {
    pub fn actor_for(&self, platform: Platform) -> Option<&str> {
        match platform {
            Platform::Facebook => Some(&self.facebook_actor),
            Platform::Threads => Some(&self.threads_actor),
            Platform::Instagram | Platform::X => None,
        }
    }
}

const AUTHOR_FIELDS: &[&[&str]] = &[
    &["user", "name"],
    &["pageName"],
    &["author", "name"],
    &["ownerUsername"],
    &["username"],
    &["user", "username"],
];

const PRIMARY_BODY_FIELDS: &[&[&str]] = &[&["text"], &["message"]];

const SECONDARY_BODY_FIELDS: &[&[&str]] = &[&["caption"]];

fn field_str<'a>(item: &'a Value, path: &[&str]) -> Option<&'a str> {
    path.iter()
        .try_fold(item, |value, key| value.get(key))
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// First non-empty string among candidate field paths
pub fn first_non_empty<'a>(item: &'a Value, paths: &[&[&str]]) -> Option<&'a str> {
    paths.iter().find_map(|path| field_str(item, path))
}

/// Normalize one scraper result into an extraction
pub fn normalize_post(item: &Value, platform: Platform) -> PipelineResult<ExtractionResult> {
    let source_kind = platform
        .source_kind()
        .ok_or_else(|| PipelineError::UnsupportedPlatform {
            platform: platform.to_string(),
        })?;

    let author = first_non_empty(item, AUTHOR_FIELDS).unwrap_or("Unknown");
    let body = first_non_empty(item, PRIMARY_BODY_FIELDS)
        .or_else(|| first_non_empty(item, SECONDARY_BODY_FIELDS))
        .ok_or_else(|| PipelineError::nothing_extracted(format!("{} post", platform)))?;

    let title = format!("{}'s {} post", author, platform);
    Ok(ExtractionResult::new(
        Some(clean_for_storage(&title)),
        clean_for_storage(body),
        source_kind,
    ))
}

/// Extracts social posts via a [`ScrapeService`]
pub struct SocialExtractor {
    scraper: Arc<dyn ScrapeService>,
    actors: SocialActors,
}

impl SocialExtractor {
    pub fn new(scraper: Arc<dyn ScrapeService>, actors: SocialActors) -> Self {
        Self { scraper, actors }
    }

    /// Scrape one post
    #[instrument(skip(self), fields(platform = %platform))]
    pub async fn extract(&self, url: &str, platform: Platform) -> PipelineResult<ExtractionResult> {
        let actor = self
            .actors
            .actor_for(platform)
            .ok_or_else(|| PipelineError::UnsupportedPlatform {
                platform: platform.to_string(),
            })?;

        let items = self
            .scraper
            .run_actor(actor, &[url.to_string()], 1)
            .await
            .map_err(|e| PipelineError::FetchFailure(format!("{:#}", e)))?;

        let first = items
            .first()
            .ok_or_else(|| PipelineError::nothing_extracted(url))?;

        let result = normalize_post(first, platform)?.with_url(url);
        info!(chars = result.content.chars().count(), "Extracted social post");
        Ok(result)
    }
}
