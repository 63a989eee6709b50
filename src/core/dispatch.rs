//! Classification of inbound items.
//!
//! One pure decision function maps a payload plus capability flags to a
//! [`Route`]. The orchestrator checks authorization before calling it.

use std::sync::LazyLock;

use regex::Regex;
use reqwest::Url;
use serde::{Deserialize, Serialize};

use crate::domain::InboundPayload;
use crate::ingest::Platform;

/// Command prefix for "summarize this article"
pub const ARTICLE_PREFIX: &str = "/a ";

static URL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"https?://[^\s<>"'「」『』，。、！？\p{Han}]+"#).expect("valid URL regex")
});

/// Optional behaviors, toggled per deployment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capabilities {
    /// Check senders against the allow-list
    #[serde(default = "enabled")]
    pub authorization: bool,

    /// Scrape supported social platforms
    #[serde(default = "enabled")]
    pub social_scrape: bool,

    /// Regenerate submitted images in a new style
    #[serde(default = "enabled")]
    pub image_regeneration: bool,
}

fn enabled() -> bool {
    true
}

impl Default for Capabilities {
    fn default() -> Self {
        Self {
            authorization: true,
            social_scrape: true,
            image_regeneration: true,
        }
    }
}

/// Where an inbound item goes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// Plain chat: echo back with usage hints
    Help { echo: String },

    /// `/a ` with nothing after it
    MissingArticle,

    /// Article text to summarize
    Article(String),

    /// Generic webpage
    Webpage(String),

    /// Social post with a scraper integration
    Social { url: String, platform: Platform },

    /// Known platform we cannot scrape
    UnsupportedPlatform { url: String, platform: Platform },

    Audio,

    Image { regenerate: bool },
}

impl Route {
    /// Short label for logs
    pub fn label(&self) -> &'static str {
        match self {
            Route::Help { .. } => "help",
            Route::MissingArticle => "missing_article",
            Route::Article(_) => "article",
            Route::Webpage(_) => "webpage",
            Route::Social { .. } => "social",
            Route::UnsupportedPlatform { .. } => "unsupported_platform",
            Route::Audio => "audio",
            Route::Image { .. } => "image",
        }
    }
}

/// First http(s) URL in the text that has a host
pub fn find_url(text: &str) -> Option<Url> {
    URL_PATTERN.find_iter(text).find_map(|m| {
        let candidate = m
            .as_str()
            .trim_end_matches(|c: char| matches!(c, '.' | ',' | ')' | ']' | '!' | '?' | ';' | ':'));
        Url::parse(candidate).ok().filter(|u| u.host_str().is_some())
    })
}

/// Route a URL by its host
pub fn classify_url(url: &Url, caps: &Capabilities) -> Route {
    let platform = url.host_str().and_then(Platform::from_host);
    let url_string = url.to_string();

    match platform {
        None => Route::Webpage(url_string),
        Some(platform) if platform.is_supported() && caps.social_scrape => Route::Social {
            url: url_string,
            platform,
        },
        Some(platform) => Route::UnsupportedPlatform {
            url: url_string,
            platform,
        },
    }
}

/// Decide the route for a payload
pub fn classify(payload: &InboundPayload, caps: &Capabilities) -> Route {
    match payload {
        InboundPayload::Audio { .. } => Route::Audio,
        InboundPayload::Image { .. } => Route::Image {
            regenerate: caps.image_regeneration,
        },
        InboundPayload::UrlReference(raw) => match find_url(raw) {
            Some(url) => classify_url(&url, caps),
            None => Route::Help { echo: raw.clone() },
        },
        InboundPayload::TextCommand(text) => {
            if let Some(url) = find_url(text) {
                return classify_url(&url, caps);
            }

            match text.strip_prefix(ARTICLE_PREFIX) {
                Some(rest) if rest.trim().is_empty() => Route::MissingArticle,
                Some(rest) => Route::Article(rest.trim().to_string()),
                None => Route::Help { echo: text.clone() },
            }
        }
    }
}
