//! Output of the source-specific extractors.

use serde::{Deserialize, Serialize};

/// Plain text pulled out of a webpage, social post, voice clip or chat message.
///
/// Extractors hand this over already charset-valid and free of control
/// bytes other than newline, tab and carriage return.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionResult {
    /// Title, when the source has one
    pub title: Option<String>,

    /// Extracted text
    pub content: String,

    /// Where the text came from
    pub source_kind: SourceKind,

    /// Original URL for web and social sources
    pub source_url: Option<String>,
}

impl ExtractionResult {
    pub fn new(title: Option<String>, content: String, source_kind: SourceKind) -> Self {
        Self {
            title,
            content,
            source_kind,
            source_url: None,
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.source_url = Some(url.into());
        self
    }
}

/// Kind of source an extraction came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    Webpage,
    SocialFacebook,
    SocialThreads,
    Audio,
    DirectText,
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceKind::Webpage => write!(f, "webpage"),
            SourceKind::SocialFacebook => write!(f, "social-facebook"),
            SourceKind::SocialThreads => write!(f, "social-threads"),
            SourceKind::Audio => write!(f, "audio"),
            SourceKind::DirectText => write!(f, "direct-text"),
        }
    }
}
