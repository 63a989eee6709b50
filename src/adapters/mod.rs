//! Adapter interfaces for external systems.
//!
//! Each collaborator the pipeline talks to sits behind a narrow trait so the
//! orchestrator can be wired with real HTTP clients at process start and
//! with in-memory doubles in tests.

pub mod apify;
pub mod auth;
pub mod drive;
pub mod notion;
pub mod openrouter;

use anyhow::Result;
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde_json::Value;

use crate::domain::Note;

pub use apify::ApifyClient;
pub use auth::{AllowAll, AllowList};
pub use drive::{DriveCredentials, GoogleDriveStorage};
pub use notion::NotionClient;
pub use openrouter::OpenRouterClient;

/// One part of a chat message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentPart {
    Text(String),

    /// Media sent inline as base64
    InlineMedia { mime: String, data_base64: String },
}

/// A user message sent to the language model
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub parts: Vec<ContentPart>,
}

impl ChatMessage {
    /// Text-only message
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            parts: vec![ContentPart::Text(text.into())],
        }
    }

    /// Media followed by an instruction
    pub fn with_media(mime: impl Into<String>, bytes: &[u8], text: impl Into<String>) -> Self {
        Self {
            parts: vec![
                ContentPart::InlineMedia {
                    mime: mime.into(),
                    data_base64: STANDARD.encode(bytes),
                },
                ContentPart::Text(text.into()),
            ],
        }
    }

    /// Concatenated text parts, for logging and tests
    pub fn text_content(&self) -> String {
        self.parts
            .iter()
            .filter_map(|p| match p {
                ContentPart::Text(t) => Some(t.as_str()),
                ContentPart::InlineMedia { .. } => None,
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn has_media(&self) -> bool {
        self.parts
            .iter()
            .any(|p| matches!(p, ContentPart::InlineMedia { .. }))
    }
}

/// Image bytes returned by a generator
#[derive(Debug, Clone)]
pub struct GeneratedImage {
    pub bytes: Vec<u8>,
    pub mime: String,
}

/// Chat-completion style language model
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Human-readable client name
    fn name(&self) -> &str;

    /// Return the single text completion for the messages
    async fn complete(&self, model: &str, messages: &[ChatMessage]) -> Result<String>;
}

/// Text-to-image generation
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    async fn generate(&self, model: &str, prompt: &str) -> Result<GeneratedImage>;
}

/// Document store receiving one record per note
#[async_trait]
pub trait NoteStore: Send + Sync {
    /// Create the record and return its id
    async fn create(&self, note: &Note) -> Result<String>;
}

/// Object storage for images
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Upload publicly readable bytes and return a retrievable URL
    async fn upload(&self, bytes: Vec<u8>, file_name: &str, mime: &str) -> Result<String>;
}

/// Synchronous scraping service
#[async_trait]
pub trait ScrapeService: Send + Sync {
    /// Run an actor over start URLs and return its result items
    async fn run_actor(&self, actor: &str, start_urls: &[String], limit: u32) -> Result<Vec<Value>>;
}

/// Sender allow-list check
pub trait Authorizer: Send + Sync {
    fn is_authorized(&self, sender: &str) -> bool;
}
