//! OpenRouter client for chat completions and image generation.
//!
//! Speaks the OpenAI-compatible `/chat/completions` API. Inline media is
//! sent as a `data:` URL, which OpenRouter forwards to multimodal models for
//! both images and audio.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use super::{ChatMessage, ContentPart, GeneratedImage, ImageGenerator, LanguageModel};

pub const OPENROUTER_API_BASE: &str = "https://openrouter.ai/api/v1";

/// OpenRouter API client
pub struct OpenRouterClient {
    api_key: String,
    base_url: String,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
    #[serde(default)]
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    images: Vec<ResponseImage>,
}

#[derive(Debug, Deserialize)]
struct ResponseImage {
    image_url: ImageUrl,
}

#[derive(Debug, Deserialize)]
struct ImageUrl {
    url: String,
}

impl OpenRouterClient {
    /// Create a client with the given call timeout
    pub fn new(api_key: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build OpenRouter HTTP client")?;

        Ok(Self {
            api_key: api_key.into().trim().to_string(),
            base_url: OPENROUTER_API_BASE.to_string(),
            client,
        })
    }

    /// Point the client at another OpenAI-compatible endpoint
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    async fn post_chat(&self, body: Value) -> Result<ResponseMessage> {
        let url = format!("{}/chat/completions", self.base_url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .context("Failed to send OpenRouter request")?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            anyhow::bail!("OpenRouter error ({}): {}", status, text.trim());
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .context("Failed to parse OpenRouter response")?;

        if let Some(err) = parsed.error {
            anyhow::bail!("OpenRouter API error: {}", err.message);
        }

        parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message)
            .context("OpenRouter response has no choices")
    }
}

/// Wire form of a message
fn message_json(message: &ChatMessage) -> Value {
    let parts: Vec<Value> = message
        .parts
        .iter()
        .map(|part| match part {
            ContentPart::Text(text) => json!({ "type": "text", "text": text }),
            ContentPart::InlineMedia { mime, data_base64 } => json!({
                "type": "image_url",
                "image_url": { "url": format!("data:{};base64,{}", mime, data_base64) }
            }),
        })
        .collect();

    json!({ "role": "user", "content": parts })
}

/// Split a `data:<mime>;base64,<payload>` URL
pub fn decode_data_url(url: &str) -> Result<GeneratedImage> {
    let rest = url
        .strip_prefix("data:")
        .context("Image is not a data URL")?;
    let (meta, payload) = rest.split_once(',').context("Malformed data URL")?;
    let mime = meta
        .strip_suffix(";base64")
        .context("Data URL is not base64 encoded")?;

    let bytes = STANDARD
        .decode(payload.trim())
        .context("Failed to decode base64 image")?;

    Ok(GeneratedImage {
        bytes,
        mime: if mime.is_empty() {
            "image/png".to_string()
        } else {
            mime.to_string()
        },
    })
}

#[async_trait]
impl LanguageModel for OpenRouterClient {
    fn name(&self) -> &str {
        "openrouter"
    }

    async fn complete(&self, model: &str, messages: &[ChatMessage]) -> Result<String> {
        let wire: Vec<Value> = messages.iter().map(message_json).collect();
        let body = json!({
            "model": model,
            "messages": wire,
        });

        let message = self.post_chat(body).await?;
        let content = message
            .content
            .context("OpenRouter response has no text content")?;

        debug!(model, chars = content.chars().count(), "Model completed");
        Ok(content)
    }
}

#[async_trait]
impl ImageGenerator for OpenRouterClient {
    async fn generate(&self, model: &str, prompt: &str) -> Result<GeneratedImage> {
        let body = json!({
            "model": model,
            "messages": [message_json(&ChatMessage::text(prompt))],
            "modalities": ["image", "text"],
        });

        let message = self.post_chat(body).await?;
        let image = message
            .images
            .first()
            .context("Model returned no image")?;

        decode_data_url(&image.image_url.url)
    }
}
