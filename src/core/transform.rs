//! AI transform pipeline.
//!
//! Sequences the model calls that turn extracted text or image bytes into
//! structured output. Structured replies may come back wrapped in a fenced
//! code block; the fence is stripped before parsing, and anything that still
//! fails to parse is a [`PipelineError::MalformedModelOutput`].

use std::sync::Arc;

use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

use crate::adapters::{ChatMessage, LanguageModel};
use crate::core::error::{PipelineError, PipelineResult};
use crate::core::prompts;
use crate::domain::{ImagePrompt, TransformResult};
use crate::ingest::sanitize::truncate_preview;
use crate::ingest::script::is_target_script;

/// Remove a leading and a trailing fence line, if present
pub fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    if !trimmed.starts_with("```") {
        return trimmed;
    }

    let body = trimmed.split_once('\n').map(|(_, rest)| rest).unwrap_or("");
    let body = body.trim_end();
    body.strip_suffix("```").unwrap_or(body).trim()
}

/// Parse a model reply as JSON after fence stripping
pub fn parse_structured<T: DeserializeOwned>(raw: &str) -> PipelineResult<T> {
    let body = strip_code_fence(raw);
    serde_json::from_str(body).map_err(|e| {
        PipelineError::malformed(format!("{} (reply: {})", e, truncate_preview(raw, 80)))
    })
}

/// Parse a title/summary reply, rejecting empty fields
pub fn parse_transform(raw: &str) -> PipelineResult<TransformResult> {
    let result: TransformResult = parse_structured(raw)?;
    if result.title.trim().is_empty() || result.summary.trim().is_empty() {
        return Err(PipelineError::malformed("empty title or summary"));
    }
    Ok(TransformResult {
        title: result.title.trim().to_string(),
        summary: result.summary.trim().to_string(),
        style_variant: None,
    })
}

/// Parse an image-understanding reply
pub fn parse_image_prompt(raw: &str) -> PipelineResult<ImagePrompt> {
    let result: ImagePrompt = parse_structured(raw)?;
    if result.prompt.trim().is_empty() {
        return Err(PipelineError::malformed("empty image prompt"));
    }
    Ok(ImagePrompt {
        prompt: result.prompt.trim().to_string(),
        title: result.title.trim().to_string(),
    })
}

/// Register of a generated summary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SummaryRegister {
    /// Formal written Chinese
    Formal,
    /// Colloquial Cantonese
    Cantonese,
    /// Cantonese, translating first when the text is not CJK
    TranslationAware,
}

/// Model calls for summaries, image prompts and style rewrites
pub struct TransformPipeline {
    model: Arc<dyn LanguageModel>,
    text_model: String,
}

impl TransformPipeline {
    pub fn new(model: Arc<dyn LanguageModel>, text_model: impl Into<String>) -> Self {
        Self {
            model,
            text_model: text_model.into(),
        }
    }

    pub fn text_model(&self) -> &str {
        &self.text_model
    }

    /// Single completion, trimmed
    pub async fn ask(&self, message: ChatMessage) -> PipelineResult<String> {
        debug!(client = self.model.name(), model = %self.text_model, "Calling model");
        let reply = self
            .model
            .complete(&self.text_model, std::slice::from_ref(&message))
            .await
            .map_err(PipelineError::model_call)?;
        Ok(reply.trim().to_string())
    }

    /// Title and summary in the requested register
    #[instrument(skip(self, text), fields(chars = text.chars().count()))]
    pub async fn summarize(
        &self,
        text: &str,
        register: SummaryRegister,
    ) -> PipelineResult<TransformResult> {
        let prompt = match register {
            SummaryRegister::Formal => prompts::formal_summary_prompt(text),
            SummaryRegister::Cantonese => prompts::cantonese_summary_prompt(text),
            SummaryRegister::TranslationAware => {
                if is_target_script(text) {
                    prompts::cantonese_summary_prompt(text)
                } else {
                    debug!("Content is not CJK, translating before summarizing");
                    prompts::translate_summary_prompt(text)
                }
            }
        };

        let reply = self.ask(ChatMessage::text(prompt)).await?;
        parse_transform(&reply)
    }

    /// Descriptive prompt and title for an image
    #[instrument(skip(self, bytes), fields(bytes = bytes.len()))]
    pub async fn describe_image(&self, bytes: &[u8], mime: &str) -> PipelineResult<ImagePrompt> {
        let reply = self
            .ask(ChatMessage::with_media(mime, bytes, prompts::IMAGE_UNDERSTANDING))
            .await?;
        parse_image_prompt(&reply)
    }

    /// Freeform style rewrite of an image prompt
    pub async fn transform_style(&self, prompt: &str, style: &str) -> PipelineResult<String> {
        let reply = self
            .ask(ChatMessage::text(prompts::style_transform_prompt(prompt, style)))
            .await?;
        if reply.is_empty() {
            return Err(PipelineError::malformed("empty style rewrite"));
        }
        Ok(reply)
    }
}
