//! Notes and the structured model outputs they are built from.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::ingest::sanitize::split_chunks;

/// Title and summary produced by the transform pipeline
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransformResult {
    pub title: String,
    pub summary: String,

    /// Style of the regenerated image, only on the image path
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style_variant: Option<String>,
}

/// Descriptive prompt and short title produced from an image
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImagePrompt {
    pub prompt: String,
    #[serde(default)]
    pub title: String,
}

/// The optional style-transfer enhancement of the image path
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StyleTransformJob {
    pub original_prompt: String,
    pub chosen_style: String,
    pub transformed_prompt: Option<String>,

    /// Absent when the enhancement degraded
    pub generated_image_ref: Option<String>,
}

impl StyleTransformJob {
    pub fn new(original_prompt: impl Into<String>, chosen_style: impl Into<String>) -> Self {
        Self {
            original_prompt: original_prompt.into(),
            chosen_style: chosen_style.into(),
            transformed_prompt: None,
            generated_image_ref: None,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.transformed_prompt.is_some() && self.generated_image_ref.is_some()
    }
}

/// Type tag stored with every note
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoteType {
    Voice,
    TextSummary,
    WebSummary,
    SocialPost,
    ImageInspiration,
}

impl NoteType {
    /// Label written to the store's select property
    pub fn label(&self) -> &'static str {
        match self {
            NoteType::Voice => "語音助手",
            NoteType::TextSummary => "文字摘要",
            NoteType::WebSummary => "網頁摘要",
            NoteType::SocialPost => "社群貼文",
            NoteType::ImageInspiration => "圖片靈感",
        }
    }
}

impl Default for NoteType {
    fn default() -> Self {
        Self::Voice
    }
}

impl std::fmt::Display for NoteType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// File attached to a note
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub name: String,
    pub url: String,
}

impl Attachment {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
        }
    }
}

/// The persisted unit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Note {
    pub title: String,

    /// Short content field (full transcript, or a preview of an article)
    pub content: String,

    pub summary: String,

    pub note_type: NoteType,

    pub date: NaiveDate,

    /// Sender of the inbound item
    pub author_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,

    #[serde(default)]
    pub attachments: Vec<Attachment>,

    /// Long-form body, stored as a sequence of chunked blocks. May be empty.
    #[serde(default)]
    pub body: String,
}

impl Note {
    /// Create a note dated from the given timestamp
    pub fn new(
        title: impl Into<String>,
        content: impl Into<String>,
        summary: impl Into<String>,
        note_type: NoteType,
        author_id: impl Into<String>,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            summary: summary.into(),
            note_type,
            date: at.date_naive(),
            author_id: author_id.into(),
            source_url: None,
            attachments: Vec::new(),
            body: String::new(),
        }
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    pub fn with_source_url(mut self, url: Option<String>) -> Self {
        self.source_url = url;
        self
    }

    pub fn with_attachment(mut self, attachment: Attachment) -> Self {
        self.attachments.push(attachment);
        self
    }

    /// Body split into fixed-width windows for the store
    pub fn body_chunks(&self, width: usize) -> Vec<String> {
        split_chunks(&self.body, width)
    }
}
