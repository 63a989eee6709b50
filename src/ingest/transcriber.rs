//! Two-pass Cantonese transcription over a multimodal model.
//!
//! Pass 1 transcribes the clip verbatim in colloquial register. Pass 2 runs
//! the raw text through a separate correction prompt that only swaps
//! formal-register words for their colloquial forms, so each pass can be
//! tuned and tested on its own.

use tracing::{debug, info, instrument};

use crate::adapters::ChatMessage;
use crate::core::error::{PipelineError, PipelineResult};
use crate::core::prompts;
use crate::core::transform::TransformPipeline;
use crate::domain::{ExtractionResult, SourceKind};
use crate::ingest::sanitize::{clean_for_storage, truncate_preview};

/// Result of transcription
#[derive(Debug, Clone)]
pub struct TranscriptResult {
    /// Pass 1 output
    pub raw: String,
    /// Pass 2 output, the text that gets stored
    pub corrected: String,
}

impl TranscriptResult {
    /// The corrected transcript as an audio extraction
    pub fn into_extraction(self) -> ExtractionResult {
        ExtractionResult::new(None, self.corrected, SourceKind::Audio)
    }
}

/// Transcribe an audio clip
#[instrument(skip(pipeline, audio), fields(bytes = audio.len()))]
pub async fn transcribe(
    pipeline: &TransformPipeline,
    audio: &[u8],
    mime: &str,
) -> PipelineResult<TranscriptResult> {
    let raw = pipeline
        .ask(ChatMessage::with_media(mime, audio, prompts::TRANSCRIBE_CANTONESE))
        .await?;
    let raw = clean_for_storage(&raw);

    if raw.trim().is_empty() {
        return Err(PipelineError::nothing_extracted("audio clip"));
    }
    debug!(raw = %truncate_preview(&raw, 100), "Raw transcription");

    let corrected = correct(pipeline, &raw).await?;
    info!(chars = corrected.chars().count(), "Transcription corrected");

    Ok(TranscriptResult { raw, corrected })
}

/// Pass 2: lexical register correction
pub async fn correct(pipeline: &TransformPipeline, raw: &str) -> PipelineResult<String> {
    let corrected = pipeline
        .ask(ChatMessage::text(prompts::correction_prompt(raw)))
        .await?;
    let corrected = clean_for_storage(&corrected);

    // An empty correction would lose the transcript; keep pass 1 instead
    if corrected.trim().is_empty() {
        return Ok(raw.to_string());
    }
    Ok(corrected)
}
