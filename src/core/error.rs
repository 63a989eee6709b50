//! Error taxonomy for the ingestion pipeline.
//!
//! Only [`PipelineError::EnhancementFailure`] is recoverable: the orchestrator
//! folds it into the reply and still saves the note. Everything else aborts
//! the current item and becomes an error reply.

use thiserror::Error;

/// Pipeline errors
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Sender is not authorized")]
    Unauthorized,

    #[error("Content exceeds the {limit} byte limit")]
    OversizeContent { limit: u64, actual: Option<u64> },

    #[error("PDF documents are not supported yet")]
    PdfNotSupported,

    #[error("Not a webpage (content-type: {content_type})")]
    UnsupportedContentType { content_type: String },

    #[error("Fetch failed: {0}")]
    FetchFailure(String),

    #[error("Nothing extracted from {origin}")]
    NothingExtracted { origin: String },

    #[error("Malformed model output: {reason}")]
    MalformedModelOutput { reason: String },

    #[error("Enhancement failed: {0}")]
    EnhancementFailure(String),

    #[error("Model call failed: {0}")]
    ModelCall(String),

    #[error("Upload failed: {0}")]
    Storage(String),

    #[error("Failed to save note: {0}")]
    Persistence(String),

    #[error("{platform} is not supported yet")]
    UnsupportedPlatform { platform: String },

    #[error("No {0} configured")]
    MissingCollaborator(&'static str),
}

impl PipelineError {
    /// Whether the orchestrator may continue past this error
    pub fn is_recoverable(&self) -> bool {
        matches!(self, PipelineError::EnhancementFailure(_))
    }

    /// Shorthand for a malformed model output
    pub fn malformed(reason: impl Into<String>) -> Self {
        PipelineError::MalformedModelOutput {
            reason: reason.into(),
        }
    }

    /// Shorthand for an empty extraction
    pub fn nothing_extracted(origin: impl Into<String>) -> Self {
        PipelineError::NothingExtracted {
            origin: origin.into(),
        }
    }

    /// Wrap an adapter error from a model call, keeping its context chain
    pub fn model_call(err: anyhow::Error) -> Self {
        PipelineError::ModelCall(format!("{:#}", err))
    }

    pub fn storage(err: anyhow::Error) -> Self {
        PipelineError::Storage(format!("{:#}", err))
    }

    pub fn persistence(err: anyhow::Error) -> Self {
        PipelineError::Persistence(format!("{:#}", err))
    }

    pub fn fetch(err: impl std::fmt::Display) -> Self {
        PipelineError::FetchFailure(err.to_string())
    }
}

pub type PipelineResult<T> = std::result::Result<T, PipelineError>;
