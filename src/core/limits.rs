//! Tunable bounds for ingestion.
//!
//! The byte ceiling is the one hard memory bound of the pipeline; the other
//! values shape what is sent to the model and what is echoed back to chat.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Limits applied while ingesting one item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestLimits {
    /// Maximum webpage body size in bytes (default: 5MB)
    #[serde(default = "default_max_page_bytes")]
    pub max_page_bytes: u64,

    /// A 403 response with a body larger than this is still processed
    #[serde(default = "default_forbidden_body_threshold")]
    pub forbidden_body_threshold: usize,

    /// Webpage text is cut to this many characters before summarizing
    #[serde(default = "default_model_input_chars")]
    pub model_input_chars: usize,

    /// Error replies show at most this many characters of the error
    #[serde(default = "default_error_preview_chars")]
    pub error_preview_chars: usize,

    /// Preview length of the article stored in the content field
    #[serde(default = "default_content_preview_chars")]
    pub content_preview_chars: usize,

    /// Width of a stored body block, below the store's 2000 character limit
    #[serde(default = "default_chunk_chars")]
    pub chunk_chars: usize,

    /// Timeout for webpage fetches in seconds
    #[serde(default = "default_fetch_timeout")]
    pub fetch_timeout_seconds: u64,

    /// Timeout for model and scraper calls in seconds
    #[serde(default = "default_call_timeout")]
    pub call_timeout_seconds: u64,
}

fn default_max_page_bytes() -> u64 {
    5 * 1024 * 1024
} // 5MB
fn default_forbidden_body_threshold() -> usize {
    1000
}
fn default_model_input_chars() -> usize {
    10_000
}
fn default_error_preview_chars() -> usize {
    200
}
fn default_content_preview_chars() -> usize {
    30
}
fn default_chunk_chars() -> usize {
    1900
}
fn default_fetch_timeout() -> u64 {
    30
}
fn default_call_timeout() -> u64 {
    300
} // 5 min, multimodal calls are slow

impl Default for IngestLimits {
    fn default() -> Self {
        Self {
            max_page_bytes: default_max_page_bytes(),
            forbidden_body_threshold: default_forbidden_body_threshold(),
            model_input_chars: default_model_input_chars(),
            error_preview_chars: default_error_preview_chars(),
            content_preview_chars: default_content_preview_chars(),
            chunk_chars: default_chunk_chars(),
            fetch_timeout_seconds: default_fetch_timeout(),
            call_timeout_seconds: default_call_timeout(),
        }
    }
}

impl IngestLimits {
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_seconds)
    }

    pub fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.call_timeout_seconds)
    }

    /// Whether a declared or running byte count is over the ceiling
    pub fn exceeds_page_limit(&self, bytes: u64) -> bool {
        bytes > self.max_page_bytes
    }
}
