//! notebridge - Chat-to-notes ingestion pipeline
//!
//! Takes inbound chat content (text commands, voice clips, images and links
//! to webpages or social posts), extracts and normalizes it into plain text,
//! runs it through a sequence of language-model transforms and files one
//! structured note per item, replying exactly once.
//!
//! # Architecture
//!
//! ```text
//! InboundItem → dispatch → extractor → sanitize → transform → NoteStore
//!                                                         └→ Reply
//! ```
//!
//! Only stylized image regeneration is supplementary: when it fails the
//! original note is still saved and the reply says what was skipped.
//!
//! # Modules
//!
//! - `adapters`: External collaborators (OpenRouter, Notion, Google Drive, Apify)
//! - `core`: Dispatch, transform pipeline, orchestrator, errors and limits
//! - `domain`: Data structures (InboundItem, ExtractionResult, Note, Reply)
//! - `ingest`: Extractors, encoding recovery and text sanitizing
//! - `cli`: Command-line interface
//!
//! # Usage
//!
//! ```bash
//! # Summarize an article in Cantonese
//! notebridge text "/a 今日天氣好好" --sender U123
//!
//! # Summarize a webpage
//! notebridge url https://example.com/post
//!
//! # Transcribe a voice memo
//! notebridge audio memo.m4a
//! ```

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod ingest;

// Re-export main types at crate root for convenience
pub use core::{Capabilities, Orchestrator, OrchestratorBuilder, Outcome, PipelineError};
pub use domain::{ExtractionResult, InboundItem, InboundPayload, Note, NoteType, Reply};
