//! Domain types for notebridge.
//!
//! This module contains the core data structures:
//! - InboundItem: what the chat transport delivers
//! - ExtractionResult: normalized text from a source
//! - Note: the persisted unit, and the model outputs it is built from
//! - Reply: what goes back to the sender

pub mod extraction;
pub mod inbound;
pub mod note;
pub mod reply;

// Re-export commonly used types
pub use extraction::{ExtractionResult, SourceKind};
pub use inbound::{InboundItem, InboundPayload};
pub use note::{Attachment, ImagePrompt, Note, NoteType, StyleTransformJob, TransformResult};
pub use reply::Reply;
