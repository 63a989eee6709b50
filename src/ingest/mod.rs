//! Extraction and normalization of inbound content.
//!
//! Every extractor produces an [`ExtractionResult`](crate::domain::ExtractionResult)
//! whose text has already been through the storage cleaner:
//!
//! ```text
//! URL   → webpage (encoding → main content) ┐
//! URL   → social (scraper actor)            ├→ sanitize → transform
//! audio → transcriber (raw → corrected)     ┘
//! ```

pub mod encoding;
pub mod sanitize;
pub mod script;
pub mod social;
pub mod transcriber;
pub mod webpage;

// Re-export key types
pub use encoding::{decode_body, DecodedText, EncodingSource};
pub use sanitize::{clean_bytes_for_storage, clean_for_storage, split_chunks, truncate_preview};
pub use script::is_target_script;
pub use social::{Platform, SocialActors, SocialExtractor};
pub use transcriber::{transcribe, TranscriptResult};
pub use webpage::WebpageExtractor;
