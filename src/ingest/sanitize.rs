//! Text sanitation for previews and for the size-limited note store.

use crate::domain::{ExtractionResult, SourceKind};

/// Collapse whitespace runs and cut to `max_chars` characters, appending
/// `......` when anything was cut.
pub fn truncate_preview(text: &str, max_chars: usize) -> String {
    let clean = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if clean.chars().count() <= max_chars {
        return clean;
    }

    let mut cut: String = clean.chars().take(max_chars).collect();
    cut.push_str("......");
    cut
}

/// Split text into fixed-width character windows.
///
/// Every chunk except possibly the last holds exactly `width` characters and
/// concatenating the chunks gives back `text`. Empty input yields no chunks.
pub fn split_chunks(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut count = 0;

    for ch in text.chars() {
        current.push(ch);
        count += 1;
        if count == width {
            chunks.push(std::mem::take(&mut current));
            count = 0;
        }
    }

    if !current.is_empty() {
        chunks.push(current);
    }

    chunks
}

/// Strip NUL and other control characters, keeping newline, tab and
/// carriage return.
pub fn clean_for_storage(text: &str) -> String {
    text.chars()
        .filter(|c| !c.is_control() || matches!(c, '\n' | '\t' | '\r'))
        .collect()
}

/// Lossy UTF-8 round trip followed by [`clean_for_storage`].
///
/// Invalid sequences become U+FFFD instead of failing, so the result is
/// always safe to hand to the store.
pub fn clean_bytes_for_storage(bytes: &[u8]) -> String {
    clean_for_storage(&String::from_utf8_lossy(bytes))
}

/// Extraction for text the sender typed directly into the chat
pub fn direct_text(text: &str) -> ExtractionResult {
    let content = clean_bytes_for_storage(text.trim().as_bytes());
    ExtractionResult::new(None, content, SourceKind::DirectText)
}
