//! Character encoding resolution for fetched pages.
//!
//! Priority: `charset=` in the Content-Type header, then a charset
//! declaration embedded in the first bytes of the document, then
//! statistical detection. A decode that looks garbled is redone as lossy
//! UTF-8, which never fails.

use std::sync::LazyLock;

use chardetng::EncodingDetector;
use encoding_rs::{Encoding, REPLACEMENT, UTF_8, WINDOWS_1252};
use regex::bytes::Regex;
use tracing::debug;

/// Bytes scanned for an embedded charset declaration
pub const META_SCAN_BYTES: usize = 2048;

/// Bytes fed to statistical detection
pub const DETECT_SCAN_BYTES: usize = 10_000;

/// Decoded characters inspected for garbling
pub const PLAUSIBILITY_WINDOW: usize = 1000;

/// Suspicious characters tolerated inside the window
pub const MAX_SUSPICIOUS_CHARS: usize = 50;

static EMBEDDED_CHARSET: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)charset\s*=\s*["']?\s*([a-z0-9_\-:.]+)"#).expect("valid charset regex")
});

/// Where the chosen encoding came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodingSource {
    Header,
    Embedded,
    Detected,
    Fallback,
}

/// Decoded text plus the encoding actually used
#[derive(Debug, Clone)]
pub struct DecodedText {
    pub text: String,
    pub encoding: &'static Encoding,
    pub source: EncodingSource,
}

impl DecodedText {
    pub fn encoding_name(&self) -> &'static str {
        self.encoding.name()
    }

    pub fn fallback_used(&self) -> bool {
        self.source == EncodingSource::Fallback
    }
}

/// Resolve a label to an encoding, ignoring labels that only map to the
/// replacement decoder
fn lookup(label: &[u8]) -> Option<&'static Encoding> {
    Encoding::for_label(label.trim_ascii()).filter(|enc| *enc != REPLACEMENT)
}

/// Extract the `charset` parameter from a Content-Type header value
pub fn charset_from_content_type(content_type: &str) -> Option<&str> {
    content_type.split(';').skip(1).find_map(|param| {
        let (key, value) = param.split_once('=')?;
        if key.trim().eq_ignore_ascii_case("charset") {
            let value = value.trim().trim_matches(|c| c == '"' || c == '\'');
            (!value.is_empty()).then_some(value)
        } else {
            None
        }
    })
}

/// First charset declaration in the leading bytes of a document
pub fn embedded_charset(bytes: &[u8]) -> Option<&'static Encoding> {
    let head = &bytes[..bytes.len().min(META_SCAN_BYTES)];
    EMBEDDED_CHARSET
        .captures_iter(head)
        .filter_map(|caps| caps.get(1))
        .find_map(|m| lookup(m.as_bytes()))
}

/// Statistical guess over a bounded prefix
pub fn detect_encoding(bytes: &[u8]) -> &'static Encoding {
    if bytes.is_empty() {
        return WINDOWS_1252;
    }

    let prefix = &bytes[..bytes.len().min(DETECT_SCAN_BYTES)];
    let mut detector = EncodingDetector::new();
    detector.feed(prefix, prefix.len() == bytes.len());
    detector.guess(None, true)
}

/// Pick the encoding for a body and say where it came from
pub fn resolve_encoding(
    bytes: &[u8],
    content_type: Option<&str>,
) -> (&'static Encoding, EncodingSource) {
    if let Some(enc) = content_type
        .and_then(charset_from_content_type)
        .and_then(|label| lookup(label.as_bytes()))
    {
        return (enc, EncodingSource::Header);
    }

    if let Some(enc) = embedded_charset(bytes) {
        return (enc, EncodingSource::Embedded);
    }

    (detect_encoding(bytes), EncodingSource::Detected)
}

/// Count control and replacement characters at the start of decoded text
fn suspicious_chars(text: &str) -> usize {
    text.chars()
        .take(PLAUSIBILITY_WINDOW)
        .filter(|c| *c == '\u{FFFD}' || (c.is_control() && !matches!(c, '\n' | '\r' | '\t')))
        .count()
}

/// Whether a decode looks like the wrong encoding was used
pub fn looks_garbled(text: &str) -> bool {
    suspicious_chars(text) > MAX_SUSPICIOUS_CHARS
}

/// Decode a response body
pub fn decode_body(bytes: &[u8], content_type: Option<&str>) -> DecodedText {
    let (encoding, source) = resolve_encoding(bytes, content_type);
    let (text, had_errors) = encoding.decode_with_bom_removal(bytes);

    if looks_garbled(&text) {
        debug!(
            encoding = encoding.name(),
            had_errors, "Decoded text looks garbled, falling back to lossy UTF-8"
        );
        return DecodedText {
            text: String::from_utf8_lossy(bytes).into_owned(),
            encoding: UTF_8,
            source: EncodingSource::Fallback,
        };
    }

    DecodedText {
        text: text.into_owned(),
        encoding,
        source,
    }
}
