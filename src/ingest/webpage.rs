//! Generic webpage extraction.
//!
//! Fetches with browser-like headers, never buffers more than the configured
//! byte ceiling, gates on content type, then isolates the main content of
//! the page as one line per text block.

use anyhow::{Context, Result};
use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::StatusCode;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, info, instrument, warn};

use crate::core::error::{PipelineError, PipelineResult};
use crate::core::limits::IngestLimits;
use crate::domain::{ExtractionResult, SourceKind};

use super::encoding::decode_body;
use super::sanitize::clean_for_storage;

/// Title used when the page has none
pub const UNTITLED: &str = "無標題";

const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

/// Subtrees that never hold article text
const STRIPPED_TAGS: &[&str] = &[
    "script", "style", "noscript", "nav", "footer", "header", "aside",
];

/// Main-content candidates, in priority order
const CONTENT_SELECTORS: &[&str] = &[
    "article",
    "main",
    "[role=\"main\"]",
    ".post-content",
    ".article-content",
    ".entry-content",
    ".content",
    "#content",
];

/// Accepted page formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageFormat {
    Html,
    PlainText,
}

/// Gate a Content-Type header value
pub fn classify_content_type(content_type: Option<&str>) -> PipelineResult<PageFormat> {
    let Some(raw) = content_type else {
        return Ok(PageFormat::Html);
    };

    let mime = raw
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    match mime.as_str() {
        "" | "text/html" | "application/xhtml+xml" => Ok(PageFormat::Html),
        "text/plain" => Ok(PageFormat::PlainText),
        "application/pdf" => Err(PipelineError::PdfNotSupported),
        _ => Err(PipelineError::UnsupportedContentType {
            content_type: mime,
        }),
    }
}

/// Title and main-content lines of an HTML document
pub fn extract_html(html: &str) -> (Option<String>, String) {
    let document = Html::parse_document(html);

    let title = Selector::parse("title")
        .ok()
        .and_then(|sel| document.select(&sel).next())
        .map(|el| el.text().collect::<String>().trim().to_string())
        .filter(|t| !t.is_empty());

    let main_lines = CONTENT_SELECTORS
        .iter()
        .filter_map(|s| Selector::parse(s).ok())
        .find_map(|sel| {
            document
                .select(&sel)
                .map(block_lines)
                .find(|lines| !lines.is_empty())
        });

    let lines = match main_lines {
        Some(lines) => lines,
        None => {
            debug!("No main-content region matched, using full body");
            Selector::parse("body")
                .ok()
                .and_then(|sel| document.select(&sel).next())
                .map(block_lines)
                .unwrap_or_else(|| block_lines(document.root_element()))
        }
    };

    (title, lines.join("\n"))
}

/// Trimmed, non-empty text lines under `root`, skipping stripped subtrees
fn block_lines(root: ElementRef<'_>) -> Vec<String> {
    let mut lines = Vec::new();

    for node in root.descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };

        let hidden = node
            .ancestors()
            .take_while(|a| a.id() != root.id())
            .chain(std::iter::once(*root))
            .any(|a| {
                a.value()
                    .as_element()
                    .is_some_and(|e| STRIPPED_TAGS.contains(&e.name()))
            });
        if hidden {
            continue;
        }

        lines.extend(
            text.lines()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(str::to_string),
        );
    }

    lines
}

/// Trimmed, non-empty lines of a plain-text body
fn plain_lines(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Raw body as fetched
#[derive(Debug)]
pub struct FetchedPage {
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
    pub format: PageFormat,
    pub status: StatusCode,
}

/// Webpage extractor
pub struct WebpageExtractor {
    client: reqwest::Client,
    limits: IngestLimits,
}

impl WebpageExtractor {
    /// Create an extractor with its own HTTP client
    pub fn new(limits: IngestLimits) -> Result<Self> {
        let client = reqwest::Client::builder()
            .default_headers(browser_headers())
            .timeout(limits.fetch_timeout())
            .build()
            .context("Failed to build webpage HTTP client")?;

        Ok(Self { client, limits })
    }

    pub fn limits(&self) -> &IngestLimits {
        &self.limits
    }

    /// Fetch a page and extract its title and main text
    #[instrument(skip(self))]
    pub async fn extract(&self, url: &str) -> PipelineResult<ExtractionResult> {
        let page = self.fetch(url).await?;
        let decoded = decode_body(&page.bytes, page.content_type.as_deref());
        debug!(
            encoding = decoded.encoding_name(),
            fallback = decoded.fallback_used(),
            "Decoded page"
        );

        let (title, text) = match page.format {
            PageFormat::Html => extract_html(&decoded.text),
            PageFormat::PlainText => (None, plain_lines(&decoded.text)),
        };

        let content = clean_for_storage(&text);
        if content.trim().is_empty() {
            return Err(PipelineError::nothing_extracted(url));
        }

        let title = title
            .map(|t| clean_for_storage(&t))
            .unwrap_or_else(|| UNTITLED.to_string());

        info!(chars = content.chars().count(), %title, "Extracted webpage");

        Ok(ExtractionResult::new(Some(title), content, SourceKind::Webpage).with_url(url))
    }

    /// Bounded streaming GET
    pub async fn fetch(&self, url: &str) -> PipelineResult<FetchedPage> {
        let mut response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(PipelineError::fetch)?;

        let status = response.status();
        let forbidden = status == StatusCode::FORBIDDEN;
        if status.as_u16() >= 400 && !forbidden {
            return Err(PipelineError::FetchFailure(format!(
                "HTTP {} from {}",
                status, url
            )));
        }

        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let format = classify_content_type(content_type.as_deref())?;

        if let Some(declared) = response.content_length() {
            if self.limits.exceeds_page_limit(declared) {
                return Err(PipelineError::OversizeContent {
                    limit: self.limits.max_page_bytes,
                    actual: Some(declared),
                });
            }
        }

        let mut bytes: Vec<u8> = Vec::new();
        while let Some(chunk) = response.chunk().await.map_err(PipelineError::fetch)? {
            let total = (bytes.len() + chunk.len()) as u64;
            if self.limits.exceeds_page_limit(total) {
                return Err(PipelineError::OversizeContent {
                    limit: self.limits.max_page_bytes,
                    actual: None,
                });
            }
            bytes.extend_from_slice(&chunk);
        }

        if forbidden {
            if bytes.len() <= self.limits.forbidden_body_threshold {
                return Err(PipelineError::FetchFailure(format!(
                    "HTTP {} from {}",
                    status, url
                )));
            }
            warn!(
                bytes = bytes.len(),
                "Got 403 with a usable body, processing anyway"
            );
        }

        Ok(FetchedPage {
            bytes,
            content_type,
            format,
            status,
        })
    }
}

fn browser_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(header::USER_AGENT, HeaderValue::from_static(BROWSER_USER_AGENT));
    headers.insert(
        header::ACCEPT,
        HeaderValue::from_static(
            "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
        ),
    );
    headers.insert(
        header::ACCEPT_LANGUAGE,
        HeaderValue::from_static("zh-HK,zh-TW;q=0.9,zh;q=0.8,en;q=0.7"),
    );
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    headers.insert(
        header::UPGRADE_INSECURE_REQUESTS,
        HeaderValue::from_static("1"),
    );
    headers
}
