//! Notion database client for saving notes.
//!
//! Endpoint: POST /v1/pages (then PATCH /v1/blocks/{id}/children for
//! bodies longer than one request allows)
//! Auth: Bearer token

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::debug;

use crate::domain::Note;
use crate::ingest::sanitize::split_chunks;

use super::NoteStore;

const NOTION_API_BASE: &str = "https://api.notion.com/v1";
const NOTION_VERSION: &str = "2022-06-28";

/// Characters per rich text object
pub const RICH_TEXT_LIMIT: usize = 2000;

/// Default body block width, kept below the rich text limit
pub const BODY_CHUNK_CHARS: usize = 1900;

/// Children accepted per request
const MAX_CHILDREN_PER_REQUEST: usize = 100;

/// Notion client bound to one database
pub struct NotionClient {
    token: String,
    database_id: String,
    chunk_chars: usize,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct PageResponse {
    id: String,
}

fn rich_text(text: &str) -> Value {
    let parts: Vec<Value> = split_chunks(text, RICH_TEXT_LIMIT)
        .into_iter()
        .map(|chunk| json!({ "type": "text", "text": { "content": chunk } }))
        .collect();
    Value::Array(parts)
}

/// Page properties for a note
pub fn note_properties(note: &Note) -> Map<String, Value> {
    let mut props = Map::new();
    props.insert("Name".into(), json!({ "title": rich_text(&note.title) }));
    props.insert("Content".into(), json!({ "rich_text": rich_text(&note.content) }));
    props.insert("Summary".into(), json!({ "rich_text": rich_text(&note.summary) }));
    props.insert(
        "Date".into(),
        json!({ "date": { "start": note.date.format("%Y-%m-%d").to_string() } }),
    );
    props.insert("Type".into(), json!({ "select": { "name": note.note_type.label() } }));
    props.insert("Author".into(), json!({ "rich_text": rich_text(&note.author_id) }));

    if let Some(ref url) = note.source_url {
        props.insert("URL".into(), json!({ "url": url }));
    }

    if !note.attachments.is_empty() {
        let files: Vec<Value> = note
            .attachments
            .iter()
            .map(|a| json!({ "name": a.name, "type": "external", "external": { "url": a.url } }))
            .collect();
        props.insert("Attachments".into(), json!({ "files": files }));
    }

    props
}

/// Paragraph blocks for the note body, in order, each at most `width` characters
pub fn body_blocks(note: &Note, width: usize) -> Vec<Value> {
    note.body_chunks(width)
        .into_iter()
        .map(|chunk| {
            json!({
                "object": "block",
                "type": "paragraph",
                "paragraph": {
                    "rich_text": [{ "type": "text", "text": { "content": chunk } }]
                }
            })
        })
        .collect()
}

impl NotionClient {
    pub fn new(token: impl Into<String>, database_id: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            database_id: database_id.into(),
            chunk_chars: BODY_CHUNK_CHARS,
            client: reqwest::Client::new(),
        }
    }

    /// Body block width; clamped to the rich text limit
    pub fn with_chunk_chars(mut self, chunk_chars: usize) -> Self {
        self.chunk_chars = chunk_chars.clamp(1, RICH_TEXT_LIMIT);
        self
    }

    pub fn chunk_chars(&self) -> usize {
        self.chunk_chars
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<reqwest::Response> {
        let response = request
            .bearer_auth(&self.token)
            .header("Notion-Version", NOTION_VERSION)
            .send()
            .await
            .context("Failed to send Notion request")?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            anyhow::bail!("Notion error ({}): {}", status, text.trim());
        }

        Ok(response)
    }

    async fn append_children(&self, page_id: &str, blocks: &[Value]) -> Result<()> {
        let url = format!("{}/blocks/{}/children", NOTION_API_BASE, page_id);
        self.send(self.client.patch(&url).json(&json!({ "children": blocks })))
            .await
            .context("Failed to append note body")?;
        Ok(())
    }
}

#[async_trait]
impl NoteStore for NotionClient {
    async fn create(&self, note: &Note) -> Result<String> {
        let blocks = body_blocks(note, self.chunk_chars);
        let (first, rest) = blocks.split_at(blocks.len().min(MAX_CHILDREN_PER_REQUEST));

        let mut page = json!({
            "parent": { "database_id": self.database_id },
            "properties": note_properties(note),
        });
        if !first.is_empty() {
            page["children"] = Value::Array(first.to_vec());
        }

        let url = format!("{}/pages", NOTION_API_BASE);
        let created: PageResponse = self
            .send(self.client.post(&url).json(&page))
            .await?
            .json()
            .await
            .context("Failed to parse Notion response")?;

        for batch in rest.chunks(MAX_CHILDREN_PER_REQUEST) {
            self.append_children(&created.id, batch).await?;
        }

        debug!(page_id = %created.id, blocks = blocks.len(), "Saved note");
        Ok(created.id)
    }
}
