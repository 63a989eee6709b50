//! Test doubles for the collaborator traits.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde_json::Value;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use notebridge::adapters::{
    AllowList, ChatMessage, GeneratedImage, ImageGenerator, LanguageModel, NoteStore,
    ObjectStorage, ScrapeService,
};
use notebridge::core::{Capabilities, OrchestratorBuilder};
use notebridge::{Note, Orchestrator};

/// One recorded model call
#[derive(Debug, Clone)]
pub struct ModelCall {
    pub model: String,
    pub text: String,
    pub has_media: bool,
}

/// Language model replaying scripted replies in order
#[derive(Default)]
pub struct ScriptedModel {
    replies: Mutex<VecDeque<Result<String, String>>>,
    calls: Mutex<Vec<ModelCall>>,
}

impl ScriptedModel {
    pub fn new<I, S>(replies: I) -> Arc<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Arc::new(Self {
            replies: Mutex::new(replies.into_iter().map(|r| Ok(r.into())).collect()),
            calls: Mutex::new(Vec::new()),
        })
    }

    /// Replies where `Err` entries make that call fail
    pub fn with_results<I>(replies: I) -> Arc<Self>
    where
        I: IntoIterator<Item = Result<&'static str, &'static str>>,
    {
        Arc::new(Self {
            replies: Mutex::new(
                replies
                    .into_iter()
                    .map(|r| r.map(str::to_string).map_err(str::to_string))
                    .collect(),
            ),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn failing(message: &str) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(VecDeque::from([Err(message.to_string())])),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> Vec<ModelCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl LanguageModel for ScriptedModel {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, model: &str, messages: &[ChatMessage]) -> Result<String> {
        let message = messages.first().ok_or_else(|| anyhow!("no messages"))?;
        self.calls.lock().unwrap().push(ModelCall {
            model: model.to_string(),
            text: message.text_content(),
            has_media: message.has_media(),
        });

        match self.replies.lock().unwrap().pop_front() {
            Some(Ok(reply)) => Ok(reply),
            Some(Err(e)) => Err(anyhow!(e)),
            None => Err(anyhow!("no scripted reply left")),
        }
    }
}

/// Note store keeping every note in memory
#[derive(Default)]
pub struct RecordingStore {
    notes: Mutex<Vec<Note>>,
    fail: bool,
}

impl RecordingStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            notes: Mutex::new(Vec::new()),
            fail: true,
        })
    }

    pub fn notes(&self) -> Vec<Note> {
        self.notes.lock().unwrap().clone()
    }
}

#[async_trait]
impl NoteStore for RecordingStore {
    async fn create(&self, note: &Note) -> Result<String> {
        if self.fail {
            return Err(anyhow!("database is read-only"));
        }
        let mut notes = self.notes.lock().unwrap();
        notes.push(note.clone());
        Ok(format!("page-{}", notes.len()))
    }
}

/// One recorded upload
#[derive(Debug, Clone)]
pub struct Upload {
    pub file_name: String,
    pub mime: String,
    pub bytes: usize,
}

/// Object storage returning predictable URLs
#[derive(Default)]
pub struct MemoryStorage {
    uploads: Mutex<Vec<Upload>>,
}

impl MemoryStorage {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn uploads(&self) -> Vec<Upload> {
        self.uploads.lock().unwrap().clone()
    }
}

#[async_trait]
impl ObjectStorage for MemoryStorage {
    async fn upload(&self, bytes: Vec<u8>, file_name: &str, mime: &str) -> Result<String> {
        self.uploads.lock().unwrap().push(Upload {
            file_name: file_name.to_string(),
            mime: mime.to_string(),
            bytes: bytes.len(),
        });
        Ok(format!("https://storage.test/{}", file_name))
    }
}

/// Image generator that always succeeds
pub struct StaticImageGenerator;

#[async_trait]
impl ImageGenerator for StaticImageGenerator {
    async fn generate(&self, _model: &str, _prompt: &str) -> Result<GeneratedImage> {
        Ok(GeneratedImage {
            bytes: vec![0x89, b'P', b'N', b'G'],
            mime: "image/png".to_string(),
        })
    }
}

/// Image generator that always fails
pub struct FailingImageGenerator;

pub const GENERATOR_ERROR: &str = "GPU quota exhausted";

#[async_trait]
impl ImageGenerator for FailingImageGenerator {
    async fn generate(&self, _model: &str, _prompt: &str) -> Result<GeneratedImage> {
        Err(anyhow!(GENERATOR_ERROR))
    }
}

/// Scraper returning fixed items
pub struct FakeScraper {
    items: Vec<Value>,
    actors: Mutex<Vec<String>>,
}

impl FakeScraper {
    pub fn new(items: Vec<Value>) -> Arc<Self> {
        Arc::new(Self {
            items,
            actors: Mutex::new(Vec::new()),
        })
    }

    pub fn actors(&self) -> Vec<String> {
        self.actors.lock().unwrap().clone()
    }
}

#[async_trait]
impl ScrapeService for FakeScraper {
    async fn run_actor(&self, actor: &str, _start_urls: &[String], _limit: u32) -> Result<Vec<Value>> {
        self.actors.lock().unwrap().push(actor.to_string());
        Ok(self.items.clone())
    }
}

pub const SENDER: &str = "U-allowed";

/// Builder with an allow-list holding [`SENDER`]
pub fn builder(model: Arc<ScriptedModel>, store: Arc<RecordingStore>) -> OrchestratorBuilder {
    Orchestrator::builder()
        .model(model)
        .store(store)
        .authorizer(Arc::new(AllowList::new([SENDER])))
        .capabilities(Capabilities::default())
}

/// Fenced JSON summary reply
pub fn summary_reply(title: &str, summary: &str) -> String {
    format!(
        "```json\n{}\n```",
        serde_json::json!({ "title": title, "summary": summary })
    )
}

/// Serve `response` to the first connection and return the URL
pub async fn serve_once(response: Vec<u8>) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        if let Ok((mut socket, _)) = listener.accept().await {
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            loop {
                let n = socket.read(&mut buf).await.unwrap_or(0);
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
                if request_complete(&request) {
                    break;
                }
            }
            // The client may hang up early on oversize bodies
            let _ = socket.write_all(&response).await;
            let _ = socket.shutdown().await;
        }
    });

    format!("http://{}/page", addr)
}

/// Headers received and, when declared, the whole request body too
fn request_complete(request: &[u8]) -> bool {
    let Some(end) = request.windows(4).position(|w| w == b"\r\n\r\n") else {
        return false;
    };
    let head = String::from_utf8_lossy(&request[..end]).to_ascii_lowercase();
    let body_len = head
        .lines()
        .find_map(|l| l.strip_prefix("content-length:"))
        .and_then(|v| v.trim().parse::<usize>().ok())
        .unwrap_or(0);
    request.len() >= end + 4 + body_len
}

/// Raw HTTP/1.1 response with the given status line and headers
pub fn response(status: &str, headers: &[(&str, String)], body: &[u8]) -> Vec<u8> {
    let mut raw = format!("HTTP/1.1 {}\r\nConnection: close\r\n", status);
    for (name, value) in headers {
        raw.push_str(&format!("{}: {}\r\n", name, value));
    }
    raw.push_str("\r\n");

    let mut bytes = raw.into_bytes();
    bytes.extend_from_slice(body);
    bytes
}

pub fn html_response(status: &str, body: &str) -> Vec<u8> {
    response(
        status,
        &[
            ("Content-Type", "text/html; charset=utf-8".to_string()),
            ("Content-Length", body.len().to_string()),
        ],
        body.as_bytes(),
    )
}
