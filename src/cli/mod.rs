//! Command-line interface for notebridge.
//!
//! Acts as a local chat transport: each subcommand builds one inbound item,
//! hands it to the orchestrator and prints the single reply.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};

use crate::adapters::{AllowList, ApifyClient, GoogleDriveStorage, NotionClient, OpenRouterClient};
use crate::config::{self, ResolvedConfig};
use crate::core::Orchestrator;
use crate::domain::{InboundItem, InboundPayload};
use crate::ingest::{truncate_preview, WebpageExtractor};

/// notebridge - Chat-to-notes ingestion pipeline
#[derive(Parser, Debug)]
#[command(name = "notebridge")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Send a text message (use "/a <article>" to summarize an article)
    Text {
        /// Message text
        message: String,

        /// Sender id checked against the allow-list
        #[arg(short, long, env = "NOTEBRIDGE_SENDER", default_value = "local")]
        sender: String,
    },

    /// Send a link to a webpage or social post
    Url {
        url: String,

        #[arg(short, long, env = "NOTEBRIDGE_SENDER", default_value = "local")]
        sender: String,
    },

    /// Send a voice clip
    Audio {
        /// Audio file
        file: PathBuf,

        /// MIME type (guessed from the extension if not specified)
        #[arg(long)]
        mime: Option<String>,

        #[arg(short, long, env = "NOTEBRIDGE_SENDER", default_value = "local")]
        sender: String,
    },

    /// Send an image
    Image {
        /// Image file
        file: PathBuf,

        /// MIME type (guessed from the extension if not specified)
        #[arg(long)]
        mime: Option<String>,

        #[arg(short, long, env = "NOTEBRIDGE_SENDER", default_value = "local")]
        sender: String,
    },

    /// Run only the webpage extractor and print what it found
    Fetch {
        url: String,

        /// Print the full text instead of a preview
        #[arg(short, long)]
        full: bool,
    },

    /// Show resolved configuration (secrets redacted)
    Config,
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(self) -> Result<()> {
        match self.command {
            Commands::Text { message, sender } => {
                send(InboundItem::new(sender, InboundPayload::TextCommand(message))).await
            }
            Commands::Url { url, sender } => {
                send(InboundItem::new(sender, InboundPayload::UrlReference(url))).await
            }
            Commands::Audio { file, mime, sender } => {
                let bytes = read_file(&file).await?;
                let mime = mime.unwrap_or_else(|| guess_mime(&file, MediaKind::Audio).to_string());
                send(InboundItem::new(sender, InboundPayload::Audio { bytes, mime })).await
            }
            Commands::Image { file, mime, sender } => {
                let bytes = read_file(&file).await?;
                let mime = mime.unwrap_or_else(|| guess_mime(&file, MediaKind::Image).to_string());
                let file_name = file
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| "image".to_string());
                send(InboundItem::new(
                    sender,
                    InboundPayload::Image {
                        bytes,
                        mime,
                        file_name,
                    },
                ))
                .await
            }
            Commands::Fetch { url, full } => fetch(&url, full).await,
            Commands::Config => show_config(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Audio,
    Image,
}

/// MIME type from a file extension, with a per-kind default
pub fn guess_mime(path: &Path, kind: MediaKind) -> &'static str {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();

    match (kind, ext.as_str()) {
        (MediaKind::Audio, "mp3") => "audio/mpeg",
        (MediaKind::Audio, "wav") => "audio/wav",
        (MediaKind::Audio, "ogg" | "oga") => "audio/ogg",
        (MediaKind::Audio, "aac") => "audio/aac",
        (MediaKind::Audio, _) => "audio/mp4",
        (MediaKind::Image, "png") => "image/png",
        (MediaKind::Image, "webp") => "image/webp",
        (MediaKind::Image, "gif") => "image/gif",
        (MediaKind::Image, _) => "image/jpeg",
    }
}

async fn read_file(path: &Path) -> Result<Vec<u8>> {
    tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read file: {}", path.display()))
}

/// Wire collaborators from configuration
pub fn build_orchestrator(cfg: &ResolvedConfig) -> Result<Orchestrator> {
    let secrets = &cfg.secrets;

    let api_key = secrets
        .openrouter_api_key
        .clone()
        .context("OPENROUTER_API_KEY is not set")?;
    let notion_token = secrets
        .notion_token
        .clone()
        .context("NOTION_TOKEN is not set")?;
    let database_id = secrets
        .notion_database_id
        .clone()
        .context("NOTION_DATABASE_ID is not set")?;

    let openrouter = Arc::new(OpenRouterClient::new(api_key, cfg.limits.call_timeout())?);

    let allow_list = AllowList::new(cfg.allowed_senders.iter().cloned());
    if cfg.capabilities.authorization {
        if allow_list.is_empty() {
            warn!("Authorization is enabled with an empty allow-list; every sender will be rejected");
        } else {
            info!(senders = allow_list.len(), "Authorization enabled");
        }
    }

    let notion =
        NotionClient::new(notion_token, database_id).with_chunk_chars(cfg.limits.chunk_chars);

    let mut builder = Orchestrator::builder()
        .model(openrouter.clone())
        .image_generator(openrouter)
        .store(Arc::new(notion))
        .authorizer(Arc::new(allow_list))
        .capabilities(cfg.capabilities)
        .limits(cfg.limits.clone())
        .text_model(&cfg.text_model)
        .image_model(&cfg.image_model)
        .social_actors(cfg.social.clone());

    if let Some(ref token) = secrets.apify_token {
        builder = builder.scraper(Arc::new(ApifyClient::new(
            token.clone(),
            cfg.limits.call_timeout(),
        )?));
    }

    if let Some(credentials) = secrets.drive_credentials() {
        builder = builder.storage(Arc::new(GoogleDriveStorage::new(
            credentials,
            cfg.folder_id.clone(),
        )));
    }

    builder.build()
}

/// Hand one item to the orchestrator and print the reply
async fn send(item: InboundItem) -> Result<()> {
    let cfg = config::load_config()?;
    let orchestrator = build_orchestrator(&cfg)?;

    let outcome = orchestrator.handle(item).await;

    println!("{}", outcome.reply);
    if let Some(record_id) = outcome.record_id {
        info!(%record_id, "Record created");
    }

    Ok(())
}

/// Extract a webpage without calling any model
async fn fetch(url: &str, full: bool) -> Result<()> {
    let cfg = config::load_config()?;
    let extractor = WebpageExtractor::new(cfg.limits.clone())?;

    let result = extractor.extract(url).await?;

    println!("Title:  {}", result.title.as_deref().unwrap_or("-"));
    println!("Source: {}", result.source_kind);
    println!("Chars:  {}", result.content.chars().count());
    println!();
    if full {
        println!("{}", result.content);
    } else {
        println!("{}", truncate_preview(&result.content, 500));
    }

    Ok(())
}

/// Show resolved configuration
fn show_config() -> Result<()> {
    let cfg = config::load_config()?;

    let rendered =
        serde_yaml::to_string(&cfg.redacted()).context("Failed to render configuration")?;

    println!("notebridge configuration");
    println!();
    print!("{}", rendered);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guess_mime() {
        assert_eq!(guess_mime(Path::new("memo.M4A"), MediaKind::Audio), "audio/mp4");
        assert_eq!(guess_mime(Path::new("a.mp3"), MediaKind::Audio), "audio/mpeg");
        assert_eq!(guess_mime(Path::new("photo.PNG"), MediaKind::Image), "image/png");
        assert_eq!(guess_mime(Path::new("noext"), MediaKind::Image), "image/jpeg");
    }

    #[test]
    fn test_parse_text_command() {
        let cli = Cli::try_parse_from(["notebridge", "text", "/a hello", "--sender", "U1"]).unwrap();
        match cli.command {
            Commands::Text { message, sender } => {
                assert_eq!(message, "/a hello");
                assert_eq!(sender, "U1");
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_build_requires_model_key() {
        let cfg = config::resolve(None, config::ConfigFile::default(), |_| None);
        let err = build_orchestrator(&cfg).err().unwrap();
        assert!(err.to_string().contains("OPENROUTER_API_KEY"));
    }
}
