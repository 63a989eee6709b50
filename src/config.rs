//! Configuration for notebridge.
//!
//! Configuration sources (highest priority first):
//! 1. Environment variables (a `.env` file is loaded by the binary)
//! 2. Config file (.notebridge/config.yaml)
//! 3. Defaults
//!
//! Config file discovery:
//! - Searches current directory and parents for .notebridge/config.yaml
//! - Falls back to ~/.notebridge/config.yaml
//!
//! Secrets are never read from the config file, only from the environment.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::adapters::DriveCredentials;
use crate::core::dispatch::Capabilities;
use crate::core::limits::IngestLimits;
use crate::core::orchestrator::{DEFAULT_IMAGE_MODEL, DEFAULT_TEXT_MODEL};
use crate::ingest::SocialActors;

const CONFIG_DIR: &str = ".notebridge";
const CONFIG_NAME: &str = "config.yaml";

/// Raw config file schema (matches YAML structure)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub capabilities: Capabilities,
    #[serde(default)]
    pub allowed_senders: Vec<String>,
    #[serde(default)]
    pub models: ModelsConfig,
    #[serde(default)]
    pub limits: IngestLimits,
    #[serde(default)]
    pub social: SocialActors,
    #[serde(default)]
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ModelsConfig {
    pub text: Option<String>,
    pub image_generation: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StorageConfig {
    /// Drive folder receiving uploads
    pub folder_id: Option<String>,
}

/// Credentials read from the environment
#[derive(Debug, Clone, Default)]
pub struct Secrets {
    pub openrouter_api_key: Option<String>,
    pub notion_token: Option<String>,
    pub notion_database_id: Option<String>,
    pub apify_token: Option<String>,
    pub google_client_id: Option<String>,
    pub google_client_secret: Option<String>,
    pub google_refresh_token: Option<String>,
}

impl Secrets {
    /// Drive credentials, when all three parts are set
    pub fn drive_credentials(&self) -> Option<DriveCredentials> {
        Some(DriveCredentials {
            client_id: self.google_client_id.clone()?,
            client_secret: self.google_client_secret.clone()?,
            refresh_token: self.google_refresh_token.clone()?,
        })
    }
}

/// Fully resolved configuration
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// Path to config file (if found)
    pub config_file: Option<PathBuf>,
    pub capabilities: Capabilities,
    pub allowed_senders: Vec<String>,
    pub text_model: String,
    pub image_model: String,
    pub limits: IngestLimits,
    pub social: SocialActors,
    pub folder_id: Option<String>,
    pub secrets: Secrets,
}

/// Printable view with secrets reduced to set/unset
#[derive(Debug, Serialize)]
pub struct RedactedConfig<'a> {
    pub config_file: Option<String>,
    pub capabilities: &'a Capabilities,
    pub allowed_senders: usize,
    pub text_model: &'a str,
    pub image_model: &'a str,
    pub limits: &'a IngestLimits,
    pub social: &'a SocialActors,
    pub folder_id: Option<&'a str>,
    pub secrets: Vec<(&'static str, &'static str)>,
}

fn presence(value: &Option<String>) -> &'static str {
    if value.is_some() {
        "set"
    } else {
        "unset"
    }
}

impl ResolvedConfig {
    pub fn redacted(&self) -> RedactedConfig<'_> {
        let s = &self.secrets;
        RedactedConfig {
            config_file: self.config_file.as_ref().map(|p| p.display().to_string()),
            capabilities: &self.capabilities,
            allowed_senders: self.allowed_senders.len(),
            text_model: &self.text_model,
            image_model: &self.image_model,
            limits: &self.limits,
            social: &self.social,
            folder_id: self.folder_id.as_deref(),
            secrets: vec![
                ("OPENROUTER_API_KEY", presence(&s.openrouter_api_key)),
                ("NOTION_TOKEN", presence(&s.notion_token)),
                ("NOTION_DATABASE_ID", presence(&s.notion_database_id)),
                ("APIFY_TOKEN", presence(&s.apify_token)),
                ("GOOGLE_CLIENT_ID", presence(&s.google_client_id)),
                ("GOOGLE_CLIENT_SECRET", presence(&s.google_client_secret)),
                ("GOOGLE_REFRESH_TOKEN", presence(&s.google_refresh_token)),
            ],
        }
    }
}

/// Find config file by searching `start` and its parents
pub fn find_config_file(start: &Path) -> Option<PathBuf> {
    let mut current = start.to_path_buf();

    loop {
        let config_path = current.join(CONFIG_DIR).join(CONFIG_NAME);
        if config_path.exists() {
            return Some(config_path);
        }

        if !current.pop() {
            break;
        }
    }

    None
}

/// Load and parse config file
pub fn load_config_file(path: &Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Split a comma-separated sender list
pub fn parse_sender_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// Merge a parsed file with environment lookups
pub fn resolve(
    config_file: Option<PathBuf>,
    file: ConfigFile,
    env: impl Fn(&str) -> Option<String>,
) -> ResolvedConfig {
    let var = |name: &str| env(name).filter(|v| !v.trim().is_empty());

    let allowed_senders = var("NOTEBRIDGE_ALLOWED_SENDERS")
        .map(|raw| parse_sender_list(&raw))
        .unwrap_or(file.allowed_senders);

    let secrets = Secrets {
        openrouter_api_key: var("OPENROUTER_API_KEY"),
        notion_token: var("NOTION_TOKEN"),
        notion_database_id: var("NOTION_DATABASE_ID"),
        apify_token: var("APIFY_TOKEN"),
        google_client_id: var("GOOGLE_CLIENT_ID"),
        google_client_secret: var("GOOGLE_CLIENT_SECRET"),
        google_refresh_token: var("GOOGLE_REFRESH_TOKEN"),
    };

    ResolvedConfig {
        config_file,
        capabilities: file.capabilities,
        allowed_senders,
        text_model: file
            .models
            .text
            .unwrap_or_else(|| DEFAULT_TEXT_MODEL.to_string()),
        image_model: file
            .models
            .image_generation
            .unwrap_or_else(|| DEFAULT_IMAGE_MODEL.to_string()),
        limits: file.limits,
        social: file.social,
        folder_id: var("GOOGLE_DRIVE_FOLDER_ID").or(file.storage.folder_id),
        secrets,
    }
}

/// Load configuration from all sources
pub fn load_config() -> Result<ResolvedConfig> {
    let cwd = std::env::current_dir().context("Failed to determine current directory")?;

    let config_file = find_config_file(&cwd).or_else(|| {
        dirs::home_dir()
            .map(|home| home.join(CONFIG_DIR).join(CONFIG_NAME))
            .filter(|path| path.exists())
    });

    let file = match config_file {
        Some(ref path) => load_config_file(path)?,
        None => ConfigFile::default(),
    };

    Ok(resolve(config_file, file, |name| std::env::var(name).ok()))
}
