//! Google Drive object storage.
//!
//! Uses a long-lived refresh token (obtained once, outside this crate) to
//! mint an access token per upload, then: media upload, rename into the
//! target folder, grant anyone-with-link read access.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use super::ObjectStorage;

const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const UPLOAD_URL: &str = "https://www.googleapis.com/upload/drive/v3/files";
const FILES_URL: &str = "https://www.googleapis.com/drive/v3/files";

/// OAuth client credentials plus refresh token
#[derive(Debug, Clone)]
pub struct DriveCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: String,
}

/// Drive-backed [`ObjectStorage`]
pub struct GoogleDriveStorage {
    credentials: DriveCredentials,
    folder_id: Option<String>,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct FileResponse {
    id: String,
}

/// Public URL for a file id
pub fn public_url(file_id: &str) -> String {
    format!("https://drive.google.com/uc?export=view&id={}", file_id)
}

impl GoogleDriveStorage {
    pub fn new(credentials: DriveCredentials, folder_id: Option<String>) -> Self {
        Self {
            credentials,
            folder_id,
            client: reqwest::Client::new(),
        }
    }

    async fn access_token(&self) -> Result<String> {
        let response = self
            .client
            .post(TOKEN_URL)
            .form(&[
                ("client_id", self.credentials.client_id.as_str()),
                ("client_secret", self.credentials.client_secret.as_str()),
                ("refresh_token", self.credentials.refresh_token.as_str()),
                ("grant_type", "refresh_token"),
            ])
            .send()
            .await
            .context("Failed to request Google access token")?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            anyhow::bail!("Google token error ({}): {}", status, text.trim());
        }

        let token: TokenResponse = response
            .json()
            .await
            .context("Failed to parse Google token response")?;
        Ok(token.access_token)
    }

    async fn check(response: reqwest::Response, what: &str) -> Result<reqwest::Response> {
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            anyhow::bail!("Drive {} failed ({}): {}", what, status, text.trim());
        }
        Ok(response)
    }
}

#[async_trait]
impl ObjectStorage for GoogleDriveStorage {
    async fn upload(&self, bytes: Vec<u8>, file_name: &str, mime: &str) -> Result<String> {
        let token = self.access_token().await?;
        let size = bytes.len();

        let response = self
            .client
            .post(format!("{}?uploadType=media", UPLOAD_URL))
            .bearer_auth(&token)
            .header(reqwest::header::CONTENT_TYPE, mime)
            .body(bytes)
            .send()
            .await
            .context("Failed to upload to Drive")?;
        let file: FileResponse = Self::check(response, "upload")
            .await?
            .json()
            .await
            .context("Failed to parse Drive upload response")?;

        let mut rename = self
            .client
            .patch(format!("{}/{}", FILES_URL, file.id))
            .bearer_auth(&token)
            .json(&json!({ "name": file_name }));
        if let Some(ref folder) = self.folder_id {
            rename = rename.query(&[("addParents", folder.as_str())]);
        }
        let response = rename.send().await.context("Failed to rename Drive file")?;
        Self::check(response, "rename").await?;

        let response = self
            .client
            .post(format!("{}/{}/permissions", FILES_URL, file.id))
            .bearer_auth(&token)
            .json(&json!({ "role": "reader", "type": "anyone" }))
            .send()
            .await
            .context("Failed to share Drive file")?;
        Self::check(response, "permission").await?;

        debug!(file_id = %file.id, size, file_name, "Uploaded to Drive");
        Ok(public_url(&file.id))
    }
}
