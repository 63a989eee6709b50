//! Apify client for synchronous actor runs.
//!
//! Endpoint: POST /v2/acts/{actor}/run-sync-get-dataset-items
//! Auth: Bearer token

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::time::Duration;

use super::ScrapeService;

const APIFY_API_BASE: &str = "https://api.apify.com/v2";

/// Apify API client
pub struct ApifyClient {
    token: String,
    base_url: String,
    client: reqwest::Client,
}

/// Actor input for a single-URL scrape
pub fn actor_input(start_urls: &[String], limit: u32) -> Value {
    let urls: Vec<Value> = start_urls.iter().map(|u| json!({ "url": u })).collect();
    json!({
        "startUrls": urls,
        "resultsLimit": limit,
        "maxItems": limit,
    })
}

impl ApifyClient {
    pub fn new(token: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build Apify HTTP client")?;

        Ok(Self {
            token: token.into(),
            base_url: APIFY_API_BASE.to_string(),
            client,
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn run_url(&self, actor: &str) -> String {
        // Actor ids use `~` in URLs instead of `/`
        format!(
            "{}/acts/{}/run-sync-get-dataset-items",
            self.base_url,
            actor.replace('/', "~")
        )
    }
}

#[async_trait]
impl ScrapeService for ApifyClient {
    async fn run_actor(&self, actor: &str, start_urls: &[String], limit: u32) -> Result<Vec<Value>> {
        let response = self
            .client
            .post(self.run_url(actor))
            .bearer_auth(&self.token)
            .json(&actor_input(start_urls, limit))
            .send()
            .await
            .with_context(|| format!("Failed to run Apify actor '{}'", actor))?;

        // 201 means the run finished and the dataset is attached
        let status = response.status();
        if status.as_u16() != 200 && status.as_u16() != 201 {
            let text = response.text().await.unwrap_or_default();
            anyhow::bail!("Apify error ({}): {}", status, text.trim());
        }

        response
            .json()
            .await
            .context("Failed to parse Apify dataset items")
    }
}
