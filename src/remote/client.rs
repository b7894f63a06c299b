//! HTTP fetcher
//!
//! Async reqwest client used to execute previews.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, Response};
use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::config::ApiConfig;
use crate::core::fetch::{FetchError, HttpFetcher};

/// reqwest-backed [`HttpFetcher`]
#[derive(Debug, Clone)]
pub struct ReqwestFetcher {
    client: Client,
}

impl ReqwestFetcher {
    /// Create a fetcher from the `[api]` config section
    pub fn from_config(config: &ApiConfig) -> Result<Self> {
        Self::new(config.timeout_secs)
    }

    /// Create a fetcher with an explicit timeout
    pub fn new(timeout_secs: u64) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent(concat!("apiscope/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client })
    }

    fn parse(url: &str) -> Result<Url, FetchError> {
        Url::parse(url).map_err(|e| FetchError::InvalidUrl {
            url: url.to_string(),
            reason: e.to_string(),
        })
    }

    /// Send a GET and reject non-2xx answers
    async fn get(&self, url: &str) -> Result<Response, FetchError> {
        let url = Self::parse(url)?;
        debug!(url = %url, "GET");

        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
            });
        }
        Ok(resp)
    }
}

#[async_trait]
impl HttpFetcher for ReqwestFetcher {
    async fn fetch_json(&self, url: &str) -> Result<Value, FetchError> {
        self.get(url)
            .await?
            .json()
            .await
            .map_err(|e| FetchError::Body(e.to_string()))
    }

    async fn fetch_blob(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let bytes = self
            .get(url)
            .await?
            .bytes()
            .await
            .map_err(|e| FetchError::Body(e.to_string()))?;
        Ok(bytes.to_vec())
    }
}
