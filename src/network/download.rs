// file: src/network/download.rs
// version: 2.0.0
// guid: 6329f01a-c3c1-4afc-a6e1-be47955aafed

//! Network download utilities

use crate::config::HttpSettings;
use crate::{JobError, Result};
use std::time::Duration;
use tracing::debug;

/// Fetches small text resources over HTTP
#[async_trait::async_trait]
pub trait HttpFetch: Send + Sync {
    /// GET `url` and return the body; any non-2xx status is an error
    async fn get_text(&self, url: &str) -> Result<String>;
}

/// Network downloader backed by reqwest
pub struct NetworkDownloader {
    client: reqwest::Client,
}

impl NetworkDownloader {
    /// Create a new network downloader with default settings
    pub fn new() -> Result<Self> {
        Self::with_settings(&HttpSettings::default())
    }

    /// Create a new network downloader with custom settings
    pub fn with_settings(settings: &HttpSettings) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .user_agent(settings.user_agent.clone())
            .build()
            .map_err(|e| JobError::config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client })
    }
}

#[async_trait::async_trait]
impl HttpFetch for NetworkDownloader {
    async fn get_text(&self, url: &str) -> Result<String> {
        debug!("Downloading: {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| JobError::network(format!("Failed to download file from url {}: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(JobError::network(format!(
                "Fail to download {}, statusCode={}",
                url,
                status.as_u16()
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| JobError::network(format!("Failed to read body from url {}: {}", url, e)))?;

        debug!("Downloaded {} bytes from {}", body.len(), url);
        Ok(body)
    }
}
