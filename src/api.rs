use std::time::Duration;

use reqwest::Client;
use tracing::debug;

use crate::{error::Result, models::ModelsResponse};

pub const DEFAULT_API_URL: &str = "https://www.vizion.fast";

#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    pub api_url: String,
    pub request_timeout: Duration,
}

impl ClientConfig {
    pub fn new(api_url: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into().trim_end_matches('/').to_string(),
            ..Self::default()
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.api_url, path.trim_start_matches('/'))
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            request_timeout: Duration::from_secs(10),
        }
    }
}

/// REST helpers that need no active session.
pub struct ApiClient {
    config: ClientConfig,
    client: Client,
}

impl ApiClient {
    pub fn new(config: ClientConfig) -> Result<Self> {
        let client = Client::builder().timeout(config.request_timeout).build()?;
        Ok(Self { config, client })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Lists available models and pricing.
    pub async fn models(&self) -> Result<ModelsResponse> {
        let url = self.config.endpoint("/api/v1/models");
        debug!(%url, "fetching models");
        let res = self.client.get(url).send().await?.error_for_status()?;
        Ok(res.json::<ModelsResponse>().await?)
    }
}
