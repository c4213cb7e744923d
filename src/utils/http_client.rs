use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

use crate::errors::{SourceError, SourceResult};

/// HTTP client abstraction used by the upstream collectors
#[async_trait]
pub trait HttpClient {
    /// Fetch URL and return the body as text
    async fn fetch_text(&self, url: &str) -> SourceResult<String>;

    /// Fetch URL and decode the body as JSON
    async fn fetch_json<T: DeserializeOwned + Send>(&self, url: &str) -> SourceResult<T>
    where
        Self: Sync,
    {
        let body = self.fetch_text(url).await?;
        serde_json::from_str(&body)
            .map_err(|e| SourceError::parse(url, format!("Failed to parse JSON: {e}")))
    }
}

/// Default implementation of HttpClient using reqwest
pub struct StandardHttpClient {
    client: Client,
}

impl StandardHttpClient {
    /// Create a client that identifies with `user_agent` and gives up on a
    /// request after `timeout`
    pub fn new(user_agent: &str, timeout: Duration) -> SourceResult<Self> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()?;

        Ok(Self { client })
    }

    fn checked(response: Response, url: &str) -> SourceResult<Response> {
        if !response.status().is_success() {
            return Err(SourceError::Http {
                status: response.status().as_u16(),
                url: url.to_string(),
            });
        }
        Ok(response)
    }
}

#[async_trait]
impl HttpClient for StandardHttpClient {
    async fn fetch_text(&self, url: &str) -> SourceResult<String> {
        debug!("Fetching content from: {}", url);

        let response = self.client.get(url).send().await?;
        let body = Self::checked(response, url)?.text().await?;
        debug!("Fetched {} bytes", body.len());
        Ok(body)
    }
}
