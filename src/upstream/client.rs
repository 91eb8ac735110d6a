//! HTTP client for the upstream product source.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use url::Url;

use crate::config::UpstreamConfig;
use crate::upstream::types::{ProductsEnvelope, UpstreamError, UpstreamPayload};

/// A source of records for a cache key.
///
/// The gateway talks to exactly one of these. Implementations report every
/// kind of failure as an [`UpstreamError`]; the fetcher decides what to do.
#[async_trait]
pub trait UpstreamSource: Send + Sync {
    /// Perform one attempt. No retries, no caching.
    async fn fetch_records(&self, key: &str) -> Result<UpstreamPayload, UpstreamError>;

    /// Human-readable origin, reported alongside validation results.
    fn describe(&self) -> String;
}

/// `GET <url>` returning `{"products": [...]}`.
#[derive(Debug, Clone)]
pub struct HttpUpstream {
    client: Client,
    url: Url,
}

impl HttpUpstream {
    pub fn new(url: Url, connect_timeout: Duration) -> Result<Self, UpstreamError> {
        let client = Client::builder()
            .connect_timeout(connect_timeout)
            .user_agent(concat!("catalog-gateway/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| UpstreamError::Transport(e.to_string()))?;

        Ok(Self { client, url })
    }

    pub fn from_config(config: &UpstreamConfig) -> Result<Self, UpstreamError> {
        let url = Url::parse(&config.url).map_err(|e| UpstreamError::Transport(e.to_string()))?;
        Self::new(url, config.timeout())
    }

    pub fn url(&self) -> &Url {
        &self.url
    }
}

#[async_trait]
impl UpstreamSource for HttpUpstream {
    async fn fetch_records(&self, key: &str) -> Result<UpstreamPayload, UpstreamError> {
        tracing::debug!(url = %self.url, key, "Requesting upstream");

        let response = self
            .client
            .get(self.url.clone())
            .send()
            .await
            .map_err(|e| UpstreamError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(UpstreamError::Status(status.as_u16()));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| UpstreamError::Transport(e.to_string()))?;
        let envelope: ProductsEnvelope =
            serde_json::from_slice(&body).map_err(|e| UpstreamError::Decode(e.to_string()))?;

        Ok(UpstreamPayload {
            status: status.as_u16(),
            records: envelope.products,
        })
    }

    fn describe(&self) -> String {
        self.url.to_string()
    }
}
