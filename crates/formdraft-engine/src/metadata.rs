//! Server metadata sources
//!
//! Supply the server's last-modified time once per page load.

use crate::config::{lenient_epoch, PageConfig};
use crate::error::MetadataError;
use async_trait::async_trait;
use formdraft_model::{PageIdentity, ServerMetadata};
use serde::Deserialize;

/// Endpoint queried relative to the page path
pub const LAST_MODIFIED_ENDPOINT: &str = "last-modified/";

/// Source of [`ServerMetadata`]
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MetadataSource: Send + Sync {
    /// Fetch metadata for the record behind `page`
    async fn fetch(&self, page: &PageIdentity) -> Result<ServerMetadata, MetadataError>;
}

/// Metadata the host already embedded in the page
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StaticMetadata(pub ServerMetadata);

impl StaticMetadata {
    /// Take the last-modified time from the page config
    #[inline]
    #[must_use]
    pub fn from_config(config: &PageConfig) -> Self {
        Self(ServerMetadata {
            last_modified_epoch: config.last_updated(),
        })
    }
}

#[async_trait]
impl MetadataSource for StaticMetadata {
    async fn fetch(&self, _page: &PageIdentity) -> Result<ServerMetadata, MetadataError> {
        Ok(self.0)
    }
}

#[derive(Debug, Deserialize)]
struct LastModifiedResponse {
    #[serde(default, deserialize_with = "lenient_epoch")]
    last_updated_epoch: Option<i64>,
}

/// Fetches `<page path>last-modified/` over HTTP
#[derive(Debug, Clone)]
pub struct HttpMetadataSource {
    client: reqwest::Client,
    base_url: String,
}

impl HttpMetadataSource {
    /// Create source for pages served from `base_url`
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    /// Create source with a preconfigured client
    #[must_use]
    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// URL queried for `page`
    #[must_use]
    pub fn url_for(&self, page: &PageIdentity) -> String {
        format!("{}{}", self.base_url, page.join(LAST_MODIFIED_ENDPOINT))
    }

    /// Decode a response body
    pub fn decode(body: &str) -> Result<ServerMetadata, MetadataError> {
        let response: LastModifiedResponse =
            serde_json::from_str(body).map_err(|e| MetadataError::Decode(e.to_string()))?;
        Ok(ServerMetadata {
            last_modified_epoch: response.last_updated_epoch,
        })
    }
}

#[async_trait]
impl MetadataSource for HttpMetadataSource {
    async fn fetch(&self, page: &PageIdentity) -> Result<ServerMetadata, MetadataError> {
        let url = self.url_for(page);
        tracing::debug!("Fetching server metadata from {}", url);

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(MetadataError::Status {
                url,
                status: status.as_u16(),
            });
        }
        let body = response.text().await?;
        Self::decode(&body)
    }
}
