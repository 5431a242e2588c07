//! Artifact Fetcher: one retrieval attempt per call.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::error::FetchError;

/// Default request timeout for [`HttpFetcher`].
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Retrieves a JSON document for a resolved path or URL.
#[async_trait]
pub trait ArtifactSource: Send + Sync {
    /// Fetch `url` and decode the body as JSON.
    async fn fetch_json(&self, url: &str) -> Result<Value, FetchError>;
}

/// Fetch `url` from `source` and decode it into `T`.
pub async fn fetch_artifact<T, S>(source: &S, url: &str) -> Result<T, FetchError>
where
    T: DeserializeOwned,
    S: ArtifactSource + ?Sized,
{
    let value = source.fetch_json(url).await?;
    serde_json::from_value(value).map_err(|source| FetchError::Decode {
        url: url.to_string(),
        source,
    })
}

/// reqwest-backed fetcher.
///
/// Relative paths are joined onto `origin`; absolute `http(s)://` URLs are
/// fetched as given.
pub struct HttpFetcher {
    client: Client,
    origin: Option<String>,
}

impl HttpFetcher {
    pub fn new(origin: Option<String>) -> Result<Self, FetchError> {
        Self::with_timeout(origin, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(origin: Option<String>, timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::Config(e.to_string()))?;
        Ok(Self { client, origin })
    }

    /// Absolute URL for `path`.
    pub fn absolute_url(&self, path: &str) -> Result<String, FetchError> {
        if path.starts_with("http://") || path.starts_with("https://") {
            return Ok(path.to_string());
        }
        match &self.origin {
            Some(origin) => Ok(format!(
                "{}/{}",
                origin.trim_end_matches('/'),
                path.trim_start_matches('/')
            )),
            None => Err(FetchError::InvalidUrl(format!(
                "relative path '{path}' requires a configured origin"
            ))),
        }
    }
}

#[async_trait]
impl ArtifactSource for HttpFetcher {
    async fn fetch_json(&self, url: &str) -> Result<Value, FetchError> {
        let url = self.absolute_url(url)?;
        debug!(url = %url, "Fetching artifact");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|source| FetchError::Transport {
                url: url.clone(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url,
                status: status.as_u16(),
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|source| FetchError::Transport {
                url: url.clone(),
                source,
            })?;

        serde_json::from_slice(&bytes).map_err(|source| FetchError::Decode { url, source })
    }
}

/// In-memory source keyed by path. Unknown paths answer with HTTP 404.
#[derive(Debug, Default, Clone)]
pub struct StaticSource {
    documents: HashMap<String, Value>,
}

impl StaticSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document(mut self, path: impl Into<String>, document: Value) -> Self {
        self.documents.insert(path.into(), document);
        self
    }
}

#[async_trait]
impl ArtifactSource for StaticSource {
    async fn fetch_json(&self, url: &str) -> Result<Value, FetchError> {
        self.documents
            .get(url)
            .cloned()
            .ok_or_else(|| FetchError::Status {
                url: url.to_string(),
                status: 404,
            })
    }
}
