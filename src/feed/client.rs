use crate::feed::types::{Article, ProviderResponse};
use crate::util::{validate_endpoint, UrlValidationError};
use futures::StreamExt;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Default translation endpoint (RSS in, JSON out).
pub const DEFAULT_ENDPOINT: &str = "https://api.rss2json.com/v1/api.json";

/// Default upstream syndication feed.
pub const DEFAULT_FEED_URL: &str = "https://www.cnbc.com/id/100727362/device/rss/rss.html";

const MAX_RESPONSE_SIZE: usize = 5 * 1024 * 1024; // 5MB

/// Errors that can occur while fetching a batch from the provider.
///
/// Every variant is recoverable: the caller keeps its previous articles and
/// clears the loading flag.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network-level error (DNS, connection, TLS, etc.)
    #[error("Request failed: {0}")]
    Network(#[from] reqwest::Error),
    /// HTTP response with non-2xx status code
    #[error("HTTP error: status {0}")]
    HttpStatus(u16),
    /// Request exceeded the configured timeout
    #[error("Request timed out")]
    Timeout,
    /// Body was not the JSON shape the provider documents
    #[error("Parse error: {0}")]
    Parse(String),
    /// Provider answered with `status != "ok"`
    #[error("Provider error: {0}")]
    Provider(String),
    /// Response body exceeded the 5MB size limit
    #[error("Response too large")]
    ResponseTooLarge,
}

/// HTTP client for the RSS-to-JSON translation endpoint.
///
/// Cheap to clone; the inner `reqwest::Client` is reference counted.
#[derive(Debug, Clone)]
pub struct FeedClient {
    client: reqwest::Client,
    endpoint: Url,
    feed_url: String,
    timeout: Duration,
}

impl FeedClient {
    /// Create a client for `feed_url` behind the translation `endpoint`.
    ///
    /// # Errors
    ///
    /// Returns [`UrlValidationError`] when the endpoint is not a usable URL
    /// (plain HTTP is only accepted for loopback hosts).
    pub fn new(
        client: reqwest::Client,
        endpoint: &str,
        feed_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, UrlValidationError> {
        let endpoint = validate_endpoint(endpoint)?;
        Ok(Self {
            client,
            endpoint,
            feed_url: feed_url.into(),
            timeout,
        })
    }

    /// The upstream feed this client translates.
    pub fn feed_url(&self) -> &str {
        &self.feed_url
    }

    /// Full provider request URL with the upstream feed embedded as `rss_url`.
    pub fn request_url(&self) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut().append_pair("rss_url", &self.feed_url);
        url
    }

    /// Fetch one batch of articles from the provider.
    ///
    /// Records missing a title or link are dropped and counted in the log.
    /// Provider order is preserved.
    ///
    /// # Errors
    ///
    /// - [`FetchError::Network`] - Connection or TLS errors
    /// - [`FetchError::Timeout`] - Request exceeded the configured timeout
    /// - [`FetchError::HttpStatus`] - Non-2xx HTTP response
    /// - [`FetchError::ResponseTooLarge`] - Response exceeded 5MB
    /// - [`FetchError::Parse`] - Body is not valid provider JSON
    /// - [`FetchError::Provider`] - Provider reported a failure in-band
    pub async fn fetch_batch(&self) -> Result<Vec<Article>, FetchError> {
        let url = self.request_url();
        tracing::debug!(url = %url, "Fetching feed batch");

        let response = tokio::time::timeout(self.timeout, self.client.get(url).send())
            .await
            .map_err(|_| FetchError::Timeout)?
            .map_err(FetchError::Network)?;

        if !response.status().is_success() {
            return Err(FetchError::HttpStatus(response.status().as_u16()));
        }

        let bytes = read_limited_bytes(response, MAX_RESPONSE_SIZE).await?;
        self.parse_body(&bytes)
    }

    fn parse_body(&self, bytes: &[u8]) -> Result<Vec<Article>, FetchError> {
        let body: ProviderResponse =
            serde_json::from_slice(bytes).map_err(|e| FetchError::Parse(e.to_string()))?;

        if body.status != "ok" {
            return Err(FetchError::Provider(
                body.message.unwrap_or_else(|| format!("status {}", body.status)),
            ));
        }

        let fallback_source = body
            .feed
            .and_then(|f| f.title)
            .filter(|t| !t.trim().is_empty())
            .or_else(|| {
                Url::parse(&self.feed_url)
                    .ok()
                    .and_then(|u| u.host_str().map(str::to_string))
            })
            .unwrap_or_default();

        let total = body.items.len();
        let articles: Vec<Article> = body
            .items
            .into_iter()
            .filter_map(|item| item.into_article(&fallback_source))
            .collect();

        let skipped = total - articles.len();
        if skipped > 0 {
            tracing::warn!(
                feed = %self.feed_url,
                skipped = skipped,
                "Provider records without title or link skipped"
            );
        }

        tracing::debug!(count = articles.len(), "Feed batch parsed");
        Ok(articles)
    }
}

async fn read_limited_bytes(
    response: reqwest::Response,
    limit: usize,
) -> Result<Vec<u8>, FetchError> {
    // Fast path: check Content-Length header
    if let Some(len) = response.content_length() {
        if len as usize > limit {
            return Err(FetchError::ResponseTooLarge);
        }
    }

    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(FetchError::Network)?;
        if bytes.len().saturating_add(chunk.len()) > limit {
            return Err(FetchError::ResponseTooLarge);
        }
        bytes.extend_from_slice(&chunk);
    }

    Ok(bytes)
}
