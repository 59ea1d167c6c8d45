use reqwest::header::{HeaderValue, ACCEPT};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::parser::{parse_feed_bytes, FeedParseError};
use super::types::Feed;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

const ACCEPT_FEED: &str = "application/rss+xml, application/xml, text/xml;q=0.9, */*;q=0.8";

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("failed to fetch RSS feed: {0}")]
    HttpStatus(StatusCode),
    #[error("failed to read response body: {0}")]
    Read(#[source] reqwest::Error),
    #[error("failed to parse RSS feed: {0}")]
    Parse(#[from] FeedParseError),
}

impl FetchError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Transport(error) if error.is_timeout())
    }
}

/// A single override applied on top of the default client configuration.
#[derive(Debug, Clone)]
pub enum ClientOption {
    /// Replaces the whole transport. Any earlier timeout override is dropped,
    /// so the replacement client's own timeout applies until a later
    /// [`ClientOption::Timeout`].
    HttpClient(reqwest::Client),
    /// Bounds each request, from connecting until the body is fully read.
    Timeout(Duration),
}

/// Deserializable client settings. Unset fields keep the defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct FeedClientConfig {
    pub timeout_secs: Option<u64>,
    pub user_agent: Option<String>,
}

/// Collects [`ClientOption`]s in call order for [`FeedClient::with_options`].
#[derive(Debug, Default)]
pub struct FeedClientBuilder {
    options: Vec<ClientOption>,
}

impl FeedClientBuilder {
    pub fn http_client(mut self, client: reqwest::Client) -> Self {
        self.options.push(ClientOption::HttpClient(client));
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.options.push(ClientOption::Timeout(timeout));
        self
    }

    pub fn build(self) -> FeedClient {
        FeedClient::with_options(self.options)
    }
}

/// Fetches and decodes RSS feeds. Cloning is cheap and clones share the
/// underlying connection pool.
#[derive(Debug, Clone)]
pub struct FeedClient {
    http: reqwest::Client,
    timeout: Option<Duration>,
}

impl Default for FeedClient {
    fn default() -> Self {
        Self::new()
    }
}

impl FeedClient {
    pub fn new() -> Self {
        Self::with_options([])
    }

    /// Starts from the defaults (default transport, 10 second timeout) and
    /// applies `options` in order.
    pub fn with_options(options: impl IntoIterator<Item = ClientOption>) -> Self {
        let mut client = Self {
            http: reqwest::Client::new(),
            timeout: Some(DEFAULT_TIMEOUT),
        };
        for option in options {
            client.apply(option);
        }
        client
    }

    pub fn builder() -> FeedClientBuilder {
        FeedClientBuilder::default()
    }

    pub fn from_config(config: &FeedClientConfig) -> Result<Self, FetchError> {
        let mut http = reqwest::Client::builder();
        if let Some(user_agent) = &config.user_agent {
            http = http.user_agent(user_agent.as_str());
        }
        let http = http.build().map_err(FetchError::Transport)?;
        let timeout = config
            .timeout_secs
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_TIMEOUT);

        Ok(Self::with_options([
            ClientOption::HttpClient(http),
            ClientOption::Timeout(timeout),
        ]))
    }

    /// The per-request timeout, or `None` when a replacement transport's own
    /// timeout is in effect.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    fn apply(&mut self, option: ClientOption) {
        match option {
            ClientOption::HttpClient(http) => {
                self.http = http;
                self.timeout = None;
            }
            ClientOption::Timeout(timeout) => self.timeout = Some(timeout),
        }
    }

    pub async fn get_feed(&self, url: &str) -> Result<Feed, FetchError> {
        tracing::debug!(url, "fetching feed");
        let mut request = self
            .http
            .get(url)
            .header(ACCEPT, HeaderValue::from_static(ACCEPT_FEED));
        if let Some(timeout) = self.timeout {
            request = request.timeout(timeout);
        }

        // The response is dropped on every early return, which releases the
        // connection.
        let response = request.send().await.map_err(FetchError::Transport)?;
        let status = response.status();
        tracing::debug!(url, %status, "received feed response");
        if status != StatusCode::OK {
            tracing::warn!(url, %status, "feed request returned non-OK status");
            return Err(FetchError::HttpStatus(status));
        }

        let body = response.bytes().await.map_err(|error| {
            if error.is_timeout() {
                FetchError::Transport(error)
            } else {
                FetchError::Read(error)
            }
        })?;

        let feed = parse_feed_bytes(&body).inspect_err(|error| {
            tracing::warn!(url, %error, "feed body could not be decoded");
        })?;
        tracing::debug!(url, items = feed.channel.items.len(), "decoded feed");
        Ok(feed)
    }
}
