//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building the HTTP client with the crawler's identification headers
//! - Issuing a single GET per call
//! - Classifying the outcome as success, retryable or permanent failure

use crate::config::Config;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE};
use reqwest::{Client, StatusCode};
use std::time::Duration;
use url::Url;

/// Immutable settings the HTTP client is built from
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Full User-Agent header value
    pub user_agent: String,
    /// Whole-request timeout
    pub timeout: Duration,
    /// Connection establishment timeout
    pub connect_timeout: Duration,
}

impl HttpConfig {
    /// Derives the HTTP settings from the crawler configuration
    pub fn from_config(config: &Config) -> Self {
        let timeout = config.crawler.request_timeout();
        Self {
            user_agent: config.user_agent.header_value(),
            timeout,
            connect_timeout: timeout.min(Duration::from_secs(10)),
        }
    }
}

/// Result of a single fetch attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// 2xx response; the body may be empty
    Success {
        /// Page body content
        body: Vec<u8>,
        /// HTTP status code
        status: u16,
    },

    /// Transient condition worth another attempt later
    RetryableFailure {
        reason: String,
        /// HTTP status code, when a response was received
        status: Option<u16>,
    },

    /// Condition expected to recur identically
    PermanentFailure {
        reason: String,
        /// HTTP status code, when a response was received
        status: Option<u16>,
    },
}

impl FetchOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::RetryableFailure { .. })
    }

    /// Returns the HTTP status, if a response was received
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Success { status, .. } => Some(*status),
            Self::RetryableFailure { status, .. } | Self::PermanentFailure { status, .. } => {
                *status
            }
        }
    }
}

/// Builds an HTTP client with proper configuration
///
/// # Example
///
/// ```no_run
/// use shelf_scout::crawler::{build_http_client, HttpConfig};
/// use std::time::Duration;
///
/// let config = HttpConfig {
///     user_agent: "ShelfScout/0.1 (+https://example.com/bot; bot@example.com)".to_string(),
///     timeout: Duration::from_secs(30),
///     connect_timeout: Duration::from_secs(10),
/// };
///
/// let client = build_http_client(&config).unwrap();
/// ```
pub fn build_http_client(config: &HttpConfig) -> Result<Client, reqwest::Error> {
    let mut headers = HeaderMap::new();
    headers.insert(
        ACCEPT,
        HeaderValue::from_static("text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"),
    );
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.5"));

    Client::builder()
        .user_agent(config.user_agent.clone())
        .default_headers(headers)
        .timeout(config.timeout)
        .connect_timeout(config.connect_timeout)
        .gzip(true)
        .brotli(true)
        .build()
}

/// Issues GET requests for the crawler
///
/// The underlying client pools connections, so one instance is reused for
/// every request of a run.
#[derive(Debug, Clone)]
pub struct FetchClient {
    client: Client,
}

impl FetchClient {
    /// Builds the client from immutable HTTP settings
    pub fn new(config: &HttpConfig) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: build_http_client(config)?,
        })
    }

    /// Fetches `url` with exactly one request attempt
    ///
    /// # Classification
    ///
    /// | Condition | Outcome |
    /// |-----------|---------|
    /// | HTTP 2xx (empty body included) | Success |
    /// | HTTP 5xx, 408, 429 | RetryableFailure |
    /// | Other HTTP 4xx and non-2xx | PermanentFailure |
    /// | Timeout, connection refused/reset, DNS failure | RetryableFailure |
    /// | Malformed or non-HTTP URL | PermanentFailure |
    pub async fn fetch(&self, url: &str) -> FetchOutcome {
        let parsed = match Url::parse(url) {
            Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => parsed,
            Ok(parsed) => {
                return FetchOutcome::PermanentFailure {
                    reason: format!("Unsupported URL scheme '{}'", parsed.scheme()),
                    status: None,
                }
            }
            Err(e) => {
                return FetchOutcome::PermanentFailure {
                    reason: format!("Malformed URL: {}", e),
                    status: None,
                }
            }
        };

        tracing::debug!(url, "Sending GET request");

        let response = match self.client.get(parsed).send().await {
            Ok(response) => response,
            Err(e) => return classify_error(&e),
        };

        let status = response.status();
        if !status.is_success() {
            return classify_status(status);
        }

        match response.bytes().await {
            Ok(body) => FetchOutcome::Success {
                body: body.to_vec(),
                status: status.as_u16(),
            },
            // Connection dropped mid-body
            Err(e) => FetchOutcome::RetryableFailure {
                reason: format!("Failed to read response body: {}", e),
                status: Some(status.as_u16()),
            },
        }
    }
}

/// Maps a non-2xx status to a failure outcome
fn classify_status(status: StatusCode) -> FetchOutcome {
    let reason = match status.canonical_reason() {
        Some(text) => format!("HTTP {} {}", status.as_u16(), text),
        None => format!("HTTP {}", status.as_u16()),
    };

    if status.is_server_error()
        || status == StatusCode::REQUEST_TIMEOUT
        || status == StatusCode::TOO_MANY_REQUESTS
    {
        FetchOutcome::RetryableFailure {
            reason,
            status: Some(status.as_u16()),
        }
    } else {
        FetchOutcome::PermanentFailure {
            reason,
            status: Some(status.as_u16()),
        }
    }
}

/// Maps a transport error to a failure outcome
fn classify_error(error: &reqwest::Error) -> FetchOutcome {
    if error.is_timeout() {
        FetchOutcome::RetryableFailure {
            reason: "Request timeout".to_string(),
            status: None,
        }
    } else if error.is_connect() {
        FetchOutcome::RetryableFailure {
            reason: format!("Connection failed: {}", error),
            status: None,
        }
    } else if error.is_builder() || error.is_redirect() {
        FetchOutcome::PermanentFailure {
            reason: error.to_string(),
            status: None,
        }
    } else {
        // Resets and other mid-request I/O errors
        FetchOutcome::RetryableFailure {
            reason: error.to_string(),
            status: None,
        }
    }
}
