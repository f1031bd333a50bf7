//! Google Drive v3 API client
//!
//! Provides a typed HTTP client for the Drive v3 REST API. Handles bearer
//! authentication through an [`ICredentialProvider`], transport-level
//! backoff, and mapping of error bodies into [`ApiError`].
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use drivemirror_gdrive::auth::StaticTokenProvider;
//! use drivemirror_gdrive::client::DriveClient;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let client = DriveClient::new(Arc::new(StaticTokenProvider::new("ya29.token")));
//! let bytes = client
//!     .download("/files/abc123", &[("alt", "media".to_string())])
//!     .await?;
//! println!("{} bytes", bytes.len());
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use drivemirror_core::config::DEFAULT_API_BASE_URL;
use drivemirror_core::ports::{ApiError, ICredentialProvider};
use futures_util::StreamExt;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::DriveError;

/// Maximum number of retries for 429 / 5xx responses
const DEFAULT_MAX_RETRIES: u32 = 5;

/// First backoff delay when the server gives no `Retry-After`
const DEFAULT_INITIAL_BACKOFF: Duration = Duration::from_secs(1);

/// Upper bound for a single backoff delay
const MAX_BACKOFF: Duration = Duration::from_secs(64);

// ============================================================================
// Drive API error body
// ============================================================================

/// Error envelope returned by Google APIs
///
/// ```json
/// {"error": {"code": 403, "message": "...", "errors": [{"reason": "exportSizeLimitExceeded"}]}}
/// ```
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    errors: Vec<ErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    reason: Option<String>,
}

/// Build an [`ApiError`] from a status code and raw response body
pub(crate) fn parse_api_error(status: StatusCode, body: &str) -> ApiError {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) => {
            let reason = envelope
                .error
                .errors
                .into_iter()
                .find_map(|detail| detail.reason);
            let message = if envelope.error.message.is_empty() {
                canonical_message(status)
            } else {
                envelope.error.message
            };
            ApiError::new(status.as_u16(), reason, message)
        }
        Err(_) => {
            let message = if body.trim().is_empty() {
                canonical_message(status)
            } else {
                body.trim().to_string()
            };
            ApiError::new(status.as_u16(), None, message)
        }
    }
}

fn canonical_message(status: StatusCode) -> String {
    status
        .canonical_reason()
        .unwrap_or("Unknown status")
        .to_string()
}

/// Parse a `Retry-After` header value
///
/// Accepts delay-seconds or an HTTP-date. Dates more than an hour away are
/// ignored.
pub fn parse_retry_after(value: &str) -> Option<Duration> {
    if let Ok(seconds) = value.trim().parse::<u64>() {
        return Some(Duration::from_secs(seconds));
    }

    let date = chrono::DateTime::parse_from_rfc2822(value.trim()).ok()?;
    let diff = date.with_timezone(&chrono::Utc) - chrono::Utc::now();
    let secs: u64 = diff.num_seconds().try_into().ok()?;
    (secs <= 3600).then(|| Duration::from_secs(secs))
}

fn is_retryable(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

// ============================================================================
// DriveClient
// ============================================================================

/// HTTP client for Google Drive v3 calls
///
/// Wraps `reqwest::Client` with bearer authentication and base URL
/// construction. A fresh token is requested from the credential provider
/// before every attempt, so refreshed tokens are picked up mid-run.
pub struct DriveClient {
    /// The underlying HTTP client
    client: Client,
    /// Base URL for API requests
    base_url: String,
    /// Source of bearer tokens
    credentials: Arc<dyn ICredentialProvider>,
    /// Retries for 429 / 5xx responses
    max_retries: u32,
    /// First delay of the exponential backoff
    initial_backoff: Duration,
}

impl DriveClient {
    /// Creates a new DriveClient against the public Drive v3 endpoint
    pub fn new(credentials: Arc<dyn ICredentialProvider>) -> Self {
        Self::with_base_url(credentials, DEFAULT_API_BASE_URL)
    }

    /// Creates a new DriveClient with a custom base URL (useful for testing)
    ///
    /// # Arguments
    /// * `credentials` - Source of bearer tokens
    /// * `base_url` - Base URL without trailing slash, e.g. `http://127.0.0.1:8080`
    pub fn with_base_url(
        credentials: Arc<dyn ICredentialProvider>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            credentials,
            max_retries: DEFAULT_MAX_RETRIES,
            initial_backoff: DEFAULT_INITIAL_BACKOFF,
        }
    }

    /// Sets the number of retries for throttled or failed requests
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Sets the first backoff delay used when no `Retry-After` is given
    pub fn with_initial_backoff(mut self, backoff: Duration) -> Self {
        self.initial_backoff = backoff;
        self
    }

    /// Returns the base URL for API requests
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Creates an authenticated request builder for the given method and path
    ///
    /// # Arguments
    /// * `method` - HTTP method
    /// * `path` - API path relative to base URL (e.g., "/files")
    /// * `token` - Bearer token for this request
    pub fn request(&self, method: Method, path: &str, token: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        self.client.request(method, &url).bearer_auth(token)
    }

    /// Delay before retry number `attempt` (0-based)
    fn backoff_delay(&self, attempt: u32, response: &Response) -> Duration {
        let from_header = response
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_retry_after);

        from_header.unwrap_or_else(|| {
            let factor = 2u32.saturating_pow(attempt.min(16));
            self.initial_backoff.saturating_mul(factor).min(MAX_BACKOFF)
        })
    }

    // ========================================================================
    // execute_with_retry - 429 / 5xx handling
    // ========================================================================

    /// Executes a GET request with automatic backoff on 429 and 5xx.
    ///
    /// On HTTP 429 or 5xx the `Retry-After` header is honored, falling back to
    /// exponential backoff. Any other non-success status is turned into an
    /// [`ApiError`] immediately.
    ///
    /// # Arguments
    /// * `path` - API path relative to base URL
    /// * `query` - Query parameters
    ///
    /// # Returns
    /// The successful HTTP response, or an error wrapping [`ApiError`] once
    /// all retries are exhausted.
    pub async fn execute_with_retry(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<Response> {
        let mut attempt: u32 = 0;

        loop {
            let token = self
                .credentials
                .access_token()
                .await
                .context("Failed to obtain access token")?;

            let response = self
                .request(Method::GET, path, &token)
                .query(query)
                .send()
                .await
                .with_context(|| format!("Failed to send request to {path}"))?;

            let status = response.status();
            if status.is_success() {
                if attempt > 0 {
                    info!(path, attempt, "Request succeeded after retry");
                }
                return Ok(response);
            }

            if is_retryable(status) && attempt < self.max_retries {
                let delay = self.backoff_delay(attempt, &response);
                info!(
                    path,
                    status = status.as_u16(),
                    attempt,
                    retry_after_ms = delay.as_millis() as u64,
                    "Transient HTTP status, backing off"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
                continue;
            }

            let body = response.text().await.unwrap_or_default();
            let api_error = parse_api_error(status, &body);
            if is_retryable(status) {
                warn!(path, attempts = attempt + 1, status = status.as_u16(), "Retry limit exhausted");
            } else {
                debug!(path, status = status.as_u16(), reason = ?api_error.reason, "API error");
            }
            return Err(api_error.into());
        }
    }

    /// GET a JSON resource
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        let response = self.execute_with_retry(path, query).await?;
        let body = response
            .bytes()
            .await
            .with_context(|| format!("Failed to read response body from {path}"))?;

        serde_json::from_slice(&body)
            .map_err(|e| DriveError::InvalidResponse(format!("{path}: {e}")))
            .map_err(anyhow::Error::from)
    }

    /// GET a binary resource, consuming the body chunk by chunk
    ///
    /// Dropping the returned future aborts the download; nothing is written
    /// anywhere by this method.
    pub async fn download(&self, path: &str, query: &[(&str, String)]) -> Result<Vec<u8>> {
        let response = self.execute_with_retry(path, query).await?;

        let capacity = response.content_length().unwrap_or(0) as usize;
        let mut data = Vec::with_capacity(capacity);
        let mut stream = response.bytes_stream();

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.with_context(|| format!("Failed to read body chunk from {path}"))?;
            data.extend_from_slice(&chunk);
        }

        debug!(path, bytes = data.len(), "Download complete");
        Ok(data)
    }
}
