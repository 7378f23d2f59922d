//! HTTP client for marketplace product pages.

use std::time::Duration;

use dropwatch_core::ProductSnapshot;
use reqwest::Client;

use crate::error::ScrapeError;
use crate::extract::extract_snapshot;
use crate::retry::retry_with_backoff;

/// Fetches product pages and extracts snapshots.
///
/// Handles rate limiting (429), not-found (404), and other non-2xx responses
/// as typed errors. Transient errors (429, network failures, 5xx) are
/// automatically retried with exponential backoff up to `max_retries`
/// additional attempts; extraction errors are not.
#[derive(Debug, Clone)]
pub struct FlipkartClient {
    client: Client,
    /// Maximum number of retry attempts after the first failure.
    max_retries: u32,
    /// Base delay in milliseconds for exponential backoff.
    backoff_base_ms: u64,
}

impl FlipkartClient {
    /// Creates a client with configured timeout, `User-Agent`, and retry
    /// policy. Set `max_retries` to `0` to disable retries.
    ///
    /// # Errors
    ///
    /// Returns [`ScrapeError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(
        timeout_secs: u64,
        user_agent: &str,
        max_retries: u32,
        backoff_base_ms: u64,
    ) -> Result<Self, ScrapeError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;
        Ok(Self {
            client,
            max_retries,
            backoff_base_ms,
        })
    }

    /// Fetches one product page and extracts its snapshot, with automatic
    /// retry on transient errors.
    ///
    /// # Errors
    ///
    /// - [`ScrapeError::RateLimited`] — HTTP 429 after all retries exhausted.
    /// - [`ScrapeError::NotFound`] — HTTP 404 (not retried).
    /// - [`ScrapeError::UnexpectedStatus`] — any other non-2xx status
    ///   (5xx retried, 4xx not).
    /// - [`ScrapeError::Http`] — network failure after all retries exhausted.
    /// - [`ScrapeError::MissingName`] / [`ScrapeError::MissingPrice`] /
    ///   [`ScrapeError::PriceFormat`] — expected page elements absent or
    ///   unusable (not retried).
    pub async fn fetch_product(&self, url: &str) -> Result<ProductSnapshot, ScrapeError> {
        retry_with_backoff(self.max_retries, self.backoff_base_ms, || {
            let url = url.to_owned();
            async move { self.fetch_once(&url).await }
        })
        .await
    }

    async fn fetch_once(&self, url: &str) -> Result<ProductSnapshot, ScrapeError> {
        let response = self
            .client
            .get(url)
            .header(
                reqwest::header::ACCEPT,
                "text/html,application/xhtml+xml;q=0.9,*/*;q=0.8",
            )
            .header(reqwest::header::ACCEPT_LANGUAGE, "en-IN,en;q=0.9")
            .send()
            .await?;
        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after_secs = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(60);
            return Err(ScrapeError::RateLimited {
                url: url.to_owned(),
                retry_after_secs,
            });
        }

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(ScrapeError::NotFound {
                url: url.to_owned(),
            });
        }

        if !status.is_success() {
            return Err(ScrapeError::UnexpectedStatus {
                status: status.as_u16(),
                url: url.to_owned(),
            });
        }

        let body = response.text().await?;
        extract_snapshot(&body, url)
    }
}
