//! Retry with exponential back-off and jitter for product-page fetches.
//!
//! [`retry_with_backoff`] wraps a fallible async fetch and retries on
//! transient errors. Parse failures and client-side HTTP statuses are
//! returned immediately — retrying would reproduce the same result.

use std::future::Future;
use std::time::Duration;

use crate::error::ScrapeError;

/// Returns `true` for errors worth retrying after a back-off delay.
///
/// **Retriable:**
/// - [`ScrapeError::RateLimited`] — HTTP 429; the server asked us to back off.
/// - [`ScrapeError::Http`] with a timeout, connect failure, or 5xx status.
/// - [`ScrapeError::UnexpectedStatus`] with a 5xx status.
///
/// **Not retriable:** 404, non-5xx unexpected statuses, and all extraction
/// errors (missing elements, unparseable price).
fn is_retriable(err: &ScrapeError) -> bool {
    match err {
        ScrapeError::RateLimited { .. } => true,
        ScrapeError::Http(e) => {
            e.is_timeout() || e.is_connect() || e.status().is_some_and(|s| s.is_server_error())
        }
        ScrapeError::UnexpectedStatus { status, .. } => *status >= 500,
        ScrapeError::NotFound { .. }
        | ScrapeError::MissingName { .. }
        | ScrapeError::MissingPrice { .. }
        | ScrapeError::PriceFormat { .. } => false,
    }
}

/// Runs `operation` with up to `max_retries` additional attempts on
/// transient errors.
///
/// The wait before the n-th retry is `backoff_base_ms * 2^(n-1)` with
/// ±25% jitter, capped at 30 s. Non-retriable errors are returned
/// immediately.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    max_retries: u32,
    backoff_base_ms: u64,
    mut operation: F,
) -> Result<T, ScrapeError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ScrapeError>>,
{
    const MAX_DELAY_MS: u64 = 30_000;
    let mut attempt = 0u32;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if !is_retriable(&err) || attempt >= max_retries {
                    return Err(err);
                }
                attempt += 1;
                let computed = backoff_base_ms.saturating_mul(1u64 << (attempt - 1).min(10));
                let capped = computed.min(MAX_DELAY_MS);
                #[allow(
                    clippy::cast_possible_truncation,
                    clippy::cast_sign_loss,
                    clippy::cast_precision_loss
                )]
                let delay_ms = (capped as f64 * (rand::random::<f64>() * 0.5 + 0.75)) as u64;
                tracing::warn!(
                    attempt,
                    max_retries,
                    delay_ms,
                    error = %err,
                    "transient fetch error — retrying after back-off"
                );
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            }
        }
    }
}
