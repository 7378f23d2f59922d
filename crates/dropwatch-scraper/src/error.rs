use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("rate limited fetching {url} (retry after {retry_after_secs}s)")]
    RateLimited { url: String, retry_after_secs: u64 },

    #[error("product page not found: {url}")]
    NotFound { url: String },

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("no product name element on {url}")]
    MissingName { url: String },

    #[error("no price element on {url}")]
    MissingPrice { url: String },

    #[error("price text \"{raw}\" on {url} has no numeric value")]
    PriceFormat { url: String, raw: String },
}
