//! HTTP client for the Telegram Bot API.
//!
//! Wraps `reqwest` with envelope checking and typed deserialization. The
//! bot token is part of every request path, so HTTP errors are stripped of
//! their URL before they can reach a log line.

use std::time::Duration;

use reqwest::{Client, Url};

use crate::error::TelegramError;
use crate::types::{ApiEnvelope, Update};

const DEFAULT_BASE_URL: &str = "https://api.telegram.org/";

/// Client for the Telegram Bot API.
///
/// Use [`TelegramClient::new`] for production or
/// [`TelegramClient::with_base_url`] to point at a mock server in tests.
#[derive(Debug, Clone)]
pub struct TelegramClient {
    client: Client,
    token: String,
    base_url: Url,
}

impl TelegramClient {
    /// Creates a client pointed at the production Bot API.
    ///
    /// `timeout_secs` must exceed the long-poll timeout passed to
    /// [`TelegramClient::get_updates`], or idle polls end in client-side
    /// timeouts.
    ///
    /// # Errors
    ///
    /// Returns [`TelegramError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(token: &str, timeout_secs: u64) -> Result<Self, TelegramError> {
        Self::with_base_url(token, timeout_secs, DEFAULT_BASE_URL)
    }

    /// Creates a client with a custom base URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`TelegramError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed, or [`TelegramError::InvalidBaseUrl`] if
    /// `base_url` does not parse.
    pub fn with_base_url(
        token: &str,
        timeout_secs: u64,
        base_url: &str,
    ) -> Result<Self, TelegramError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| TelegramError::Http(e.without_url()))?;

        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalised).map_err(|e| TelegramError::InvalidBaseUrl {
            base_url: normalised.clone(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            client,
            token: token.to_owned(),
            base_url,
        })
    }

    /// Sends a plain-text message to a chat.
    ///
    /// # Errors
    ///
    /// - [`TelegramError::Api`] if the API answers `ok: false` (unknown chat,
    ///   blocked bot, malformed request).
    /// - [`TelegramError::Http`] on network failure.
    /// - [`TelegramError::Deserialize`] if the response is not a Bot API
    ///   envelope.
    pub async fn send_message(&self, chat_id: &str, text: &str) -> Result<(), TelegramError> {
        let body = serde_json::json!({
            "chat_id": chat_id,
            "text": text,
            "disable_web_page_preview": true,
        });
        self.call::<serde_json::Value>("sendMessage", &body).await?;
        Ok(())
    }

    /// Long-polls for inbound updates.
    ///
    /// `offset` should be one past the last processed `update_id`; Telegram
    /// then drops everything older. `poll_timeout_secs` is the server-side
    /// hold time for an empty queue.
    ///
    /// # Errors
    ///
    /// Same error surface as [`TelegramClient::send_message`].
    pub async fn get_updates(
        &self,
        offset: Option<i64>,
        poll_timeout_secs: u64,
    ) -> Result<Vec<Update>, TelegramError> {
        let mut body = serde_json::json!({
            "timeout": poll_timeout_secs,
            "allowed_updates": ["message"],
        });
        if let Some(offset) = offset {
            body["offset"] = serde_json::json!(offset);
        }
        let updates = self.call::<Vec<Update>>("getUpdates", &body).await?;
        Ok(updates)
    }

    /// Posts one Bot API method call and unwraps the response envelope.
    async fn call<T>(
        &self,
        api_method: &str,
        body: &serde_json::Value,
    ) -> Result<T, TelegramError>
    where
        T: serde::de::DeserializeOwned + Default,
    {
        let url = self.method_url(api_method)?;
        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| TelegramError::Http(e.without_url()))?;

        // Telegram reports application errors as ok:false envelopes with
        // non-2xx statuses; parse the envelope first so the description
        // isn't lost.
        let raw = response
            .text()
            .await
            .map_err(|e| TelegramError::Http(e.without_url()))?;
        let envelope: ApiEnvelope<T> =
            serde_json::from_str(&raw).map_err(|e| TelegramError::Deserialize {
                context: format!("{api_method} response"),
                source: e,
            })?;

        if !envelope.ok {
            return Err(TelegramError::Api(
                envelope
                    .description
                    .unwrap_or_else(|| "no description".to_owned()),
            ));
        }
        Ok(envelope.result.unwrap_or_default())
    }

    fn method_url(&self, api_method: &str) -> Result<Url, TelegramError> {
        let path = format!("bot{}/{api_method}", self.token);
        self.base_url
            .join(&path)
            .map_err(|e| TelegramError::InvalidBaseUrl {
                base_url: self.base_url.to_string(),
                reason: e.to_string(),
            })
    }
}
