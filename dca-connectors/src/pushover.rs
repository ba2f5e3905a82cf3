//! Pushover notification client.
//!
//! `POST {url}/1/messages.json` with form fields `token`, `user`, `message`
//! and `timestamp`. Delivery is best effort: a non-2xx reply is reported as
//! `Ok(false)`, only transport failures are errors.

use chrono::Utc;
use reqwest::Client;
use std::time::Duration;
use thiserror::Error;
use tokio::time::timeout;
use tracing::{info, warn};
use zeroize::Zeroizing;

/// Pushover API root
pub const PUSHOVER_API_URL: &str = "https://api.pushover.net:443";

/// Request timeout in seconds
const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Errors that can occur sending a notification.
#[derive(Debug, Clone, Error)]
pub enum PushoverError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    RequestFailed(String),

    /// Request timed out
    #[error("Request timed out")]
    Timeout,
}

/// Pushover API client.
pub struct PushoverClient {
    client: Client,
    app_token: Zeroizing<String>,
    user_key: Zeroizing<String>,
    url: String,
}

impl PushoverClient {
    /// Create a client for the public Pushover API.
    pub fn new(app_token: impl Into<String>, user_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            app_token: Zeroizing::new(app_token.into()),
            user_key: Zeroizing::new(user_key.into()),
            url: PUSHOVER_API_URL.to_string(),
        }
    }

    /// Point the client at a different API root.
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into().trim_end_matches('/').to_string();
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/1/messages.json", self.url)
    }

    fn form(&self, message: &str, timestamp: i64) -> [(&'static str, String); 4] {
        [
            ("token", self.app_token.to_string()),
            ("user", self.user_key.to_string()),
            ("message", message.to_string()),
            ("timestamp", timestamp.to_string()),
        ]
    }

    /// Send `message`. Returns whether Pushover accepted it.
    pub async fn send_message(&self, message: &str) -> Result<bool, PushoverError> {
        let form = self.form(message, Utc::now().timestamp());

        let response = timeout(
            Duration::from_secs(REQUEST_TIMEOUT_SECS),
            self.client.post(self.endpoint()).form(&form[..]).send(),
        )
        .await
        .map_err(|_| PushoverError::Timeout)?
        .map_err(|e| PushoverError::RequestFailed(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            info!("Push notification successfully sent");
            Ok(true)
        } else {
            warn!(%status, "Something went wrong with request to Pushover");
            Ok(false)
        }
    }
}

impl std::fmt::Debug for PushoverClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PushoverClient")
            .field("url", &self.url)
            .field("app_token", &"<redacted>")
            .field("user_key", &"<redacted>")
            .finish()
    }
}
