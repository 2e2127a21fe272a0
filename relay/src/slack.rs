//! Slack Web API client.
//!
//! DESIGN
//! ======
//! Only `chat.postMessage` is used. Slack answers `200` even on logical
//! failures and reports them as `{"ok": false, "error": "..."}`, so the body
//! is always inspected before a delivery counts as successful.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::RelayConfig;
use crate::error::RelayError;

/// Where a message landed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostedMessage {
    pub channel: String,
    pub ts: String,
}

#[async_trait]
pub trait ChatPoster: Send + Sync {
    async fn post_message(&self, channel: &str, text: &str) -> Result<PostedMessage, RelayError>;
}

// =============================================================================
// SlackClient
// =============================================================================

pub struct SlackClient {
    http: reqwest::Client,
    token: String,
    base_url: String,
}

impl SlackClient {
    /// # Errors
    ///
    /// Returns `HttpClientBuild` if the HTTP client cannot be constructed.
    pub fn new(config: &RelayConfig) -> Result<Self, RelayError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeouts.request_secs))
            .connect_timeout(Duration::from_secs(config.timeouts.connect_secs))
            .build()
            .map_err(|e| RelayError::HttpClientBuild(e.to_string()))?;
        Ok(Self { http, token: config.slack_token.clone(), base_url: config.slack_api_base_url.clone() })
    }
}

#[derive(Serialize)]
struct PostMessageRequest<'a> {
    channel: &'a str,
    text: &'a str,
}

#[derive(Deserialize)]
struct PostMessageResponse {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    channel: Option<String>,
    #[serde(default)]
    ts: Option<String>,
}

#[async_trait]
impl ChatPoster for SlackClient {
    async fn post_message(&self, channel: &str, text: &str) -> Result<PostedMessage, RelayError> {
        let resp = self
            .http
            .post(format!("{}/chat.postMessage", self.base_url))
            .bearer_auth(&self.token)
            .json(&PostMessageRequest { channel, text })
            .send()
            .await
            .map_err(|e| RelayError::Delivery(e.to_string()))?;

        let status = resp.status();
        let body = resp.text().await.map_err(|e| RelayError::Delivery(e.to_string()))?;
        if !status.is_success() {
            return Err(RelayError::Delivery(format!("slack returned {status}: {body}")));
        }
        parse_post_message_response(&body)
    }
}

/// Interpret a `chat.postMessage` body.
///
/// # Errors
///
/// Returns `Delivery` for `ok: false` or an undecodable body.
pub fn parse_post_message_response(body: &str) -> Result<PostedMessage, RelayError> {
    let parsed: PostMessageResponse =
        serde_json::from_str(body).map_err(|e| RelayError::Delivery(format!("unreadable slack response: {e}")))?;
    if !parsed.ok {
        return Err(RelayError::Delivery(parsed.error.unwrap_or_else(|| "unknown_error".to_owned())));
    }
    Ok(PostedMessage { channel: parsed.channel.unwrap_or_default(), ts: parsed.ts.unwrap_or_default() })
}

#[cfg(test)]
#[path = "slack_test.rs"]
mod tests;
