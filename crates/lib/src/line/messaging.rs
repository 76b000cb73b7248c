//! LINE Messaging API client: send reply messages via the reply endpoint.

use async_trait::async_trait;
use serde_json::json;

const LINE_API_BASE: &str = "https://api.line.me";

#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    #[error("delivery token is empty")]
    InvalidToken,

    #[error("reply request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("reply rejected: {status} {body}")]
    Api {
        status: reqwest::StatusCode,
        body: String,
    },
}

/// Sends the reply for one inbound event, addressed by its reply token.
/// Seam between the router and the platform transport; mock it in tests.
#[async_trait]
pub trait ReplySender: Send + Sync {
    async fn reply(&self, reply_token: &str, text: &str) -> Result<(), DeliveryError>;
}

/// Messaging API client for one channel. One instance per tenant, built at
/// startup and kept for the process lifetime.
#[derive(Clone)]
pub struct LineClient {
    base_url: String,
    token: String,
    client: reqwest::Client,
}

impl LineClient {
    /// Build a client from a channel access token. Empty tokens are rejected so
    /// a misconfigured tenant fails at registration, not on its first reply.
    pub fn new(delivery_token: &str) -> Result<Self, DeliveryError> {
        let token = delivery_token.trim();
        if token.is_empty() {
            return Err(DeliveryError::InvalidToken);
        }
        Ok(Self {
            base_url: line_api_base(),
            token: token.to_string(),
            client: reqwest::Client::new(),
        })
    }

    /// Replace the API base URL (tests or custom endpoints).
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    /// Send one text reply. Exactly one network call; failures are reported to
    /// the caller and never retried.
    pub async fn reply(&self, reply_token: &str, text: &str) -> Result<(), DeliveryError> {
        let url = format!("{}/v2/bot/message/reply", self.base_url);
        let body = json!({
            "replyToken": reply_token,
            "messages": [{ "type": "text", "text": text }],
        });
        let res = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await?;
        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(DeliveryError::Api { status, body });
        }
        Ok(())
    }
}

#[async_trait]
impl ReplySender for LineClient {
    async fn reply(&self, reply_token: &str, text: &str) -> Result<(), DeliveryError> {
        LineClient::reply(self, reply_token, text).await
    }
}

/// Resolve the Messaging API base URL (LINE_API_BASE env for tests or custom endpoints).
pub fn line_api_base() -> String {
    std::env::var("LINE_API_BASE").unwrap_or_else(|_| LINE_API_BASE.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_token_is_rejected() {
        assert!(matches!(
            LineClient::new("   "),
            Err(DeliveryError::InvalidToken)
        ));
        assert!(LineClient::new("token").is_ok());
    }
}
