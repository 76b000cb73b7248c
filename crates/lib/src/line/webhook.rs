//! Webhook payload verification and parsing.
//!
//! LINE signs each callback with a base64-encoded HMAC-SHA256 over the raw
//! request body, keyed by the channel secret, in the `x-line-signature` header.

use base64::{engine::general_purpose::STANDARD as B64, Engine as _};
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the request signature.
pub const SIGNATURE_HEADER: &str = "x-line-signature";

#[derive(Debug, thiserror::Error)]
pub enum SignatureError {
    #[error("signature header missing")]
    Missing,

    #[error("signature mismatch")]
    Invalid,

    #[error("signature verification failed: {0}")]
    Internal(String),
}

/// Verify a base64 HMAC-SHA256 `signature` against `body` with the channel secret.
/// An undecodable header counts as a mismatch, not an internal failure.
pub fn verify_signature(
    secret: &str,
    signature: Option<&str>,
    body: &[u8],
) -> Result<(), SignatureError> {
    let signature = signature.ok_or(SignatureError::Missing)?;
    let provided = B64.decode(signature).map_err(|_| SignatureError::Invalid)?;
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| SignatureError::Internal(e.to_string()))?;
    mac.update(body);
    mac.verify_slice(&provided)
        .map_err(|_| SignatureError::Invalid)
}

/// Compute the base64-encoded HMAC-SHA256 signature for a body.
pub fn sign(secret: &str, body: &[u8]) -> String {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).expect("hmac accepts any key size");
    mac.update(body);
    B64.encode(mac.finalize().into_bytes())
}

/// Verified callback payload: the platform delivers an array of events.
#[derive(Debug, Deserialize)]
pub struct WebhookEnvelope {
    #[serde(default)]
    pub destination: Option<String>,
    #[serde(default)]
    pub events: Vec<InboundEvent>,
}

/// One webhook event. Kinds other than text messages are ignored by the router.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InboundEvent {
    /// Event kind as delivered: "message", "follow", "unfollow", "postback", ...
    #[serde(rename = "type")]
    pub kind: String,

    /// Single-use token for replying to this event.
    #[serde(default)]
    pub reply_token: Option<String>,

    /// Present for message events.
    #[serde(default)]
    pub message: Option<MessageContent>,
}

/// Message body of a message event.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageContent {
    /// Message kind: "text", "sticker", "image", ...
    #[serde(rename = "type")]
    pub kind: String,

    #[serde(default)]
    pub id: Option<String>,

    #[serde(default)]
    pub text: Option<String>,
}

impl InboundEvent {
    /// Reply token and text when this is a text message event with both present.
    pub fn text_message(&self) -> Option<(&str, &str)> {
        if self.kind != "message" {
            return None;
        }
        let message = self.message.as_ref()?;
        if message.kind != "text" {
            return None;
        }
        let token = self.reply_token.as_deref()?;
        let text = message.text.as_deref()?;
        Some((token, text))
    }
}

/// Parse an authenticated body into the event envelope.
pub fn parse_envelope(body: &[u8]) -> Result<WebhookEnvelope, serde_json::Error> {
    serde_json::from_slice(body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signature_round_trip() {
        let secret = "channel-secret";
        let body = br#"{"events":[]}"#;
        let sig = sign(secret, body);
        assert!(verify_signature(secret, Some(&sig), body).is_ok());
    }

    #[test]
    fn tampered_body_fails() {
        let secret = "channel-secret";
        let sig = sign(secret, b"original");
        assert!(matches!(
            verify_signature(secret, Some(&sig), b"tampered"),
            Err(SignatureError::Invalid)
        ));
    }

    #[test]
    fn wrong_secret_fails() {
        let sig = sign("secret-a", b"body");
        assert!(matches!(
            verify_signature("secret-b", Some(&sig), b"body"),
            Err(SignatureError::Invalid)
        ));
    }

    #[test]
    fn missing_and_undecodable_headers() {
        assert!(matches!(
            verify_signature("s", None, b"body"),
            Err(SignatureError::Missing)
        ));
        assert!(matches!(
            verify_signature("s", Some("%%% not base64 %%%"), b"body"),
            Err(SignatureError::Invalid)
        ));
    }

    #[test]
    fn parse_envelope_filters_via_text_message() {
        let body = br#"{
            "destination": "U1234",
            "events": [
                {"type": "follow", "replyToken": "r0"},
                {"type": "message", "replyToken": "r1", "message": {"type": "text", "id": "m1", "text": "hello"}},
                {"type": "message", "replyToken": "r2", "message": {"type": "sticker", "id": "m2"}},
                {"type": "message", "message": {"type": "text", "id": "m3", "text": "no token"}}
            ]
        }"#;
        let envelope = parse_envelope(body).expect("valid payload");
        assert_eq!(envelope.destination.as_deref(), Some("U1234"));
        assert_eq!(envelope.events.len(), 4);
        assert_eq!(envelope.events[0].text_message(), None);
        assert_eq!(envelope.events[1].text_message(), Some(("r1", "hello")));
        assert_eq!(envelope.events[2].text_message(), None);
        assert_eq!(envelope.events[3].text_message(), None);
    }
}
