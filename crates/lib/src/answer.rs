//! External question-answering client used by the bypass behavior.
//!
//! Upstream response shapes vary across deployments, so extraction scans a
//! fixed priority list of candidate fields instead of binding to one schema.

use crate::config::AuthScheme;
use serde_json::{Map, Value};
use std::time::Duration;

/// Candidate answer fields, tried in order. The first present field wins.
pub const ANSWER_FIELDS: [&str; 5] = ["answer", "response", "result", "output", "text"];

#[derive(Debug, thiserror::Error)]
pub enum AnswerError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("upstream returned {status}: {body}")]
    UpstreamStatus {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("upstream response is not a JSON object")]
    MalformedResponse,

    #[error("upstream response has none of the known answer fields")]
    UnexpectedShape,
}

/// Client for a tenant's external answer endpoint.
#[derive(Clone)]
pub struct AnswerClient {
    client: reqwest::Client,
}

impl AnswerClient {
    /// Build a client with an explicit round-trip timeout.
    pub fn new(timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .expect("building http client");
        Self { client }
    }

    /// POST `{"question": ...}` to `api_url` and extract the answer text.
    ///
    /// The Authorization header carries `auth_token` raw or Bearer-prefixed per
    /// the tenant's scheme, and is omitted when no token is configured.
    pub async fn ask(
        &self,
        api_url: &str,
        auth_token: Option<&str>,
        scheme: AuthScheme,
        question: &str,
    ) -> Result<String, AnswerError> {
        let mut req = self
            .client
            .post(api_url)
            .json(&serde_json::json!({ "question": question }));
        if let Some(token) = auth_token.map(str::trim).filter(|t| !t.is_empty()) {
            let value = match scheme {
                AuthScheme::Raw => token.to_string(),
                AuthScheme::Bearer => format!("Bearer {}", token),
            };
            req = req.header(reqwest::header::AUTHORIZATION, value);
        }
        let res = req.send().await?;
        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(AnswerError::UpstreamStatus { status, body });
        }
        let value: Value = res.json().await.map_err(|_| AnswerError::MalformedResponse)?;
        let object = value.as_object().ok_or(AnswerError::MalformedResponse)?;
        extract_answer(object)
    }
}

/// Pull a displayable answer out of a loosely-typed upstream response.
///
/// An explicit `success: false` wins: its `message` is relayed verbatim as the
/// answer text. Otherwise the first present field from [`ANSWER_FIELDS`] is
/// used, stringified when it is not already a string. A response carrying only
/// `success: true` yields an empty answer; the caller classifies emptiness.
pub fn extract_answer(object: &Map<String, Value>) -> Result<String, AnswerError> {
    if let Some(Value::Bool(false)) = object.get("success") {
        return Ok(object.get("message").map(stringify).unwrap_or_default());
    }
    if let Some(found) = ANSWER_FIELDS.iter().find_map(|field| object.get(*field)) {
        return Ok(stringify(found));
    }
    if object.contains_key("success") {
        return Ok(String::new());
    }
    Err(AnswerError::UnexpectedShape)
}

fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
