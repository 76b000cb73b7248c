//! Behavior dispatch: decide what to reply for one inbound text.

use crate::answer::AnswerClient;
use crate::config::{BehaviorType, TenantConfig};

/// Reply sent when the external API call fails.
pub const PROCESSING_ERROR_REPLY: &str = "Sorry, I encountered an error processing your request.";

/// Reply sent when the external API produced no usable text.
pub const EMPTY_ANSWER_REPLY: &str = "Sorry, I couldn't generate a response.";

/// Fixed reply for the periodicSummary behavior.
pub const SUMMARY_REPLY: &str = "This is a periodic summary.";

/// Decide the outbound text for one inbound message. `None` means no reply.
pub async fn dispatch(
    name: &str,
    tenant: &TenantConfig,
    answers: &AnswerClient,
    text: &str,
) -> Option<String> {
    match tenant.behavior_type {
        BehaviorType::Echo => Some(text.to_string()),
        BehaviorType::Bypass => Some(bypass(name, tenant, answers, text).await),
        BehaviorType::PeriodicSummary => Some(SUMMARY_REPLY.to_string()),
        BehaviorType::Unknown => {
            log::debug!("{}: unknown behavior type, ignoring message", name);
            None
        }
    }
}

/// Forward text to the tenant's external API. Answer failures collapse into
/// apology replies; they never escalate past this event.
async fn bypass(name: &str, tenant: &TenantConfig, answers: &AnswerClient, text: &str) -> String {
    let question = effective_question(tenant, text);
    let url = tenant.api_url.as_deref().unwrap_or_default();
    match answers
        .ask(
            url,
            tenant.api_auth_token.as_deref(),
            tenant.api_auth_scheme,
            question,
        )
        .await
    {
        Ok(answer) if answer.trim().is_empty() => {
            log::debug!("{}: empty answer from external api", name);
            EMPTY_ANSWER_REPLY.to_string()
        }
        Ok(answer) => answer,
        Err(e) => {
            log::warn!("{}: external api error: {}", name, e);
            PROCESSING_ERROR_REPLY.to_string()
        }
    }
}

/// The text forwarded upstream: at most one leading '/' is stripped, and only
/// for tenants that opted in.
fn effective_question<'a>(tenant: &TenantConfig, text: &'a str) -> &'a str {
    if tenant.strip_command_prefix {
        text.strip_prefix('/').unwrap_or(text)
    } else {
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn answers() -> AnswerClient {
        AnswerClient::new(Duration::from_secs(5))
    }

    fn tenant(behavior_type: BehaviorType) -> TenantConfig {
        TenantConfig {
            behavior_type,
            signing_secret: "s".to_string(),
            delivery_token: "t".to_string(),
            ..TenantConfig::default()
        }
    }

    #[tokio::test]
    async fn echo_returns_text_verbatim() {
        let reply = dispatch("t", &tenant(BehaviorType::Echo), &answers(), "hello").await;
        assert_eq!(reply.as_deref(), Some("hello"));
    }

    #[tokio::test]
    async fn periodic_summary_ignores_input() {
        let t = tenant(BehaviorType::PeriodicSummary);
        let a = answers();
        for text in ["hello", "", "/cmd"] {
            let reply = dispatch("t", &t, &a, text).await;
            assert_eq!(reply.as_deref(), Some(SUMMARY_REPLY));
        }
    }

    #[tokio::test]
    async fn unknown_behavior_sends_nothing() {
        let reply = dispatch("t", &tenant(BehaviorType::Unknown), &answers(), "hello").await;
        assert_eq!(reply, None);
    }

    #[test]
    fn command_prefix_stripping_is_opt_in() {
        let mut t = tenant(BehaviorType::Bypass);
        assert_eq!(effective_question(&t, "/ask me"), "/ask me");
        t.strip_command_prefix = true;
        assert_eq!(effective_question(&t, "/ask me"), "ask me");
        assert_eq!(effective_question(&t, "no prefix"), "no prefix");
        assert_eq!(effective_question(&t, "//double"), "/double");
    }
}
