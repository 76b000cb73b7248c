//! Event routing: filter a verified callback's events and reply to each.

use crate::answer::AnswerClient;
use crate::behavior;
use crate::config::TenantConfig;
use crate::line::{InboundEvent, ReplySender};

/// Process one verified callback batch for a tenant.
///
/// Only text message events are answered; other kinds are skipped without a
/// reply. Events are handled sequentially in payload order, and a failed
/// delivery for one event does not stop the rest of the batch.
pub async fn route_events(
    name: &str,
    tenant: &TenantConfig,
    answers: &AnswerClient,
    sender: &dyn ReplySender,
    events: &[InboundEvent],
) {
    for event in events {
        let Some((reply_token, text)) = event.text_message() else {
            log::debug!("{}: skipping {} event", name, event.kind);
            continue;
        };
        let Some(reply) = behavior::dispatch(name, tenant, answers, text).await else {
            continue;
        };
        if let Err(e) = sender.reply(reply_token, &reply).await {
            log::warn!("{}: reply delivery failed: {}", name, e);
        }
    }
}
