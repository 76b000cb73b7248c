//! LINE platform plumbing: webhook verification and parsing, plus the
//! Messaging API reply client.

mod messaging;
mod webhook;

pub use messaging::{line_api_base, DeliveryError, LineClient, ReplySender};
pub use webhook::{
    parse_envelope, sign, verify_signature, InboundEvent, MessageContent, SignatureError,
    WebhookEnvelope, SIGNATURE_HEADER,
};
