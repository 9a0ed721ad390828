use std::sync::Arc;

use {
    async_trait::async_trait,
    parley_channels::EventOutcome,
    tracing::{debug, error, info},
};

use crate::{
    error::PayloadError,
    types::{Contact, WHATSAPP_BUSINESS_OBJECT, WebhookMessage, WebhookPayload},
};

/// Handles one inbound message end to end.
///
/// Implementations report failures through [`EventOutcome`] and must not
/// panic: a bad event never affects its siblings in the same payload.
#[async_trait]
pub trait MessageHandler: Send + Sync {
    async fn handle(&self, message: &WebhookMessage, contacts: &[Contact]) -> EventOutcome;
}

/// What the router did with one webhook body.
#[derive(Debug)]
pub enum RouteOutcome {
    /// `object` was not a WhatsApp Business account.
    Ignored,
    /// The body claimed to be a WhatsApp webhook but its `entry`/`changes`
    /// envelope did not decode.
    Malformed(PayloadError),
    /// One outcome per dispatched message, in payload order.
    Processed(Vec<EventOutcome>),
}

impl RouteOutcome {
    /// Outcomes of dispatched messages (empty unless `Processed`).
    #[must_use]
    pub fn events(&self) -> &[EventOutcome] {
        match self {
            Self::Processed(events) => events,
            Self::Ignored | Self::Malformed(_) => &[],
        }
    }
}

/// Splits a webhook payload into message events.
#[derive(Clone)]
pub struct WebhookRouter {
    handler: Arc<dyn MessageHandler>,
}

impl WebhookRouter {
    pub fn new(handler: Arc<dyn MessageHandler>) -> Self {
        Self { handler }
    }

    /// Dispatch every message under every `messages` change, sequentially
    /// and in order. Other change fields (statuses, account updates) are
    /// skipped. A message that does not decode is reported as
    /// [`EventOutcome::ProcessingFailed`] and routing moves on.
    pub async fn route(&self, payload: serde_json::Value) -> RouteOutcome {
        let object = payload.get("object").and_then(serde_json::Value::as_str);
        if object != Some(WHATSAPP_BUSINESS_OBJECT) {
            debug!(?object, "ignoring webhook for foreign object");
            return RouteOutcome::Ignored;
        }

        let payload = match WebhookPayload::from_value(payload) {
            Ok(payload) => payload,
            Err(e) => {
                error!(error = %e, "error processing webhook payload");
                return RouteOutcome::Malformed(e);
            },
        };

        let mut outcomes = Vec::new();
        for entry in &payload.entry {
            for change in &entry.changes {
                if !change.carries_messages() {
                    debug!(field = %change.field, "ignoring non-message webhook change");
                    continue;
                }
                let messages = change.messages();
                let contacts = change.contacts();
                debug!(
                    phone_number_id = ?change.phone_number_id(),
                    messages = messages.len(),
                    "routing webhook change"
                );
                for raw in messages {
                    let message = match WebhookMessage::from_value(raw) {
                        Ok(message) => message,
                        Err(e) => {
                            error!(error = %e, "error handling message");
                            outcomes.push(EventOutcome::ProcessingFailed);
                            continue;
                        },
                    };
                    let outcome = self.handler.handle(&message, &contacts).await;
                    info!(
                        from = ?message.from,
                        message_type = message.kind(),
                        %outcome,
                        "processed whatsapp message"
                    );
                    outcomes.push(outcome);
                }
            }
        }
        RouteOutcome::Processed(outcomes)
    }
}

/// Verify the webhook subscription handshake (GET request).
///
/// Meta sends `hub.mode=subscribe`, `hub.verify_token` and `hub.challenge`.
/// Returns `Some(challenge)` when the mode is `subscribe` and the token
/// matches; any missing parameter fails verification.
pub fn verify_webhook_subscription(
    mode: Option<&str>,
    token: Option<&str>,
    challenge: Option<&str>,
    verify_token: &str,
) -> Option<String> {
    let mode = mode?;
    let token = token?;
    let challenge = challenge?;

    if mode == "subscribe" && constant_time_eq(token, verify_token) {
        Some(challenge.to_string())
    } else {
        None
    }
}

fn constant_time_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.bytes().zip(b.bytes()).fold(0, |acc, (x, y)| acc | (x ^ y)) == 0
}
