use std::sync::Arc;

use {
    async_trait::async_trait,
    parley_agents::ReplyGenerator,
    parley_channels::{ChannelOutbound, DeliveryOutcome, EventOutcome},
    parley_common::{HistoryTurn, Role},
    parley_store::{ConversationStore, DEFAULT_DISPLAY_NAME, DEFAULT_HISTORY_LIMIT},
    parley_whatsapp::{
        Contact, MessageHandler, PayloadError, WebhookMessage, types::first_contact_name,
    },
    tracing::{debug, error, warn},
};

use crate::error::Result;

/// Media types that get the "thanks" acknowledgement wording.
const MEDIA_TYPES: &[&str] = &["image", "document"];

/// Acknowledgement sent for a non-text message of the given type.
#[must_use]
pub fn acknowledgement(message_type: &str) -> String {
    if MEDIA_TYPES.contains(&message_type) {
        format!("Thanks for the {message_type}! We've received it.")
    } else {
        format!("We received your {message_type}. Thank you!")
    }
}

/// Drives one inbound message through storage, reply generation and
/// delivery. Holds no per-conversation state.
pub struct ConversationOrchestrator {
    store: Arc<dyn ConversationStore>,
    generator: Arc<dyn ReplyGenerator>,
    outbound: Arc<dyn ChannelOutbound>,
    history_limit: u32,
    default_display_name: String,
}

impl ConversationOrchestrator {
    pub fn new(
        store: Arc<dyn ConversationStore>,
        generator: Arc<dyn ReplyGenerator>,
        outbound: Arc<dyn ChannelOutbound>,
    ) -> Self {
        Self {
            store,
            generator,
            outbound,
            history_limit: DEFAULT_HISTORY_LIMIT,
            default_display_name: DEFAULT_DISPLAY_NAME.to_string(),
        }
    }

    #[must_use]
    pub fn with_history_limit(mut self, limit: u32) -> Self {
        self.history_limit = limit;
        self
    }

    #[must_use]
    pub fn with_default_display_name(mut self, name: impl Into<String>) -> Self {
        self.default_display_name = name.into();
        self
    }

    /// Run the pipeline for one message. `Err` means nothing was sent;
    /// a failed send is reported inside the returned outcome.
    pub async fn process(
        &self,
        message: &WebhookMessage,
        contacts: &[Contact],
    ) -> Result<DeliveryOutcome> {
        let from = message
            .from
            .as_deref()
            .ok_or_else(|| PayloadError::missing("from"))?;
        let display_name = first_contact_name(contacts)
            .filter(|name| !name.is_empty())
            .unwrap_or(self.default_display_name.as_str());

        let user_id = self
            .store
            .resolve_or_create_user(from, display_name)
            .await?;
        debug!(from, user_id = %user_id, message_type = message.kind(), "handling message");

        let reply = match message.text_body() {
            Some(body) => self.reply_to_text(&user_id, from, body).await?,
            None => self.acknowledge(&user_id, from, message.kind()).await?,
        };

        Ok(self.outbound.send_text(from, &reply).await)
    }

    async fn reply_to_text(&self, user_id: &str, from: &str, body: &str) -> Result<String> {
        self.store
            .append_message(user_id, from, body, Role::User)
            .await?;

        let mut history = self.store.recent_messages(from, self.history_limit).await?;
        // The read normally already ends with the message just stored.
        if history.last().is_none_or(|last| last.content != body) {
            history.push(HistoryTurn::user(body));
        }

        let reply = self.generator.generate_reply(&history).await?;
        debug!(
            from,
            generator = self.generator.name(),
            model = self.generator.id(),
            turns = history.len(),
            "generated reply"
        );

        self.store
            .append_message(user_id, from, &reply, Role::Assistant)
            .await?;
        Ok(reply)
    }

    async fn acknowledge(&self, user_id: &str, from: &str, message_type: &str) -> Result<String> {
        let ack = acknowledgement(message_type);
        self.store
            .append_message(
                user_id,
                from,
                &format!("{message_type} received"),
                Role::Incoming,
            )
            .await?;
        self.store
            .append_message(user_id, from, &ack, Role::Assistant)
            .await?;
        Ok(ack)
    }
}

#[async_trait]
impl MessageHandler for ConversationOrchestrator {
    async fn handle(&self, message: &WebhookMessage, contacts: &[Contact]) -> EventOutcome {
        match self.process(message, contacts).await {
            Ok(DeliveryOutcome::Delivered(_)) => EventOutcome::Delivered,
            Ok(DeliveryOutcome::Failed(e)) => {
                warn!(from = ?message.from, error = %e, "reply not delivered");
                EventOutcome::DeliveryFailed
            },
            Err(e) => {
                error!(
                    from = ?message.from,
                    message_id = ?message.id,
                    error = %e,
                    "error processing message"
                );
                EventOutcome::ProcessingFailed
            },
        }
    }
}
