use {
    async_trait::async_trait,
    parley_channels::{ChannelOutbound, DeliveryError, DeliveryOutcome},
    secrecy::ExposeSecret,
    serde_json::{Value, json},
    tracing::{debug, error, info},
};

use crate::config::WhatsAppAccountConfig;

/// Outbound sender for the WhatsApp Cloud API.
pub struct WhatsAppOutbound {
    http: reqwest::Client,
    config: WhatsAppAccountConfig,
}

impl WhatsAppOutbound {
    /// Build a sender with its own HTTP client honouring the configured
    /// request timeout.
    pub fn new(config: WhatsAppAccountConfig) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self::with_client(config, http))
    }

    pub fn with_client(config: WhatsAppAccountConfig, http: reqwest::Client) -> Self {
        Self { http, config }
    }

    #[must_use]
    pub fn config(&self) -> &WhatsAppAccountConfig {
        &self.config
    }

    /// One POST to the messages endpoint. Non-2xx answers become
    /// [`DeliveryError::Status`] carrying the raw body.
    pub async fn send_message(&self, payload: &Value) -> Result<Value, DeliveryError> {
        let url = self.config.messages_url();
        debug!(%url, "whatsapp send request");

        let resp = self
            .http
            .post(&url)
            .bearer_auth(self.config.token.expose_secret())
            .json(payload)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(DeliveryError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body = resp.text().await?;
        serde_json::from_str(&body).map_err(|source| DeliveryError::Decode { body, source })
    }
}

/// JSON envelope for a plain text message.
#[must_use]
pub fn text_payload(to: &str, text: &str) -> Value {
    json!({
        "messaging_product": "whatsapp",
        "to": to,
        "type": "text",
        "text": { "body": text },
    })
}

#[async_trait]
impl ChannelOutbound for WhatsAppOutbound {
    async fn send_text(&self, to: &str, text: &str) -> DeliveryOutcome {
        match self.send_message(&text_payload(to, text)).await {
            Ok(response) => {
                info!(to, %response, "message sent");
                DeliveryOutcome::Delivered(response)
            },
            Err(e) => {
                error!(to, error = %e, "failed to send message");
                DeliveryOutcome::Failed(e)
            },
        }
    }
}
