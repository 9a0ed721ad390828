use std::time::Duration;

use {
    parley_config::{Error, WhatsAppConfig},
    secrecy::{ExposeSecret, Secret},
};

/// Resolved credentials and endpoint for one WhatsApp Business number.
#[derive(Clone)]
pub struct WhatsAppAccountConfig {
    /// Graph API base, e.g. `https://graph.facebook.com/v21.0`.
    pub api_url: String,
    pub phone_number_id: String,
    pub token: Secret<String>,
    /// Shared secret for the webhook subscription handshake.
    pub verify_token: Secret<String>,
    pub request_timeout: Duration,
}

impl std::fmt::Debug for WhatsAppAccountConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WhatsAppAccountConfig")
            .field("api_url", &self.api_url)
            .field("phone_number_id", &self.phone_number_id)
            .field("token", &"[REDACTED]")
            .field("verify_token", &"[REDACTED]")
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

impl WhatsAppAccountConfig {
    /// `{api_url}/{phone_number_id}/messages`, tolerating a trailing slash on
    /// the base URL.
    #[must_use]
    pub fn messages_url(&self) -> String {
        format!(
            "{}/{}/messages",
            self.api_url.trim_end_matches('/'),
            self.phone_number_id
        )
    }

    #[must_use]
    pub fn verify_token(&self) -> &str {
        self.verify_token.expose_secret()
    }
}

impl TryFrom<&WhatsAppConfig> for WhatsAppAccountConfig {
    type Error = Error;

    fn try_from(cfg: &WhatsAppConfig) -> Result<Self, Self::Error> {
        fn required<T: Clone>(value: &Option<T>, key: &str) -> Result<T, Error> {
            value
                .clone()
                .ok_or_else(|| Error::message(format!("whatsapp.{key} is not set")))
        }

        Ok(Self {
            api_url: required(&cfg.api_url, "api_url")?,
            phone_number_id: required(&cfg.phone_number_id, "phone_number_id")?,
            token: required(&cfg.token, "token")?,
            verify_token: required(&cfg.verify_token, "verify_token")?,
            request_timeout: Duration::from_secs(cfg.request_timeout_secs),
        })
    }
}
