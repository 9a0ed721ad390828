use {
    parley_whatsapp::WebhookRouter,
    secrecy::{ExposeSecret, Secret},
};

/// Process-wide state shared by every request.
pub struct GatewayState {
    pub version: String,
    pub router: WebhookRouter,
    verify_token: Secret<String>,
}

impl GatewayState {
    pub fn new(router: WebhookRouter, verify_token: Secret<String>) -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            router,
            verify_token,
        }
    }

    pub fn verify_token(&self) -> &str {
        self.verify_token.expose_secret()
    }
}
