//! Config schema types (server, whatsapp, openai, database, chat).
use {
    secrecy::{ExposeSecret, Secret},
    serde::{Deserialize, Serialize},
};

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ParleyConfig {
    pub server: ServerConfig,
    pub whatsapp: WhatsAppConfig,
    pub openai: OpenAiConfig,
    pub database: DatabaseConfig,
    pub chat: ChatConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind to. Defaults to "0.0.0.0".
    pub bind: String,
    /// Port to listen on. Defaults to 8000.
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0".into(),
            port: 8000,
        }
    }
}

/// WhatsApp Cloud API credentials and endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WhatsAppConfig {
    /// Permanent or system-user access token.
    #[serde(
        serialize_with = "serialize_option_secret",
        skip_serializing_if = "Option::is_none"
    )]
    pub token: Option<Secret<String>>,
    /// Graph API base URL, e.g. `https://graph.facebook.com/v21.0`.
    pub api_url: Option<String>,
    /// Business phone number ID the bot sends from.
    pub phone_number_id: Option<String>,
    /// Token echoed back during the webhook subscription handshake.
    #[serde(
        serialize_with = "serialize_option_secret",
        skip_serializing_if = "Option::is_none"
    )]
    pub verify_token: Option<Secret<String>>,
    /// Per-request timeout for the send API.
    pub request_timeout_secs: u64,
}

impl Default for WhatsAppConfig {
    fn default() -> Self {
        Self {
            token: None,
            api_url: None,
            phone_number_id: None,
            verify_token: None,
            request_timeout_secs: 30,
        }
    }
}

/// OpenAI Responses API settings for reply generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenAiConfig {
    #[serde(
        serialize_with = "serialize_option_secret",
        skip_serializing_if = "Option::is_none"
    )]
    pub api_key: Option<Secret<String>>,
    pub base_url: String,
    pub model: String,
    /// Vector store backing the file-search tool (the knowledge base).
    pub vector_store_id: Option<String>,
    /// Upper bound on file-search hits per call.
    pub max_num_results: u32,
    /// Whether the web-search tool is offered to the model.
    pub web_search: bool,
    /// Per-request timeout; web search makes calls slow, keep this generous.
    pub request_timeout_secs: u64,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://api.openai.com/v1".into(),
            model: "gpt-4o-mini".into(),
            vector_store_id: None,
            max_num_results: 20,
            web_search: true,
            request_timeout_secs: 120,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// sqlx connection string, e.g. `sqlite:parley.db?mode=rwc`.
    pub url: Option<String>,
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            max_connections: 5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// Number of past messages sent to the model with each text event.
    pub history_limit: u32,
    /// Name stored for senders whose webhook contact carries no profile name.
    pub default_display_name: String,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            history_limit: 5,
            default_display_name: "User".into(),
        }
    }
}

fn serialize_option_secret<S: serde::Serializer>(
    secret: &Option<Secret<String>>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match secret {
        Some(s) => serializer.serialize_some(s.expose_secret()),
        None => serializer.serialize_none(),
    }
}
