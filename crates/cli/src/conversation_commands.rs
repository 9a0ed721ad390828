//! `parley send` and `parley history`: one-off operations against the
//! configured WhatsApp number and database.

use std::path::Path;

use {
    anyhow::Context,
    parley_channels::{ChannelOutbound, DeliveryOutcome},
    parley_config::ParleyConfig,
    parley_store::{ConversationStore, SqliteConversationStore},
    parley_whatsapp::{WhatsAppAccountConfig, WhatsAppOutbound},
};

/// File plus environment overrides, without the full startup validation:
/// each command checks only the settings it needs.
fn load_config(path: Option<&Path>) -> anyhow::Result<ParleyConfig> {
    let mut config = match path {
        Some(path) => parley_config::load_config(path)?,
        None => parley_config::discover_and_load()?,
    };
    parley_config::apply_env_overrides(&mut config, |name| std::env::var(name).ok());
    Ok(config)
}

pub async fn send(config_path: Option<&Path>, to: &str, message: &str) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let account = WhatsAppAccountConfig::try_from(&config.whatsapp)?;
    let outbound = WhatsAppOutbound::new(account)?;

    match outbound.send_text(to, message).await {
        DeliveryOutcome::Delivered(response) => {
            println!("{}", serde_json::to_string_pretty(&response)?);
            Ok(())
        },
        DeliveryOutcome::Failed(e) => anyhow::bail!("delivery to {to} failed: {e}"),
    }
}

pub async fn history(
    config_path: Option<&Path>,
    phone: &str,
    limit: Option<u32>,
) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let url = config
        .database
        .url
        .as_deref()
        .context("database.url is not set")?;
    let pool = parley_store::connect(url, 1).await?;
    parley_store::run_migrations(&pool).await?;
    let store = SqliteConversationStore::new(pool);

    let turns = store
        .recent_messages(phone, limit.unwrap_or(config.chat.history_limit))
        .await?;
    if turns.is_empty() {
        println!("No messages for {phone}.");
        return Ok(());
    }
    for turn in &turns {
        println!("[{:<9}] {}", turn.role.as_str(), turn.content);
    }
    Ok(())
}
