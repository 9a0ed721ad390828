use std::sync::Arc;

use {
    anyhow::Context,
    axum::{
        Router,
        extract::State,
        response::{IntoResponse, Json},
        routing::get,
    },
    parley_agents::OpenAiResponsesGenerator,
    parley_chat::ConversationOrchestrator,
    parley_config::ParleyConfig,
    parley_store::SqliteConversationStore,
    parley_whatsapp::{WebhookRouter, WhatsAppAccountConfig, WhatsAppOutbound},
    tokio::net::TcpListener,
    tower_http::{
        cors::{Any, CorsLayer},
        trace::TraceLayer,
    },
    tracing::{info, warn},
};

use crate::{state::GatewayState, webhook_routes::webhook_router};

#[derive(Clone)]
pub struct AppState {
    pub gateway: Arc<GatewayState>,
}

/// Build the gateway router (shared between production startup and tests).
pub fn build_gateway_app(state: Arc<GatewayState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_handler))
        .merge(webhook_router())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(AppState { gateway: state })
}

/// Open the database, run migrations and wire the message pipeline from a
/// validated config.
pub async fn prepare_gateway(config: &ParleyConfig) -> anyhow::Result<Arc<GatewayState>> {
    let database_url = config
        .database
        .url
        .as_deref()
        .context("database.url is not set")?;
    let pool = parley_store::connect(database_url, config.database.max_connections).await?;
    parley_store::run_migrations(&pool).await?;
    let store = Arc::new(SqliteConversationStore::new(pool));

    let account = WhatsAppAccountConfig::try_from(&config.whatsapp)?;
    let verify_token = account.verify_token.clone();
    let outbound = Arc::new(WhatsAppOutbound::new(account)?);
    let generator = Arc::new(OpenAiResponsesGenerator::from_config(&config.openai)?);

    let orchestrator = ConversationOrchestrator::new(store, generator, outbound)
        .with_history_limit(config.chat.history_limit)
        .with_default_display_name(config.chat.default_display_name.clone());
    let router = WebhookRouter::new(Arc::new(orchestrator));

    Ok(Arc::new(GatewayState::new(router, verify_token)))
}

/// Start the HTTP server and block until Ctrl-C.
pub async fn start_gateway(bind: &str, port: u16, config: &ParleyConfig) -> anyhow::Result<()> {
    let state = prepare_gateway(config).await?;
    let app = build_gateway_app(Arc::clone(&state));

    let listener = TcpListener::bind((bind, port))
        .await
        .with_context(|| format!("failed to bind {bind}:{port}"))?;
    let addr = listener.local_addr()?;

    let lines = [
        format!("parley gateway v{}", state.version),
        format!("listening: http://{addr}"),
        "webhook: /webhook".to_string(),
        format!("model: {}", config.openai.model),
        format!("history limit: {}", config.chat.history_limit),
    ];
    let width = lines.iter().map(|l| l.len()).max().unwrap_or(0) + 4;
    info!("┌{}┐", "─".repeat(width));
    for line in &lines {
        info!("│  {:<w$}│", line, w = width - 2);
    }
    info!("└{}┘", "─".repeat(width));

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("gateway stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to install Ctrl-C handler");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}

async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "version": state.gateway.version,
    }))
}
