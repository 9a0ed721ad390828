mod conversation_commands;
mod doctor_commands;

use std::path::PathBuf;

use {
    clap::{Parser, Subcommand},
    tracing::info,
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

#[derive(Parser)]
#[command(name = "parley", about = "Parley: WhatsApp support assistant", version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Config file (defaults to ./parley.toml, then ~/.config/parley/).
    #[arg(long, global = true, env = "PARLEY_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,

    /// Address to bind to (overrides config value).
    #[arg(long, global = true)]
    bind: Option<String>,
    /// Port to listen on (overrides config value).
    #[arg(long, global = true)]
    port: Option<u16>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
enum Commands {
    /// Start the webhook server (default when no subcommand is provided).
    Serve,
    /// Send one WhatsApp text message.
    Send {
        /// Recipient phone number.
        #[arg(long)]
        to: String,
        #[arg(short, long)]
        message: String,
    },
    /// Print the stored conversation for a phone number.
    History {
        #[arg(long)]
        phone: String,
        /// Number of messages (defaults to `chat.history_limit`).
        #[arg(long)]
        limit: Option<u32>,
    },
    /// Validate configuration and check the database.
    Doctor,
}

fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    let registry = tracing_subscriber::registry().with(filter);

    if cli.json_logs {
        registry
            .with(fmt::layer().json().with_target(true).with_thread_ids(false))
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_ansi(true),
            )
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    init_telemetry(&cli);

    info!(version = env!("CARGO_PKG_VERSION"), "parley starting");

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => {
            let config = parley_config::load_resolved(cli.config.as_deref())?;

            // CLI args override config values
            let bind = cli.bind.unwrap_or_else(|| config.server.bind.clone());
            let port = cli.port.unwrap_or(config.server.port);

            parley_gateway::server::start_gateway(&bind, port, &config).await
        },
        Commands::Send { to, message } => {
            conversation_commands::send(cli.config.as_deref(), &to, &message).await
        },
        Commands::History { phone, limit } => {
            conversation_commands::history(cli.config.as_deref(), &phone, limit).await
        },
        Commands::Doctor => doctor_commands::handle_doctor(cli.config.as_deref()).await,
    }
}
