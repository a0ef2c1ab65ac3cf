use clap::{Parser, Subcommand};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::mpsc;

use genesis_bot::application::errors::{BotError, ConfigError};
use genesis_bot::application::messaging::Dispatcher;
use genesis_bot::commands::{self, CommandDeps};
use genesis_bot::domain::entities::{CommandRegistry, OwnerSet};
use genesis_bot::domain::traits::{BalanceStore, Platform, TokenMetadataSource};
use genesis_bot::infrastructure::adapters::{ConsoleGateway, ConsolePlatform, DiscordRestPlatform};
use genesis_bot::infrastructure::config::{Config, StorageBackend};
use genesis_bot::infrastructure::database::SqliteStore;
use genesis_bot::infrastructure::opensea::OpenSeaClient;
use genesis_bot::infrastructure::storage::MemoryStore;

/// Events buffered between the gateway and the dispatcher
const EVENT_BUFFER: usize = 256;

#[derive(Parser)]
#[command(name = "genesis-bot")]
#[command(about = "Slash-command bot with owner-only admin commands", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(short, long, default_value = "config.yaml")]
    config: String,

    /// Bot token (overrides config)
    #[arg(short, long)]
    token: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the bot
    Run,
    /// Show version
    Version,
    /// Generate default config
    InitConfig,
    /// Print the command manifest that would be published
    Commands,
}

fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run => run(&cli.config, cli.token),
        Commands::Version => {
            println!("genesis-bot v{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        Commands::InitConfig => init_config(),
        Commands::Commands => print_commands(),
    };

    if let Err(e) = result {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}

fn run(config_path: &str, token_override: Option<String>) -> Result<(), BotError> {
    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| BotError::Internal(format!("Failed to start runtime: {}", e)))?;
    rt.block_on(run_bot(config_path, token_override))
}

fn load_config(path: &str) -> Result<Config, BotError> {
    let mut config = if Path::new(path).exists() {
        Config::load(path)?
    } else {
        tracing::warn!("{} not found, using defaults", path);
        Config::default()
    };
    config.apply_env()?;
    Ok(config)
}

async fn run_bot(config_path: &str, token_override: Option<String>) -> Result<(), BotError> {
    let mut config = load_config(config_path)?;
    if token_override.is_some() {
        config.platform.token = token_override;
    }
    config.validate()?;

    tracing::info!("Starting {}", config.bot.name);

    let store: Arc<dyn BalanceStore> = match config.storage.backend {
        StorageBackend::Memory => Arc::new(MemoryStore::new()),
        StorageBackend::Sqlite => {
            let store = SqliteStore::open(&config.storage.path)?;
            tracing::info!("Database opened at {}", config.storage.path.display());
            Arc::new(store)
        }
    };

    let metadata: Option<Arc<dyn TokenMetadataSource>> =
        match OpenSeaClient::from_env(&config.opensea.endpoint, &config.opensea.contract, &config.opensea.api_key_env) {
            Ok(client) => Some(Arc::new(client)),
            Err(e) => {
                tracing::warn!("Token metadata unavailable: {}", e);
                None
            }
        };

    let deps = CommandDeps {
        store,
        owners: Arc::new(config.owner_set()),
        metadata,
    };
    let registry = CommandRegistry::build(commands::all(&deps))?;

    let (platform, console_mode): (Arc<dyn Platform>, bool) =
        match (config.platform.token.clone(), config.platform.application_id) {
            (Some(token), Some(application_id)) => (
                Arc::new(DiscordRestPlatform::new(&config.platform.api_base, application_id, token)),
                false,
            ),
            (Some(_), None) => {
                return Err(ConfigError::MissingField("platform.application-id".to_string()).into());
            }
            (None, _) => {
                tracing::info!("No bot token configured, running console bot (dev mode)");
                (Arc::new(ConsolePlatform::new()), true)
            }
        };

    // Subscribe before publishing; events queue until the dispatcher exists.
    let (events_tx, events_rx) = mpsc::channel(EVENT_BUFFER);
    if !console_mode {
        tracing::info!("Reading gateway events as JSON lines from stdin");
    }
    tokio::spawn(ConsoleGateway::new(config.console.clone()).run(events_tx));

    let scope = config.command_scope()?;
    let ready = registry.publish(platform.as_ref(), scope).await?;

    if let Some(status) = config.status() {
        tracing::info!("Status: {} {}", status.activity.as_str(), status.text);
    }

    let dispatcher = Arc::new(Dispatcher::new(ready, platform).with_settings(config.dispatch_settings()));
    tracing::info!("Bot connected and ready!");

    tokio::select! {
        _ = dispatcher.run(events_rx) => {}
        _ = tokio::signal::ctrl_c() => tracing::info!("Shutting down"),
    }
    Ok(())
}

fn init_config() -> Result<(), BotError> {
    let yaml = serde_yaml::to_string(&Config::default())
        .map_err(|e| ConfigError::Parse(e.to_string()))?;
    println!("{}", yaml);
    println!("\nSave this to config.yaml and adjust as needed.");
    Ok(())
}

fn print_commands() -> Result<(), BotError> {
    let deps = CommandDeps {
        store: Arc::new(MemoryStore::new()),
        owners: Arc::new(OwnerSet::default()),
        metadata: None,
    };
    let registry = CommandRegistry::build(commands::all(&deps))?;
    let json = serde_json::to_string_pretty(&registry.manifest())
        .map_err(|e| BotError::Internal(e.to_string()))?;
    println!("{}", json);
    Ok(())
}
