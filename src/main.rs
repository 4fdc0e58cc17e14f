use clap::{Parser, Subcommand};
use std::process::ExitCode;
use std::sync::Arc;

use halp_bot::application::errors::BotError;
use halp_bot::application::messaging::{InputParser, MentionGuard, MessageDispatcher};
use halp_bot::application::services::{register_builtins, CommandRegistry};
use halp_bot::domain::traits::Bot;
use halp_bot::infrastructure::adapters::{ConsoleAdapter, TelegramAdapter};
use halp_bot::infrastructure::config::Config;
use halp_bot::infrastructure::storage::JsonStore;

#[derive(Parser)]
#[command(name = "halp-bot")]
#[command(about = "A chat bot that learns canned replies", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(short, long, default_value = "config.yaml")]
    config: String,

    /// Telegram bot token (overrides config)
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
}

fn main() -> ExitCode {
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
        Commands::Run => run_bot(&cli.config, cli.token),
        Commands::Version => {
            println!("halp-bot v{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        Commands::InitConfig => init_config(),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn load_config(config_path: &str, token_override: Option<String>) -> Config {
    let mut config = if std::path::Path::new(config_path).exists() {
        Config::load(config_path).unwrap_or_else(|e| {
            tracing::warn!("Failed to load config: {}, using defaults", e);
            Config::load_env()
        })
    } else {
        Config::load_env()
    };

    if let Some(token) = token_override {
        config.set_telegram_token(token);
    }
    config
}

fn run_bot(config_path: &str, token_override: Option<String>) -> Result<(), BotError> {
    let config = load_config(config_path, token_override);
    tracing::info!("Starting {}", config.bot.name);

    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| BotError::Internal(format!("Failed to start runtime: {}", e)))?;

    match config.telegram_token().map(str::to_string) {
        Some(token) => rt.block_on(run_telegram_bot(&config, token)),
        None => rt.block_on(run_console_bot(&config)),
    }
}

/// Registry with the built-in commands plus whatever was learned before
fn build_registry(config: &Config, bot: Arc<dyn Bot>) -> Arc<CommandRegistry> {
    let registry = CommandRegistry::new(InputParser::new(config.bot.trigger))
        .with_store(JsonStore::new(&config.commands.store));

    register_builtins(&registry, &config.commands.admin_permissions, bot);
    registry.load();

    Arc::new(registry)
}

fn build_dispatcher(config: &Config, registry: Arc<CommandRegistry>) -> MessageDispatcher {
    let dispatcher = MessageDispatcher::new(registry);
    if config.guard.enabled {
        dispatcher.with_guard(MentionGuard::new(&config.guard.protected_users))
    } else {
        dispatcher
    }
}

async fn run_telegram_bot(config: &Config, token: String) -> Result<(), BotError> {
    let mut adapter = TelegramAdapter::new(token);
    adapter.fetch_bot_info().await?;
    adapter.start().await?;

    let info = adapter.bot_info();
    tracing::info!("Bot started: @{}", info.username);

    if let Err(e) = adapter.set_status(&config.bot.status).await {
        tracing::warn!("Failed to set status: {}", e);
    }

    let adapter = Arc::new(adapter);
    let registry = build_registry(config, adapter.clone());
    if let Err(e) = adapter.set_commands(&registry).await {
        tracing::warn!("Failed to set commands: {}", e);
    }
    let dispatcher = Arc::new(build_dispatcher(config, Arc::clone(&registry)));

    let result = tokio::select! {
        result = Arc::clone(&adapter).run(dispatcher) => result,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutting down");
            Ok(())
        }
    };

    registry.save().await;
    result
}

async fn run_console_bot(config: &Config) -> Result<(), BotError> {
    let adapter = Arc::new(ConsoleAdapter::new(config.console_permissions()));
    adapter.start().await?;

    let registry = build_registry(config, adapter.clone());
    let dispatcher = build_dispatcher(config, Arc::clone(&registry));

    let result = tokio::select! {
        result = adapter.run(&dispatcher) => result,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutting down");
            Ok(())
        }
    };

    registry.save().await;
    result
}

fn init_config() -> Result<(), BotError> {
    let yaml = Config::default().to_yaml()?;
    println!("{}", yaml);
    println!("\nSave this to config.yaml and adjust as needed.");
    Ok(())
}
