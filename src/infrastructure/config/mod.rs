//! Configuration management

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use crate::application::errors::ConfigError;

/// Bot configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    pub bot: BotConfig,
    pub commands: CommandsConfig,
    pub guard: GuardConfig,
    pub adapters: AdaptersConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct BotConfig {
    pub name: String,
    /// Character that marks a message as a command
    pub trigger: char,
    /// Status line advertised by adapters that support one
    pub status: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct CommandsConfig {
    /// JSON file holding learned commands
    pub store: PathBuf,
    /// Permission tokens allowed to run learn, forget and del
    pub admin_permissions: Vec<String>,
}

/// Users that must not be pinged
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct GuardConfig {
    pub enabled: bool,
    pub protected_users: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct AdaptersConfig {
    pub telegram: Option<TelegramConfig>,
    pub console: Option<ConsoleConfig>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct TelegramConfig {
    pub enabled: bool,
    pub token: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct ConsoleConfig {
    pub enabled: bool,
    /// Permission tokens granted to whoever types at the console
    pub permissions: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bot: BotConfig {
                name: "halp-bot".to_string(),
                trigger: '!',
                status: "!list".to_string(),
            },
            commands: CommandsConfig {
                store: PathBuf::from("commands.json"),
                admin_permissions: vec![
                    "halp-admin".to_string(),
                    "creator".to_string(),
                    "administrator".to_string(),
                ],
            },
            guard: GuardConfig {
                enabled: true,
                protected_users: vec!["dags".to_string(), "won_ton".to_string()],
            },
            adapters: AdaptersConfig {
                telegram: Some(TelegramConfig {
                    enabled: false,
                    token: None,
                }),
                console: Some(ConsoleConfig {
                    enabled: true,
                    permissions: vec!["halp-admin".to_string()],
                }),
            },
        }
    }
}

impl Config {
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let content = std::fs::read_to_string(&path)
            .map_err(|e| ConfigError::Parse(format!("Failed to read config: {}", e)))?;

        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_yaml::from_str(content)
            .map_err(|e| ConfigError::Parse(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        serde_yaml::to_string(self)
            .map_err(|e| ConfigError::Parse(format!("Failed to serialize config: {}", e)))
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.bot.trigger.is_whitespace() {
            return Err(ConfigError::InvalidValue("bot.trigger must not be whitespace".to_string()));
        }
        if self.commands.admin_permissions.is_empty() {
            return Err(ConfigError::InvalidValue(
                "commands.admin-permissions must list at least one permission".to_string(),
            ));
        }
        Ok(())
    }

    pub fn load_env() -> Self {
        // Load from environment variables
        let mut config = Config::default();

        if let Ok(token) = std::env::var("BOT_TOKEN") {
            config.set_telegram_token(token);
        }

        if let Ok(trigger) = std::env::var("BOT_TRIGGER") {
            match trigger.chars().next() {
                Some(c) if !c.is_whitespace() => config.bot.trigger = c,
                _ => tracing::warn!("Ignoring invalid BOT_TRIGGER: {:?}", trigger),
            }
        }

        config
    }

    /// Enable the Telegram adapter with `token`
    pub fn set_telegram_token(&mut self, token: impl Into<String>) {
        let tg = self.adapters.telegram.get_or_insert(TelegramConfig {
            enabled: true,
            token: None,
        });
        tg.token = Some(token.into());
        tg.enabled = true;
    }

    /// Token of the Telegram adapter when it is enabled
    pub fn telegram_token(&self) -> Option<&str> {
        self.adapters
            .telegram
            .as_ref()
            .filter(|t| t.enabled)
            .and_then(|t| t.token.as_deref())
    }

    pub fn console_permissions(&self) -> Vec<String> {
        self.adapters
            .console
            .as_ref()
            .map(|c| c.permissions.clone())
            .unwrap_or_default()
    }
}
