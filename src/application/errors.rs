//! Application layer errors

use thiserror::Error;

/// General bot errors
#[derive(Error, Debug)]
pub enum BotError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Input that is not a command invocation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("Input is not a command")]
    NotACommand,
}

/// Registry mutation errors
///
/// The display text is the reply sent back to the chat.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Cannot replace that command")]
    CannotReplace(String),

    #[error("Command does not exist")]
    NotFound(String),

    #[error("Command cannot be unregistered")]
    CannotUnregister(String),
}

impl RegistryError {
    /// Name of the command the failed mutation targeted
    pub fn name(&self) -> &str {
        match self {
            RegistryError::CannotReplace(name)
            | RegistryError::NotFound(name)
            | RegistryError::CannotUnregister(name) => name,
        }
    }
}

/// Storage errors
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("No command store configured")]
    Unconfigured,
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid value: {0}")]
    InvalidValue(String),

    #[error("Parse error: {0}")]
    Parse(String),
}
