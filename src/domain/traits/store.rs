use std::collections::BTreeMap;

use crate::application::errors::StorageError;

/// Canned commands as stored: command name to reply lines
pub type CannedCommands = BTreeMap<String, Vec<String>>;

/// Store trait - abstraction for canned command persistence
pub trait CommandStore: Send + Sync {
    /// Read every stored command
    fn read(&self) -> Result<CannedCommands, StorageError>;

    /// Replace the stored commands with `commands`
    fn write(&self, commands: &CannedCommands) -> Result<(), StorageError>;
}
