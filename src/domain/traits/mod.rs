//! Domain traits - Abstractions for infrastructure implementations

pub mod bot;
pub mod caller;
pub mod store;

pub use bot::{Bot, BotInfo};
pub use caller::{Caller, StaticCaller};
pub use store::{CannedCommands, CommandStore};
