//! Domain entities - Core business objects

pub mod user;
pub mod message;
pub mod input;
pub mod permission;
pub mod command;

pub use user::User;
pub use message::Message;
pub use input::Input;
pub use permission::{PermissionCache, PermissionSet};
pub use command::{Command, CommandFn, Context, Executor, Handler};
