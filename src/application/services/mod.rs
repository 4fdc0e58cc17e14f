//! Application services - Command registry and built-in commands

pub mod builtins;
pub mod registry;

pub use builtins::register_builtins;
pub use registry::CommandRegistry;
