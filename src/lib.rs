//! halp-bot - a permission-aware chat command bot
//!
//! Chat text starting with the trigger character (`!` by default) is parsed
//! into an [`Input`](domain::entities::Input), resolved against the shared
//! [`CommandRegistry`](application::services::CommandRegistry) and answered.
//! Commands taught with `!learn` are kept in a JSON file.

pub mod domain;
pub mod application;
pub mod infrastructure;
