//! Domain layer - Core business objects
//!
//! This layer contains:
//! - Entities: Commands, parsed input, permissions, messages, users
//! - Traits: Abstractions for infrastructure (Bot, Caller, CommandStore)

pub mod entities;
pub mod traits;
