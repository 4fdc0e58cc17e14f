//! Application layer - Use cases and business logic
//!
//! This layer contains:
//! - Services: Command registry and built-in commands
//! - Errors: Domain-specific errors
//! - Messaging: Input parsing, mention guard, dispatching

pub mod errors;
pub mod services;
pub mod messaging;
