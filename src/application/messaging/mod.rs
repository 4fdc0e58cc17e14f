//! Message handling - Parsing, guarding and dispatching chat messages

pub mod dispatcher;
pub mod middleware;
pub mod parser;

pub use dispatcher::{Handled, MessageDispatcher, Outcome};
pub use middleware::MentionGuard;
pub use parser::{InputParser, DEFAULT_TRIGGER};
