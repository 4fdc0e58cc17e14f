//! Message dispatcher - Routes inbound chat messages to the command registry

use std::fmt;
use std::sync::Arc;

use super::middleware::MentionGuard;
use crate::application::errors::BotError;
use crate::application::services::CommandRegistry;
use crate::domain::entities::Message;
use crate::domain::traits::{Bot, Caller};

/// Result of dispatching one piece of text
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// A command ran and produced this reply (possibly empty)
    Executed(String),
    NotACommand,
    NotRegistered,
    /// Also returned when the caller's permissions could not be fetched
    NoPermission,
}

impl Outcome {
    pub fn matched(&self) -> bool {
        matches!(self, Outcome::Executed(_))
    }

    pub fn text(&self) -> &str {
        match self {
            Outcome::Executed(reply) => reply,
            Outcome::NotACommand => "Input is not a command",
            Outcome::NotRegistered => "Command not registered",
            Outcome::NoPermission => "No permission",
        }
    }

    pub fn into_parts(self) -> (bool, String) {
        let matched = self.matched();
        match self {
            Outcome::Executed(reply) => (matched, reply),
            other => (matched, other.text().to_string()),
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.text())
    }
}

/// What happened to an inbound message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Handled {
    /// Written by a bot
    Ignored,
    /// Removed and reposted by the mention guard
    Guarded,
    Dispatched(Outcome),
}

/// Glue between a platform adapter and the registry
pub struct MessageDispatcher {
    registry: Arc<CommandRegistry>,
    guard: Option<MentionGuard>,
}

impl MessageDispatcher {
    pub fn new(registry: Arc<CommandRegistry>) -> Self {
        Self {
            registry,
            guard: None,
        }
    }

    pub fn with_guard(mut self, guard: MentionGuard) -> Self {
        self.guard = Some(guard);
        self
    }

    pub fn registry(&self) -> &Arc<CommandRegistry> {
        &self.registry
    }

    /// Handle one inbound message, replying through `bot` when a command
    /// produced output
    pub async fn handle(&self, bot: &dyn Bot, message: &Message, caller: &dyn Caller) -> Result<Handled, BotError> {
        if message.from_bot() {
            return Ok(Handled::Ignored);
        }

        if let Some(repost) = self.guard.as_ref().and_then(|g| g.check(message)) {
            tracing::info!("[{}] Removing protected mentions from {}", message.chat_id, message.author_name());
            bot.delete_messages(&message.chat_id, std::slice::from_ref(&message.id)).await?;
            bot.send_message(&message.chat_id, &repost).await?;
            return Ok(Handled::Guarded);
        }

        let outcome = self.registry.dispatch(caller, &message.text).await;
        tracing::debug!(
            "[{}:{}] {:?} ({} ms after sending)",
            message.platform,
            message.chat_id,
            outcome,
            message.age().num_milliseconds()
        );

        if let Outcome::Executed(reply) = &outcome {
            if !reply.is_empty() {
                bot.send_message(&message.chat_id, reply).await?;
            }
        }

        Ok(Handled::Dispatched(outcome))
    }
}
