//! Built-in commands - the fixed commands every bot starts with

use std::sync::Arc;

use async_trait::async_trait;

use super::CommandRegistry;
use crate::domain::entities::{Command, Context, Handler};
use crate::domain::traits::Bot;

/// Upper bound on the number of messages a single `del` may remove
pub const MAX_DELETE: u64 = 500;

/// Register `list`, `ping`, `learn`, `forget` and `del`.
///
/// `learn`, `forget` and `del` require one of `admin_permissions`.
pub fn register_builtins(registry: &CommandRegistry, admin_permissions: &[String], bot: Arc<dyn Bot>) {
    let builtins = [
        (
            "list",
            Command::handler(ListCommands).with_description("List the commands you can use"),
        ),
        (
            "ping",
            Command::function(|_| "pong".to_string()).with_description("Check the bot is alive"),
        ),
        (
            "learn",
            Command::handler(Learn)
                .with_permissions(admin_permissions.iter().cloned())
                .with_description("Teach a reply: !learn <name> then the reply lines"),
        ),
        (
            "forget",
            Command::function(forget)
                .with_permissions(admin_permissions.iter().cloned())
                .with_description("Forget a learned reply"),
        ),
        (
            "del",
            Command::handler(DeleteMessages { bot })
                .with_permissions(admin_permissions.iter().cloned())
                .with_description("Delete messages: !del <from id> [to id]"),
        ),
    ];

    for (name, command) in builtins {
        if let Err(e) = registry.register(name, command.fixed()) {
            tracing::warn!("Failed to register built-in {}: {}", name, e);
        }
    }
}

/// Replies with every command the caller may use
struct ListCommands;

#[async_trait]
impl Handler for ListCommands {
    async fn call(&self, ctx: Context<'_>) -> String {
        let trigger = ctx.registry.trigger();
        ctx.registry
            .list(ctx.caller)
            .await
            .iter()
            .map(|name| format!("`{}{}`", trigger, name))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Registers a canned reply and writes the store straight away
struct Learn;

#[async_trait]
impl Handler for Learn {
    async fn call(&self, ctx: Context<'_>) -> String {
        if ctx.input.args.is_empty() {
            return "No keyword/phrase provided".to_string();
        }
        if ctx.input.lines.is_empty() {
            return "No message lines provided".to_string();
        }

        let name = ctx.input.joined_args();
        let reply = match ctx.registry.register(name, Command::canned(ctx.input.body())) {
            Ok(reply) => reply,
            Err(e) => e.to_string(),
        };
        ctx.registry.save().await;
        reply
    }
}

fn forget(ctx: Context<'_>) -> String {
    if ctx.input.args.is_empty() {
        return "No command provided".to_string();
    }

    match ctx.registry.unregister(&ctx.input.joined_args()) {
        Ok(reply) => reply,
        Err(e) => e.to_string(),
    }
}

/// Deletes a range of chat messages together with the command message
struct DeleteMessages {
    bot: Arc<dyn Bot>,
}

impl DeleteMessages {
    /// Ids to delete for `!del <from> [to]` sent as message `current`
    fn plan(args: &[String], current: u64) -> Result<Vec<String>, &'static str> {
        let from = args
            .first()
            .ok_or("No message id provided")?
            .parse::<u64>()
            .map_err(|_| "Invalid message id")?;
        let to = match args.get(1) {
            Some(to) => to.parse::<u64>().map_err(|_| "Invalid message id")?,
            None => current.saturating_sub(1),
        };

        if to <= from || from >= current {
            return Err("Not enough messages to delete");
        }
        let to = to.min(current - 1);
        if to - from + 1 > MAX_DELETE {
            return Err("Too many messages to delete");
        }

        let mut ids: Vec<String> = (from..=to).map(|id| id.to_string()).collect();
        ids.push(current.to_string());
        Ok(ids)
    }
}

#[async_trait]
impl Handler for DeleteMessages {
    async fn call(&self, ctx: Context<'_>) -> String {
        let Some(message) = ctx.caller.message() else {
            return "Internal error :S".to_string();
        };
        let Ok(current) = message.id.parse::<u64>() else {
            return "Internal error :S".to_string();
        };

        let ids = match Self::plan(&ctx.input.args, current) {
            Ok(ids) => ids,
            Err(reason) => return reason.to_string(),
        };

        tracing::info!("[{}] Deleting {} messages", message.chat_id, ids.len());
        match self.bot.delete_messages(&message.chat_id, &ids).await {
            Ok(()) => String::new(),
            Err(e) => e.to_string(),
        }
    }
}
