//! Console adapter for development/testing

use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::application::errors::BotError;
use crate::application::messaging::MessageDispatcher;
use crate::domain::entities::{Message, User};
use crate::domain::traits::{Bot, BotInfo, StaticCaller};

const CONSOLE_CHAT: &str = "console";

/// Console bot adapter for local development
///
/// Each line typed is one message. A line ending in `\` continues the
/// message on the next line, which is how `!learn` bodies are entered.
pub struct ConsoleAdapter {
    info: BotInfo,
    permissions: Vec<String>,
    next_id: AtomicU64,
}

impl ConsoleAdapter {
    pub fn new(permissions: Vec<String>) -> Self {
        Self {
            info: BotInfo {
                id: "console".to_string(),
                name: "halp-bot".to_string(),
                username: "console".to_string(),
            },
            permissions,
            next_id: AtomicU64::new(1),
        }
    }

    fn next_message(&self, text: String) -> Message {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        Message::new(CONSOLE_CHAT, text)
            .with_id(id.to_string())
            .with_sender(User::new("console").with_username("console"))
            .with_platform("console")
    }

    /// Read stdin until EOF, dispatching every message
    pub async fn run(&self, dispatcher: &MessageDispatcher) -> Result<(), BotError> {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        let mut pending: Vec<String> = Vec::new();

        while let Some(line) = lines
            .next_line()
            .await
            .map_err(|e| BotError::Internal(format!("Failed to read stdin: {}", e)))?
        {
            if let Some(partial) = line.strip_suffix('\\') {
                pending.push(partial.to_string());
                continue;
            }
            pending.push(line);

            let text = std::mem::take(&mut pending).join("\n");
            if text.trim().is_empty() {
                continue;
            }

            let message = self.next_message(text);
            let caller = StaticCaller::new(self.permissions.iter().cloned()).with_message(message.clone());
            if let Err(e) = dispatcher.handle(self, &message, &caller).await {
                tracing::error!("Failed to handle message: {}", e);
            }
        }

        tracing::info!("Console input closed");
        Ok(())
    }
}

#[async_trait]
impl Bot for ConsoleAdapter {
    async fn start(&self) -> Result<(), BotError> {
        tracing::info!("Starting console bot (dev mode)");
        Ok(())
    }

    async fn send_message(&self, _chat_id: &str, text: &str) -> Result<String, BotError> {
        println!("[BOT] {}", text);
        Ok(self.next_id.fetch_add(1, Ordering::SeqCst).to_string())
    }

    async fn delete_messages(&self, _chat_id: &str, message_ids: &[String]) -> Result<(), BotError> {
        println!("[BOT] (deleted messages {})", message_ids.join(", "));
        Ok(())
    }

    fn bot_info(&self) -> BotInfo {
        self.info.clone()
    }
}
