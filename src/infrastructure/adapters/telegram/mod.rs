//! Telegram adapter

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::application::errors::BotError;
use crate::application::messaging::MessageDispatcher;
use crate::application::services::CommandRegistry;
use crate::domain::entities::{Message as ChatMessage, PermissionCache, PermissionSet, User as ChatUser};
use crate::domain::traits::{Bot, BotInfo, Caller};

/// Telegram API base URL
const API_BASE: &str = "https://api.telegram.org";

/// Most message ids a single deleteMessages call accepts
const DELETE_BATCH: usize = 100;

/// Telegram update type
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<Message>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Message {
    pub message_id: i64,
    pub from: Option<User>,
    pub chat: Chat,
    /// Unix time the message was sent
    #[serde(default)]
    pub date: i64,
    pub text: Option<String>,
    pub reply_to_message: Option<Box<Message>>,
    #[serde(default)]
    pub entities: Vec<MessageEntity>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct User {
    pub id: i64,
    #[serde(default)]
    pub is_bot: bool,
    pub username: Option<String>,
    pub first_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Chat {
    pub id: i64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MessageEntity {
    #[serde(rename = "type")]
    pub kind: String,
    pub user: Option<User>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatMember {
    pub status: String,
    pub custom_title: Option<String>,
}

impl ChatMember {
    /// Permission tokens for this member: its status plus any custom title
    pub fn permissions(&self) -> PermissionSet {
        let mut set = PermissionSet::new();
        set.insert(self.status.clone());
        if let Some(title) = &self.custom_title {
            set.insert(title.clone());
        }
        set
    }
}

/// One entry of the command menu set with setMyCommands
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BotCommand {
    pub command: String,
    pub description: String,
}

/// Telegram only accepts 1-32 lowercase letters, digits and underscores
fn is_menu_name(name: &str) -> bool {
    (1..=32).contains(&name.len())
        && name.bytes().all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'_')
}

#[derive(Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

impl From<&User> for ChatUser {
    fn from(user: &User) -> Self {
        ChatUser {
            id: user.id.to_string(),
            username: user.username.clone(),
            first_name: user.first_name.clone(),
            is_bot: user.is_bot,
        }
    }
}

impl Message {
    /// Convert to the platform-neutral message, if it carries text
    pub fn to_chat_message(&self) -> Option<ChatMessage> {
        let text = self.text.clone()?;
        let mentions = self
            .entities
            .iter()
            .filter(|e| e.kind == "text_mention")
            .filter_map(|e| e.user.as_ref().map(ChatUser::from))
            .collect();

        let mut message = ChatMessage::new(self.chat.id.to_string(), text)
            .with_id(self.message_id.to_string())
            .with_mentions(mentions)
            .with_platform("telegram");
        if let Some(sent) = DateTime::<Utc>::from_timestamp(self.date, 0) {
            message = message.with_timestamp(sent);
        }
        if let Some(from) = &self.from {
            message = message.with_sender(ChatUser::from(from));
        }
        if let Some(reply) = &self.reply_to_message {
            message = message.with_reply_to(reply.message_id.to_string());
        }
        Some(message)
    }
}

/// Telegram bot adapter
pub struct TelegramAdapter {
    token: String,
    client: Client,
    info: BotInfo,
}

impl TelegramAdapter {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            client: Client::new(),
            info: BotInfo {
                id: "unknown".to_string(),
                name: "halp-bot".to_string(),
                username: "halp_bot".to_string(),
            },
        }
    }

    /// Get the API URL for a method
    fn api_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", API_BASE, self.token, method)
    }

    /// POST `request` to `method` and unwrap the `result` field
    async fn call<Req, Resp>(&self, method: &str, request: &Req) -> Result<Resp, BotError>
    where
        Req: Serialize + ?Sized + Sync,
        Resp: DeserializeOwned,
    {
        let response = self.client
            .post(self.api_url(method))
            .json(request)
            .send()
            .await
            .map_err(|e| BotError::Network(e.to_string()))?;

        let status = response.status();
        let data: ApiResponse<Resp> = response
            .json()
            .await
            .map_err(|e| BotError::Parse(e.to_string()))?;

        if !data.ok || !status.is_success() {
            let reason = data.description.unwrap_or_else(|| status.to_string());
            return Err(BotError::Network(format!("Telegram API error in {}: {}", method, reason)));
        }

        data.result
            .ok_or_else(|| BotError::Parse(format!("Telegram API {} returned no result", method)))
    }

    /// Fetch bot info from Telegram API
    pub async fn fetch_bot_info(&mut self) -> Result<(), BotError> {
        #[derive(Deserialize)]
        struct BotInfoResponse {
            id: i64,
            first_name: String,
            username: String,
        }

        let data: BotInfoResponse = self.call("getMe", &serde_json::json!({})).await?;
        self.info = BotInfo {
            id: data.id.to_string(),
            name: data.first_name,
            username: data.username,
        };

        Ok(())
    }

    /// Get updates from Telegram using getUpdates API
    pub async fn get_updates(&self, offset: i64, timeout: i64) -> Result<Vec<Update>, BotError> {
        #[derive(Serialize)]
        struct GetUpdatesRequest {
            offset: i64,
            timeout: i64,
            allowed_updates: Vec<String>,
        }

        let request = GetUpdatesRequest {
            offset,
            timeout,
            allowed_updates: vec!["message".to_string()],
        };
        self.call("getUpdates", &request).await
    }

    /// Get the next update offset
    pub fn get_next_offset(updates: &[Update]) -> Option<i64> {
        updates.iter().map(|u| u.update_id + 1).max()
    }

    /// Look up a member's status in a chat
    pub async fn get_chat_member(&self, chat_id: &str, user_id: &str) -> Result<ChatMember, BotError> {
        let request = serde_json::json!({ "chat_id": chat_id, "user_id": user_id });
        self.call("getChatMember", &request).await
    }

    /// Advertise the bot status (shown on the bot profile)
    pub async fn set_status(&self, status: &str) -> Result<(), BotError> {
        let request = serde_json::json!({ "short_description": status });
        let _: bool = self.call("setMyShortDescription", &request).await?;
        Ok(())
    }

    /// Body of the setMyCommands call: every fixed command, sorted by name
    pub fn commands_request(registry: &CommandRegistry) -> serde_json::Value {
        let mut commands = Vec::new();
        registry.for_each(|name, cmd| {
            if cmd.fixed && is_menu_name(name) {
                commands.push(BotCommand {
                    command: name.to_string(),
                    description: cmd.description.clone().unwrap_or_else(|| name.to_string()),
                });
            }
        });
        commands.sort_by(|a, b| a.command.cmp(&b.command));
        serde_json::json!({ "commands": commands })
    }

    /// Publish the fixed commands as the bot's command menu
    pub async fn set_commands(&self, registry: &CommandRegistry) -> Result<(), BotError> {
        let request = Self::commands_request(registry);
        let _: bool = self.call("setMyCommands", &request).await?;
        tracing::info!("Published the command menu");
        Ok(())
    }

    /// First characters of the token, enough to tell bots apart in logs
    fn token_hint(&self) -> String {
        self.token.chars().take(8).collect()
    }

    /// Long-poll for updates and dispatch each message on its own task
    pub async fn run(self: Arc<Self>, dispatcher: Arc<MessageDispatcher>) -> Result<(), BotError> {
        let mut offset: i64 = 0;
        let timeout_seconds = 30;

        tracing::info!("Starting message loop...");
        loop {
            let updates = match self.get_updates(offset, timeout_seconds).await {
                Ok(updates) => updates,
                Err(e) => {
                    tracing::error!("Failed to get updates: {}", e);
                    tokio::time::sleep(std::time::Duration::from_secs(5)).await;
                    continue;
                }
            };

            if let Some(next) = Self::get_next_offset(&updates) {
                offset = next;
            }

            for update in updates {
                let Some(message) = update.message.as_ref().and_then(Message::to_chat_message) else {
                    continue;
                };

                let adapter = Arc::clone(&self);
                let dispatcher = Arc::clone(&dispatcher);
                tokio::spawn(async move {
                    let caller = TelegramCaller::new(&adapter, message.clone());
                    if let Err(e) = dispatcher.handle(&*adapter, &message, &caller).await {
                        tracing::error!("[{}] Failed to handle message: {}", message.chat_id, e);
                    }
                });
            }
        }
    }
}

#[async_trait]
impl Bot for TelegramAdapter {
    async fn start(&self) -> Result<(), BotError> {
        tracing::info!("Starting Telegram bot (token: {}...)", self.token_hint());
        Ok(())
    }

    async fn send_message(&self, chat_id: &str, text: &str) -> Result<String, BotError> {
        #[derive(Serialize)]
        struct SendMessageRequest<'a> {
            chat_id: &'a str,
            text: &'a str,
        }

        #[derive(Deserialize)]
        struct MessageResult {
            message_id: i64,
        }

        tracing::debug!("Sending to {}: {}", chat_id, text);
        let result: MessageResult = self
            .call("sendMessage", &SendMessageRequest { chat_id, text })
            .await?;
        Ok(result.message_id.to_string())
    }

    async fn delete_messages(&self, chat_id: &str, message_ids: &[String]) -> Result<(), BotError> {
        #[derive(Serialize)]
        struct DeleteMessagesRequest<'a> {
            chat_id: &'a str,
            message_ids: &'a [i64],
        }

        let ids = message_ids
            .iter()
            .map(|id| id.parse::<i64>().map_err(|_| BotError::Parse(format!("Invalid message id: {}", id))))
            .collect::<Result<Vec<_>, _>>()?;

        for batch in ids.chunks(DELETE_BATCH) {
            let _: bool = self
                .call("deleteMessages", &DeleteMessagesRequest { chat_id, message_ids: batch })
                .await?;
        }
        Ok(())
    }

    fn bot_info(&self) -> BotInfo {
        self.info.clone()
    }
}

/// The author of a Telegram message; permissions come from getChatMember
pub struct TelegramCaller<'a> {
    adapter: &'a TelegramAdapter,
    message: ChatMessage,
    permissions: PermissionCache,
}

impl<'a> TelegramCaller<'a> {
    pub fn new(adapter: &'a TelegramAdapter, message: ChatMessage) -> Self {
        Self {
            adapter,
            message,
            permissions: PermissionCache::new(),
        }
    }

    async fn fetch(&self) -> Option<PermissionSet> {
        let user_id = &self.message.sender.as_ref()?.id;
        match self.adapter.get_chat_member(&self.message.chat_id, user_id).await {
            Ok(member) => Some(member.permissions()),
            Err(e) => {
                tracing::warn!("Failed to fetch permissions for {}: {}", user_id, e);
                None
            }
        }
    }
}

#[async_trait]
impl Caller for TelegramCaller<'_> {
    async fn permissions(&self) -> Option<&PermissionSet> {
        self.permissions.get_or_fetch(|| self.fetch()).await
    }

    fn message(&self) -> Option<&ChatMessage> {
        Some(&self.message)
    }
}
