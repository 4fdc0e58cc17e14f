use super::User;
use chrono::{DateTime, Utc};

/// An inbound chat message as seen by the adapters
#[derive(Debug, Clone)]
pub struct Message {
    pub id: String,
    pub chat_id: String,
    pub sender: Option<User>,
    pub text: String,
    /// Users explicitly mentioned in the text
    pub mentions: Vec<User>,
    /// Id of the message this one replies to
    pub reply_to: Option<String>,
    /// When the platform says the message was sent
    pub timestamp: DateTime<Utc>,
    pub platform: String,
}

impl Message {
    pub fn new(chat_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            chat_id: chat_id.into(),
            sender: None,
            text: text.into(),
            mentions: Vec::new(),
            reply_to: None,
            timestamp: Utc::now(),
            platform: "unknown".to_string(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_sender(mut self, user: User) -> Self {
        self.sender = Some(user);
        self
    }

    pub fn with_mentions(mut self, mentions: Vec<User>) -> Self {
        self.mentions = mentions;
        self
    }

    pub fn with_reply_to(mut self, id: impl Into<String>) -> Self {
        self.reply_to = Some(id.into());
        self
    }

    pub fn with_platform(mut self, platform: impl Into<String>) -> Self {
        self.platform = platform.into();
        self
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Time between sending and now, never negative
    pub fn age(&self) -> chrono::Duration {
        (Utc::now() - self.timestamp).max(chrono::Duration::zero())
    }

    /// Messages written by bots (including ourselves) are never handled
    pub fn from_bot(&self) -> bool {
        self.sender.as_ref().is_some_and(|u| u.is_bot)
    }

    pub fn author_name(&self) -> String {
        self.sender
            .as_ref()
            .map(User::display_name)
            .unwrap_or_else(|| "unknown".to_string())
    }
}
