//! Mention guard - keeps protected users from being pinged

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex_lite::Regex;

use crate::domain::entities::Message;

static MENTION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(^|[^A-Za-z0-9_])@([A-Za-z0-9_]+)").expect("mention pattern is valid")
});

/// Detects messages that mention protected users and builds the
/// mention-free repost that replaces them
#[derive(Debug, Clone)]
pub struct MentionGuard {
    protected: HashSet<String>,
}

impl MentionGuard {
    pub fn new<I, S>(protected: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            protected: protected
                .into_iter()
                .map(|u| u.as_ref().trim_start_matches('@').to_lowercase())
                .collect(),
        }
    }

    /// Usernames mentioned by `message`, from platform metadata and `@name` text
    fn mentioned(message: &Message) -> Vec<String> {
        let mut names: Vec<String> = message
            .mentions
            .iter()
            .filter_map(|u| u.username.clone())
            .collect();
        names.extend(
            MENTION
                .captures_iter(&message.text)
                .filter_map(|c| c.get(2))
                .map(|m| m.as_str().to_string()),
        );
        names
    }

    pub fn is_protected(&self, username: &str) -> bool {
        self.protected.contains(&username.to_lowercase())
    }

    /// Returns the repost text when `message` pings a protected user
    pub fn check(&self, message: &Message) -> Option<String> {
        if self.protected.is_empty() {
            return None;
        }

        if !Self::mentioned(message).iter().any(|name| self.is_protected(name)) {
            return None;
        }

        let mut header = format!("**From {}:**", message.author_name());
        if let Some(reply_to) = &message.reply_to {
            header.push_str(&format!("\n_Replying to message {}_", reply_to));
        }

        let content = MENTION.replace_all(&message.text, "$1$2");
        Some(format!("@ Mentions Removed!\n{}\n{}", header, content))
    }
}
