use async_trait::async_trait;

use crate::domain::entities::{Message, PermissionCache, PermissionSet};

/// Whoever issued a command
///
/// Implementations memoize their permission set (see [`PermissionCache`]);
/// `None` means the set could not be fetched.
#[async_trait]
pub trait Caller: Send + Sync {
    async fn permissions(&self) -> Option<&PermissionSet>;

    /// The chat message the command arrived in, if any
    fn message(&self) -> Option<&Message> {
        None
    }
}

/// Caller with a fixed permission set, used by the console adapter and tests
#[derive(Debug, Default)]
pub struct StaticCaller {
    permissions: PermissionCache,
    message: Option<Message>,
}

impl StaticCaller {
    pub fn new<I, S>(permissions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            permissions: PermissionCache::ready(permissions.into_iter().collect()),
            message: None,
        }
    }

    /// Caller whose permissions can never be fetched
    pub fn unavailable() -> Self {
        Self::default()
    }

    pub fn with_message(mut self, message: Message) -> Self {
        self.message = Some(message);
        self
    }
}

#[async_trait]
impl Caller for StaticCaller {
    async fn permissions(&self) -> Option<&PermissionSet> {
        self.permissions.get_or_fetch(|| async { None }).await
    }

    fn message(&self) -> Option<&Message> {
        self.message.as_ref()
    }
}
