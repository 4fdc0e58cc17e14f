use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use super::{Input, PermissionSet};
use crate::application::services::CommandRegistry;
use crate::domain::traits::Caller;

/// Everything a command sees when it runs
#[derive(Clone, Copy)]
pub struct Context<'a> {
    pub caller: &'a dyn Caller,
    pub input: &'a Input,
    pub registry: &'a CommandRegistry,
}

/// Host logic behind a function-backed command
#[async_trait]
pub trait Handler: Send + Sync {
    async fn call(&self, ctx: Context<'_>) -> String;
}

/// Adapts a plain closure into a [`Handler`]
pub struct CommandFn<F>(pub F);

#[async_trait]
impl<F> Handler for CommandFn<F>
where
    F: Fn(Context<'_>) -> String + Send + Sync,
{
    async fn call(&self, ctx: Context<'_>) -> String {
        (self.0)(ctx)
    }
}

/// What a command does when invoked
#[derive(Clone)]
pub enum Executor {
    /// Replies with a stored text; the only kind that is persisted
    Canned(String),
    /// Runs host logic
    Function(Arc<dyn Handler>),
}

impl Executor {
    pub async fn invoke(&self, ctx: Context<'_>) -> String {
        match self {
            Executor::Canned(text) => text.clone(),
            Executor::Function(handler) => handler.call(ctx).await,
        }
    }

    pub fn canned_text(&self) -> Option<&str> {
        match self {
            Executor::Canned(text) => Some(text),
            Executor::Function(_) => None,
        }
    }
}

impl fmt::Debug for Executor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Executor::Canned(text) => f.debug_tuple("Canned").field(text).finish(),
            Executor::Function(_) => f.write_str("Function(..)"),
        }
    }
}

/// A registered bot command
#[derive(Debug, Clone)]
pub struct Command {
    pub executor: Executor,
    /// Built-in commands can be neither replaced nor removed
    pub fixed: bool,
    /// Empty means anyone may run the command
    pub permissions: PermissionSet,
    pub description: Option<String>,
}

impl Command {
    pub fn new(executor: Executor) -> Self {
        Self {
            executor,
            fixed: false,
            permissions: PermissionSet::new(),
            description: None,
        }
    }

    /// A user-defined command replying with `text`
    pub fn canned(text: impl Into<String>) -> Self {
        Self::new(Executor::Canned(text.into()))
    }

    pub fn handler<H: Handler + 'static>(handler: H) -> Self {
        Self::new(Executor::Function(Arc::new(handler)))
    }

    pub fn function<F>(f: F) -> Self
    where
        F: Fn(Context<'_>) -> String + Send + Sync + 'static,
    {
        Self::handler(CommandFn(f))
    }

    pub fn fixed(mut self) -> Self {
        self.fixed = true;
        self
    }

    pub fn with_permission(mut self, permission: impl Into<String>) -> Self {
        self.permissions.insert(permission);
        self
    }

    pub fn with_permissions<I, S>(mut self, permissions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for p in permissions {
            self.permissions.insert(p);
        }
        self
    }

    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = Some(desc.into());
        self
    }

    pub fn requires_permission(&self) -> bool {
        !self.permissions.is_empty()
    }

    /// Check a caller's (possibly unavailable) permission set against this command
    pub fn test(&self, granted: Option<&PermissionSet>) -> bool {
        if !self.requires_permission() {
            return true;
        }
        granted.is_some_and(|g| g.intersects(&self.permissions))
    }

    /// Like [`Command::test`], fetching the caller's permissions only when needed
    pub async fn permits(&self, caller: &dyn Caller) -> bool {
        if !self.requires_permission() {
            return true;
        }
        self.test(caller.permissions().await)
    }
}
