use std::collections::BTreeSet;
use std::future::Future;

use tokio::sync::OnceCell;

/// A set of permission tokens (role names, member statuses, ...)
///
/// Matching is plain set intersection; tokens carry no hierarchy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PermissionSet {
    tokens: BTreeSet<String>,
}

impl PermissionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, token: impl Into<String>) -> bool {
        self.tokens.insert(token.into())
    }

    pub fn contains(&self, token: &str) -> bool {
        self.tokens.contains(token)
    }

    /// True when at least one token is held by both sets
    pub fn intersects(&self, other: &PermissionSet) -> bool {
        let (small, large) = if self.len() <= other.len() {
            (self, other)
        } else {
            (other, self)
        };
        small.tokens.iter().any(|t| large.tokens.contains(t))
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.tokens.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for PermissionSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            tokens: iter.into_iter().map(Into::into).collect(),
        }
    }
}

/// Memoized permission set for a single caller.
///
/// The first successful fetch is kept for the lifetime of the cache. A failed
/// fetch is not remembered, so the next call tries again.
#[derive(Debug, Default)]
pub struct PermissionCache {
    cell: OnceCell<PermissionSet>,
}

impl PermissionCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cache that is already populated
    pub fn ready(permissions: PermissionSet) -> Self {
        Self {
            cell: OnceCell::new_with(Some(permissions)),
        }
    }

    pub async fn get_or_fetch<F, Fut>(&self, fetch: F) -> Option<&PermissionSet>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Option<PermissionSet>>,
    {
        self.cell
            .get_or_try_init(|| async move { fetch().await.ok_or(()) })
            .await
            .ok()
    }

    pub fn get(&self) -> Option<&PermissionSet> {
        self.cell.get()
    }
}
