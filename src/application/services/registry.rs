//! Command registry - Concurrent name to command map with dispatch and persistence

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tokio::sync::Mutex;

use crate::application::errors::{RegistryError, StorageError};
use crate::application::messaging::{InputParser, Outcome};
use crate::domain::entities::{Command, Context};
use crate::domain::traits::{CannedCommands, Caller, CommandStore};

type CommandMap = HashMap<String, Arc<Command>>;

/// Registry of every command the bot answers to.
///
/// Shared between tasks behind an `Arc`. Map access goes through a
/// reader/writer lock that is never held while a command runs or while a
/// caller's permissions are fetched.
pub struct CommandRegistry {
    parser: InputParser,
    commands: RwLock<CommandMap>,
    store: Option<Arc<dyn CommandStore>>,
    /// Held from export to the end of the write, so saves land in order
    save_lock: Mutex<()>,
}

impl CommandRegistry {
    pub fn new(parser: InputParser) -> Self {
        Self {
            parser,
            commands: RwLock::new(HashMap::new()),
            store: None,
            save_lock: Mutex::new(()),
        }
    }

    /// Persist canned commands through `store`
    pub fn with_store<S: CommandStore + 'static>(mut self, store: S) -> Self {
        self.store = Some(Arc::new(store));
        self
    }

    pub fn trigger(&self) -> char {
        self.parser.trigger()
    }

    // The map holds no invariants a panicking writer could break halfway,
    // so a poisoned lock is still safe to use.
    fn read(&self) -> RwLockReadGuard<'_, CommandMap> {
        self.commands.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, CommandMap> {
        self.commands.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Add or replace a command. Fixed commands cannot be replaced.
    pub fn register(&self, name: impl Into<String>, command: Command) -> Result<String, RegistryError> {
        let name = name.into();
        let mut commands = self.write();

        if commands.get(&name).is_some_and(|existing| existing.fixed) {
            tracing::warn!("Refusing to replace fixed command: {}", name);
            return Err(RegistryError::CannotReplace(name));
        }

        let reply = format!("Registered command `{}{}`", self.trigger(), name);
        tracing::info!("Registered command: {} (fixed: {})", name, command.fixed);
        commands.insert(name, Arc::new(command));
        Ok(reply)
    }

    /// Remove a non-fixed command
    pub fn unregister(&self, name: &str) -> Result<String, RegistryError> {
        let mut commands = self.write();

        match commands.get(name) {
            None => Err(RegistryError::NotFound(name.to_string())),
            Some(cmd) if cmd.fixed => Err(RegistryError::CannotUnregister(name.to_string())),
            Some(_) => {
                commands.remove(name);
                tracing::info!("Unregistered command: {}", name);
                Ok(format!("Unregistered command `{}{}`", self.trigger(), name))
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<Arc<Command>> {
        self.read().get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.read().contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Names of every command `caller` may run, sorted
    pub async fn list(&self, caller: &dyn Caller) -> Vec<String> {
        let snapshot: Vec<(String, Arc<Command>)> = self
            .read()
            .iter()
            .map(|(name, cmd)| (name.clone(), Arc::clone(cmd)))
            .collect();

        let granted = if snapshot.iter().any(|(_, cmd)| cmd.requires_permission()) {
            caller.permissions().await
        } else {
            None
        };

        let mut names: Vec<String> = snapshot
            .into_iter()
            .filter(|(_, cmd)| cmd.test(granted))
            .map(|(name, _)| name)
            .collect();
        names.sort();
        names
    }

    /// Visit every command under the read lock. Order is unspecified.
    pub fn for_each<F>(&self, mut visitor: F)
    where
        F: FnMut(&str, &Command),
    {
        for (name, cmd) in self.read().iter() {
            visitor(name, cmd);
        }
    }

    /// Parse `text`, resolve it and run the matching command.
    ///
    /// The whole command line is tried as a name first, then shorter word
    /// prefixes, then the first word, so `!del channel 1` prefers a
    /// `del channel` command over `del`.
    pub async fn dispatch(&self, caller: &dyn Caller, text: &str) -> Outcome {
        let input = match self.parser.parse(text) {
            Ok(input) => input,
            Err(_) => return Outcome::NotACommand,
        };

        let candidates = input.candidate_names();
        let command = {
            let commands = self.read();
            candidates.iter().find_map(|name| commands.get(name).cloned())
        };

        let Some(command) = command else {
            tracing::debug!("Command not registered: {}", input.command);
            return Outcome::NotRegistered;
        };

        if !command.permits(caller).await {
            tracing::debug!("Permission denied for command: {}", input.command_raw);
            return Outcome::NoPermission;
        }

        let ctx = Context {
            caller,
            input: &input,
            registry: self,
        };
        Outcome::Executed(command.executor.invoke(ctx).await)
    }

    /// Canned commands in their stored form
    pub fn export(&self) -> CannedCommands {
        let mut content = CannedCommands::new();
        self.for_each(|name, cmd| {
            if let Some(text) = cmd.executor.canned_text() {
                content.insert(name.to_string(), text.split('\n').map(str::to_string).collect());
            }
        });
        content
    }

    /// Register every stored command, returning how many were loaded
    pub fn try_load(&self) -> Result<usize, StorageError> {
        let store = self.store.as_ref().ok_or(StorageError::Unconfigured)?;
        let content = store.read()?;

        let mut loaded = 0;
        for (name, lines) in content {
            match self.register(name, Command::canned(lines.join("\n"))) {
                Ok(_) => loaded += 1,
                Err(e) => tracing::warn!("Skipping stored command {}: {}", e.name(), e),
            }
        }
        Ok(loaded)
    }

    /// Load stored commands; failures are logged and load nothing
    pub fn load(&self) -> usize {
        match self.try_load() {
            Ok(loaded) => {
                tracing::info!("Loaded {} message commands", loaded);
                loaded
            }
            Err(e) => {
                tracing::warn!("Failed to load message commands: {}", e);
                0
            }
        }
    }

    /// Write every canned command to the store, returning how many were saved.
    ///
    /// Saves are serialized: the snapshot is taken under the save lock, so a
    /// later save never loses a command an earlier one wrote.
    pub async fn try_save(&self) -> Result<usize, StorageError> {
        let store = Arc::clone(self.store.as_ref().ok_or(StorageError::Unconfigured)?);
        let _guard = self.save_lock.lock().await;

        let content = self.export();
        let saved = content.len();
        tokio::task::spawn_blocking(move || store.write(&content))
            .await
            .map_err(|e| StorageError::Io(std::io::Error::other(e)))??;
        Ok(saved)
    }

    /// Save canned commands; failures are logged, never returned
    pub async fn save(&self) {
        match self.try_save().await {
            Ok(saved) => tracing::info!("Saved {} message commands", saved),
            Err(e) => tracing::error!("Failed to save message commands: {}", e),
        }
    }
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::new(InputParser::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{PermissionCache, PermissionSet};
    use crate::domain::traits::StaticCaller;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// In-memory store for exercising persistence without files
    #[derive(Default, Clone)]
    struct MemoryStore {
        content: Arc<Mutex<Option<CannedCommands>>>,
    }

    impl CommandStore for MemoryStore {
        fn read(&self) -> Result<CannedCommands, StorageError> {
            self.content
                .lock()
                .unwrap()
                .clone()
                .ok_or_else(|| StorageError::Io(std::io::ErrorKind::NotFound.into()))
        }

        fn write(&self, commands: &CannedCommands) -> Result<(), StorageError> {
            *self.content.lock().unwrap() = Some(commands.clone());
            Ok(())
        }
    }

    /// Admin caller that counts how often its permissions are asked for
    #[derive(Default)]
    struct CountingCaller {
        asked: AtomicUsize,
        cache: PermissionCache,
    }

    impl CountingCaller {
        fn asked(&self) -> usize {
            self.asked.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Caller for CountingCaller {
        async fn permissions(&self) -> Option<&PermissionSet> {
            self.asked.fetch_add(1, Ordering::SeqCst);
            self.cache
                .get_or_fetch(|| async { Some(["halp-admin"].into_iter().collect()) })
                .await
        }
    }

    fn anyone() -> StaticCaller {
        StaticCaller::new(Vec::<String>::new())
    }

    #[test]
    fn register_confirms_with_trigger() {
        let registry = CommandRegistry::default();
        let reply = registry.register("greet", Command::canned("hi")).unwrap();
        assert_eq!(reply, "Registered command `!greet`");
        assert!(registry.contains("greet"));
    }

    #[test]
    fn non_fixed_commands_are_replaced() {
        let registry = CommandRegistry::default();
        registry.register("greet", Command::canned("hi")).unwrap();
        registry.register("greet", Command::canned("hello")).unwrap();
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("greet").unwrap().executor.canned_text(), Some("hello"));
    }

    #[tokio::test]
    async fn fixed_commands_cannot_be_replaced() {
        let registry = CommandRegistry::default();
        registry
            .register("ping", Command::function(|_| "pong".to_string()).fixed())
            .unwrap();

        let err = registry.register("ping", Command::canned("nope")).unwrap_err();
        assert_eq!(err, RegistryError::CannotReplace("ping".to_string()));
        assert_eq!(err.to_string(), "Cannot replace that command");

        let outcome = registry.dispatch(&anyone(), "!ping").await;
        assert_eq!(outcome, Outcome::Executed("pong".to_string()));
    }

    #[test]
    fn unregister_rules() {
        let registry = CommandRegistry::default();
        registry.register("greet", Command::canned("hi")).unwrap();
        registry.register("list", Command::canned("x").fixed()).unwrap();

        assert_eq!(
            registry.unregister("missing"),
            Err(RegistryError::NotFound("missing".to_string()))
        );
        assert_eq!(
            registry.unregister("list"),
            Err(RegistryError::CannotUnregister("list".to_string()))
        );
        assert!(registry.unregister("greet").is_ok());
        assert!(!registry.contains("greet"));
        assert!(registry.contains("list"));
    }

    #[tokio::test]
    async fn dispatch_outcomes() {
        let registry = CommandRegistry::default();
        registry.register("greet", Command::canned("hi")).unwrap();
        registry
            .register("secret", Command::canned("s3cret").with_permission("halp-admin"))
            .unwrap();

        let caller = anyone();
        assert_eq!(registry.dispatch(&caller, "hello").await, Outcome::NotACommand);
        assert_eq!(registry.dispatch(&caller, "!").await, Outcome::NotACommand);
        assert_eq!(registry.dispatch(&caller, "!nope").await, Outcome::NotRegistered);
        assert_eq!(registry.dispatch(&caller, "!secret").await, Outcome::NoPermission);
        assert_eq!(
            registry.dispatch(&caller, "!GREET extra words").await,
            Outcome::Executed("hi".to_string())
        );

        let admin = StaticCaller::new(["halp-admin"]);
        assert_eq!(
            registry.dispatch(&admin, "!secret").await,
            Outcome::Executed("s3cret".to_string())
        );
    }

    #[tokio::test]
    async fn unregistered_command_no_longer_dispatches() {
        let registry = CommandRegistry::default();
        registry.register("greet", Command::canned("hi")).unwrap();
        registry.unregister("greet").unwrap();
        assert_eq!(registry.dispatch(&anyone(), "!greet").await, Outcome::NotRegistered);
    }

    #[tokio::test]
    async fn unavailable_permissions_only_block_restricted_commands() {
        let registry = CommandRegistry::default();
        registry.register("open", Command::canned("o")).unwrap();
        registry
            .register("closed", Command::canned("c").with_permission("admin"))
            .unwrap();

        let caller = StaticCaller::unavailable();
        assert_eq!(registry.dispatch(&caller, "!open").await, Outcome::Executed("o".to_string()));
        assert_eq!(registry.dispatch(&caller, "!closed").await, Outcome::NoPermission);
        assert_eq!(registry.list(&caller).await, vec!["open"]);
    }

    #[tokio::test]
    async fn permissions_fetched_only_when_required() {
        let registry = CommandRegistry::default();
        registry.register("open", Command::canned("o")).unwrap();
        registry
            .register("closed", Command::canned("c").with_permission("halp-admin"))
            .unwrap();

        let caller = CountingCaller::default();
        assert_eq!(registry.dispatch(&caller, "!open").await, Outcome::Executed("o".to_string()));
        assert_eq!(caller.asked(), 0);

        let caller = CountingCaller::default();
        assert_eq!(registry.dispatch(&caller, "!closed").await, Outcome::Executed("c".to_string()));
        assert_eq!(caller.asked(), 1);

        let caller = CountingCaller::default();
        assert_eq!(registry.dispatch(&caller, "!missing").await, Outcome::NotRegistered);
        assert_eq!(caller.asked(), 0);

        let caller = CountingCaller::default();
        assert_eq!(registry.list(&caller).await, vec!["closed", "open"]);
        assert_eq!(caller.asked(), 1);

        let unrestricted = CommandRegistry::default();
        unrestricted.register("open", Command::canned("o")).unwrap();
        let caller = CountingCaller::default();
        assert_eq!(unrestricted.list(&caller).await, vec!["open"]);
        assert_eq!(caller.asked(), 0);
    }

    #[tokio::test]
    async fn multi_word_name_wins_over_first_word() {
        let registry = CommandRegistry::default();
        registry.register("del", Command::canned("single")).unwrap();
        registry.register("del channel", Command::canned("phrase")).unwrap();

        let caller = anyone();
        assert_eq!(
            registry.dispatch(&caller, "!del channel 123").await,
            Outcome::Executed("phrase".to_string())
        );
        assert_eq!(
            registry.dispatch(&caller, "!del channel").await,
            Outcome::Executed("phrase".to_string())
        );
        assert_eq!(
            registry.dispatch(&caller, "!del 123").await,
            Outcome::Executed("single".to_string())
        );
        assert_eq!(
            registry.dispatch(&caller, "!delete").await,
            Outcome::NotRegistered
        );
    }

    #[tokio::test]
    async fn list_is_sorted_and_filtered() {
        let registry = CommandRegistry::default();
        for name in ["zeta", "alpha", "mid"] {
            registry.register(name, Command::canned(name)).unwrap();
        }
        registry
            .register("admin", Command::canned("a").with_permission("halp-admin"))
            .unwrap();

        assert_eq!(registry.list(&anyone()).await, vec!["alpha", "mid", "zeta"]);
        assert_eq!(
            registry.list(&StaticCaller::new(["halp-admin"])).await,
            vec!["admin", "alpha", "mid", "zeta"]
        );
    }

    #[tokio::test]
    async fn handlers_see_input_and_registry() {
        let registry = CommandRegistry::default();
        registry
            .register(
                "count",
                Command::function(|ctx| format!("{} {}", ctx.registry.len(), ctx.input.joined_args())),
            )
            .unwrap();

        assert_eq!(
            registry.dispatch(&anyone(), "!count a b").await,
            Outcome::Executed("1 a b".to_string())
        );
    }

    #[tokio::test]
    async fn save_skips_function_commands() {
        let store = MemoryStore::default();
        let registry = CommandRegistry::default().with_store(store.clone());
        registry.register("greet", Command::canned("a\nb")).unwrap();
        registry.register("ping", Command::function(|_| "pong".into()).fixed()).unwrap();

        assert_eq!(registry.try_save().await.unwrap(), 1);
        let saved = store.read().unwrap();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved["greet"], vec!["a", "b"]);
    }

    #[tokio::test]
    async fn load_restores_saved_commands() {
        let store = MemoryStore::default();
        let first = CommandRegistry::default().with_store(store.clone());
        first.register("greet", Command::canned("a\nb")).unwrap();
        first.save().await;

        let second = CommandRegistry::default().with_store(store);
        assert_eq!(second.load(), 1);
        let cmd = second.get("greet").unwrap();
        assert!(!cmd.fixed);
        assert_eq!(
            second.dispatch(&anyone(), "!greet").await,
            Outcome::Executed("a\nb".to_string())
        );
    }

    #[test]
    fn load_skips_fixed_names() {
        let store = MemoryStore::default();
        let mut content = CannedCommands::new();
        content.insert("list".to_string(), vec!["hijack".to_string()]);
        content.insert("greet".to_string(), vec!["hi".to_string()]);
        store.write(&content).unwrap();

        let registry = CommandRegistry::default().with_store(store);
        registry.register("list", Command::function(|_| "real".into()).fixed()).unwrap();

        assert_eq!(registry.load(), 1);
        assert!(registry.get("list").unwrap().executor.canned_text().is_none());
    }

    #[test]
    fn load_failure_loads_nothing() {
        let registry = CommandRegistry::default().with_store(MemoryStore::default());
        assert_eq!(registry.load(), 0);
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn persistence_without_store() {
        let registry = CommandRegistry::default();
        assert!(matches!(registry.try_save().await, Err(StorageError::Unconfigured)));
        assert_eq!(registry.load(), 0);
    }
}
