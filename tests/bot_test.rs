//! End-to-end tests: built-in commands driven through the message dispatcher

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use halp_bot::application::errors::BotError;
use halp_bot::application::messaging::{Handled, MentionGuard, MessageDispatcher, Outcome};
use halp_bot::application::services::{register_builtins, CommandRegistry};
use halp_bot::domain::entities::{Message, User};
use halp_bot::domain::traits::{Bot, BotInfo, StaticCaller};
use halp_bot::infrastructure::storage::JsonStore;

#[derive(Default)]
struct RecordingBot {
    sent: Mutex<Vec<String>>,
}

#[async_trait]
impl Bot for RecordingBot {
    async fn start(&self) -> Result<(), BotError> {
        Ok(())
    }

    async fn send_message(&self, _chat_id: &str, text: &str) -> Result<String, BotError> {
        self.sent.lock().unwrap().push(text.to_string());
        Ok("0".to_string())
    }

    async fn delete_messages(&self, _chat_id: &str, _message_ids: &[String]) -> Result<(), BotError> {
        Ok(())
    }

    fn bot_info(&self) -> BotInfo {
        BotInfo {
            id: "0".to_string(),
            name: "test".to_string(),
            username: "test".to_string(),
        }
    }
}

fn message(id: u32, text: &str) -> Message {
    Message::new("chat", text)
        .with_id(id.to_string())
        .with_sender(User::new("1").with_username("alice"))
}

#[tokio::test]
async fn learn_is_persisted_and_replayed() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("commands.json");
    let bot = Arc::new(RecordingBot::default());
    let admins = vec!["halp-admin".to_string()];

    let registry = Arc::new(CommandRegistry::default().with_store(JsonStore::new(&path)));
    register_builtins(&registry, &admins, bot.clone());
    let dispatcher = MessageDispatcher::new(Arc::clone(&registry))
        .with_guard(MentionGuard::new(["dags"]));

    let admin = StaticCaller::new(["halp-admin"]);
    let learn = message(1, "!learn greet\nHello there\nWelcome!");
    let handled = dispatcher.handle(&*bot, &learn, &admin).await.unwrap();
    assert_eq!(
        handled,
        Handled::Dispatched(Outcome::Executed("Registered command `!greet`".to_string()))
    );

    // learn saves straight away
    let saved = std::fs::read_to_string(&path).unwrap();
    assert!(saved.contains("\"Hello there\""));

    // a fresh process picks the command up again
    let restarted = CommandRegistry::default().with_store(JsonStore::new(&path));
    register_builtins(&restarted, &admins, bot.clone());
    assert_eq!(restarted.load(), 1);

    let guest = StaticCaller::new(["member"]);
    assert_eq!(
        restarted.dispatch(&guest, "!greet").await,
        Outcome::Executed("Hello there\nWelcome!".to_string())
    );
    assert_eq!(
        restarted.dispatch(&guest, "!list").await,
        Outcome::Executed("`!greet`, `!list`, `!ping`".to_string())
    );
}

#[tokio::test]
async fn forget_reaches_disk_on_next_save() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("commands.json");
    let bot = Arc::new(RecordingBot::default());
    let admin = StaticCaller::new(["halp-admin"]);

    let registry = CommandRegistry::default().with_store(JsonStore::new(&path));
    register_builtins(&registry, &["halp-admin".to_string()], bot);

    registry.dispatch(&admin, "!learn greet\nhi").await;
    registry.dispatch(&admin, "!forget greet").await;
    assert!(std::fs::read_to_string(&path).unwrap().contains("greet"));

    registry.save().await;
    assert_eq!(std::fs::read_to_string(&path).unwrap().trim(), "{}");
}

#[tokio::test]
async fn non_commands_get_no_reply() {
    let bot = RecordingBot::default();
    let registry = Arc::new(CommandRegistry::default());
    let dispatcher = MessageDispatcher::new(registry);
    let caller = StaticCaller::unavailable();

    for (i, text) in ["hello", "!", "!unknown", "! spaced"].iter().enumerate() {
        let handled = dispatcher
            .handle(&bot, &message(i as u32, text), &caller)
            .await
            .unwrap();
        assert!(matches!(handled, Handled::Dispatched(ref o) if !o.matched()));
    }
    assert!(bot.sent.lock().unwrap().is_empty());
}
