//! Console adapter for development/testing

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::sync::mpsc;
use crate::domain::entities::{ClientEvent, ReplyTarget, SlashCommandDefinition};
use crate::domain::traits::{Bot, BotInfo, EventCallback, SubscriptionId};
use crate::application::errors::BotError;

type Subscriptions = HashMap<String, Vec<(SubscriptionId, EventCallback)>>;

/// Console bot adapter for local development
pub struct ConsoleAdapter {
    info: BotInfo,
    sender: Option<mpsc::UnboundedSender<String>>,
    subscriptions: Mutex<Subscriptions>,
    application_commands: Mutex<HashMap<Option<String>, Vec<SlashCommandDefinition>>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl ConsoleAdapter {
    pub fn new() -> Self {
        Self {
            info: BotInfo {
                id: "console".to_string(),
                name: "botbase".to_string(),
                username: "console".to_string(),
            },
            sender: None,
            subscriptions: Mutex::new(HashMap::new()),
            application_commands: Mutex::new(HashMap::new()),
        }
    }

    /// Send replies to `sender` instead of stdout
    pub fn with_sender(mut self, sender: mpsc::UnboundedSender<String>) -> Self {
        self.sender = Some(sender);
        self
    }

    /// Deliver an event to every callback bound to its category, in
    /// subscription order.
    pub async fn emit(&self, event: ClientEvent) {
        let callbacks: Vec<EventCallback> = lock(&self.subscriptions)
            .get(event.category())
            .map(|subs| subs.iter().map(|(_, cb)| cb.clone()).collect())
            .unwrap_or_default();

        for callback in callbacks {
            callback(event.clone()).await;
        }
    }

    pub fn subscriber_count(&self, category: &str) -> usize {
        lock(&self.subscriptions).get(category).map_or(0, Vec::len)
    }

    /// Commands last pushed for `guild_id` (`None` for global)
    pub fn application_commands(&self, guild_id: Option<&str>) -> Vec<SlashCommandDefinition> {
        lock(&self.application_commands)
            .get(&guild_id.map(str::to_string))
            .cloned()
            .unwrap_or_default()
    }
}

impl Default for ConsoleAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Bot for ConsoleAdapter {
    async fn reply(&self, target: &ReplyTarget, text: &str) -> Result<String, BotError> {
        match &self.sender {
            Some(sender) => sender
                .send(text.to_string())
                .map_err(|e| BotError::Send(e.to_string()))?,
            None => println!("[BOT] {}", text),
        }
        Ok(format!("console_msg:{}", target.channel()))
    }

    async fn set_application_commands(
        &self,
        commands: Vec<SlashCommandDefinition>,
        guild_id: Option<&str>,
    ) -> Result<(), BotError> {
        tracing::info!(
            "Registered {} application commands ({})",
            commands.len(),
            guild_id.map_or_else(|| "global".to_string(), |g| format!("guild {}", g))
        );
        lock(&self.application_commands).insert(guild_id.map(str::to_string), commands);
        Ok(())
    }

    fn subscribe(&self, category: &str, callback: EventCallback) -> SubscriptionId {
        let id = SubscriptionId::new();
        lock(&self.subscriptions)
            .entry(category.to_string())
            .or_default()
            .push((id, callback));
        id
    }

    fn unsubscribe(&self, category: &str, id: SubscriptionId) -> bool {
        let mut subscriptions = lock(&self.subscriptions);
        let Some(subs) = subscriptions.get_mut(category) else {
            return false;
        };
        let before = subs.len();
        subs.retain(|(sub, _)| *sub != id);
        let removed = subs.len() != before;
        if subs.is_empty() {
            subscriptions.remove(category);
        }
        removed
    }

    fn bot_info(&self) -> BotInfo {
        self.info.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_subscribe_emit_unsubscribe() {
        let bot = ConsoleAdapter::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        let callback: EventCallback = Arc::new(move |_event| {
            counter.fetch_add(1, Ordering::SeqCst);
            Box::pin(async {})
        });

        let id = bot.subscribe("ready", callback);
        bot.emit(ClientEvent::Ready(bot.bot_info())).await;
        bot.emit(ClientEvent::custom("other", serde_json::Value::Null)).await;
        assert_eq!(hits.load(Ordering::SeqCst), 1);

        assert!(bot.unsubscribe("ready", id));
        assert!(!bot.unsubscribe("ready", id));
        assert_eq!(bot.subscriber_count("ready"), 0);
    }

    #[tokio::test]
    async fn test_reply_goes_to_sender() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let bot = ConsoleAdapter::new().with_sender(tx);
        let target = ReplyTarget::Message {
            chat_id: "c1".into(),
            message_id: "m1".into(),
        };

        bot.reply(&target, "hello").await.unwrap();
        assert_eq!(rx.recv().await.as_deref(), Some("hello"));
    }
}
