use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;

use crate::application::errors::BotError;
use crate::domain::entities::{ClientEvent, ReplyTarget, SlashCommandDefinition};

/// Callback bound to one event category on the transport client
pub type EventCallback = Arc<dyn Fn(ClientEvent) -> BoxFuture<'static, ()> + Send + Sync>;

/// Handle returned by `Bot::subscribe`, used to deregister the callback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(uuid::Uuid);

impl SubscriptionId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for SubscriptionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Bot trait - abstraction over the chat transport client
#[async_trait]
pub trait Bot: Send + Sync {
    /// Reply to a message or interaction
    async fn reply(&self, target: &ReplyTarget, text: &str) -> Result<String, BotError>;

    /// Replace the remote application commands, globally or for one guild
    async fn set_application_commands(
        &self,
        commands: Vec<SlashCommandDefinition>,
        guild_id: Option<&str>,
    ) -> Result<(), BotError>;

    /// Bind a callback to an event category
    fn subscribe(&self, category: &str, callback: EventCallback) -> SubscriptionId;

    /// Remove a callback; returns false if it was not bound
    fn unsubscribe(&self, category: &str, id: SubscriptionId) -> bool;

    /// Get bot info
    fn bot_info(&self) -> BotInfo;
}

/// Bot information
#[derive(Debug, Clone)]
pub struct BotInfo {
    pub id: String,
    pub name: String,
    pub username: String,
}
