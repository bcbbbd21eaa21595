use super::User;
use crate::domain::traits::BotInfo;
use chrono::{DateTime, Utc};

/// Well-known event categories
pub const MESSAGE_CREATE: &str = "messageCreate";
pub const INTERACTION_CREATE: &str = "interactionCreate";
pub const READY: &str = "ready";

/// Represents an incoming chat message
#[derive(Debug, Clone)]
pub struct Message {
    pub id: String,
    pub chat_id: String,
    /// Set when the message was posted inside a guild
    pub guild_id: Option<String>,
    pub author: User,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    pub raw: Option<serde_json::Value>,
}

impl Message {
    pub fn new(chat_id: impl Into<String>, author: User, content: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            chat_id: chat_id.into(),
            guild_id: None,
            author,
            content: content.into(),
            timestamp: Utc::now(),
            raw: None,
        }
    }

    pub fn in_guild(mut self, guild_id: impl Into<String>) -> Self {
        self.guild_id = Some(guild_id.into());
        self
    }

    pub fn with_raw(mut self, raw: serde_json::Value) -> Self {
        self.raw = Some(raw);
        self
    }

    pub fn is_in_guild(&self) -> bool {
        self.guild_id.is_some()
    }

    pub fn reply_target(&self) -> ReplyTarget {
        ReplyTarget::Message {
            chat_id: self.chat_id.clone(),
            message_id: self.id.clone(),
        }
    }
}

/// Type of interaction delivered by the chat service
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteractionKind {
    ChatInput,
    Autocomplete,
    Component,
}

/// An application-command interaction
#[derive(Debug, Clone)]
pub struct Interaction {
    pub id: String,
    pub kind: InteractionKind,
    pub command_name: String,
    pub user: User,
    pub channel_id: String,
    pub guild_id: Option<String>,
    pub options: serde_json::Map<String, serde_json::Value>,
    pub timestamp: DateTime<Utc>,
}

impl Interaction {
    pub fn chat_input(
        channel_id: impl Into<String>,
        user: User,
        command_name: impl Into<String>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            kind: InteractionKind::ChatInput,
            command_name: command_name.into(),
            user,
            channel_id: channel_id.into(),
            guild_id: None,
            options: serde_json::Map::new(),
            timestamp: Utc::now(),
        }
    }

    pub fn with_kind(mut self, kind: InteractionKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn in_guild(mut self, guild_id: impl Into<String>) -> Self {
        self.guild_id = Some(guild_id.into());
        self
    }

    pub fn with_option(mut self, name: impl Into<String>, value: serde_json::Value) -> Self {
        self.options.insert(name.into(), value);
        self
    }

    pub fn option(&self, name: &str) -> Option<&serde_json::Value> {
        self.options.get(name)
    }

    pub fn is_chat_input(&self) -> bool {
        self.kind == InteractionKind::ChatInput
    }

    pub fn reply_target(&self) -> ReplyTarget {
        ReplyTarget::Interaction {
            channel_id: self.channel_id.clone(),
            interaction_id: self.id.clone(),
        }
    }
}

/// Where a reply should be delivered
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplyTarget {
    Message { chat_id: String, message_id: String },
    Interaction { channel_id: String, interaction_id: String },
}

impl ReplyTarget {
    pub fn channel(&self) -> &str {
        match self {
            ReplyTarget::Message { chat_id, .. } => chat_id,
            ReplyTarget::Interaction { channel_id, .. } => channel_id,
        }
    }
}

/// One occurrence delivered by the transport client
#[derive(Debug, Clone)]
pub enum ClientEvent {
    MessageCreate(Message),
    InteractionCreate(Interaction),
    Ready(BotInfo),
    Custom {
        category: String,
        data: serde_json::Value,
    },
}

impl ClientEvent {
    pub fn custom(category: impl Into<String>, data: serde_json::Value) -> Self {
        ClientEvent::Custom {
            category: category.into(),
            data,
        }
    }

    pub fn category(&self) -> &str {
        match self {
            ClientEvent::MessageCreate(_) => MESSAGE_CREATE,
            ClientEvent::InteractionCreate(_) => INTERACTION_CREATE,
            ClientEvent::Ready(_) => READY,
            ClientEvent::Custom { category, .. } => category,
        }
    }
}
