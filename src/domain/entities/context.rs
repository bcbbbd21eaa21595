//! Invocation contexts handed to unit handlers

use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;

use super::{ClientEvent, Interaction, Message};
use crate::application::errors::HandlerError;
use crate::domain::traits::Bot;

/// Handler result
pub type HandlerResult = Result<(), HandlerError>;

/// Message command handler function type
pub type CommandFn = Arc<dyn Fn(CommandContext) -> BoxFuture<'static, HandlerResult> + Send + Sync>;

/// Slash command handler function type
pub type SlashFn = Arc<dyn Fn(SlashContext) -> BoxFuture<'static, HandlerResult> + Send + Sync>;

/// Event listener handler function type
pub type ListenerFn = Arc<dyn Fn(EventContext) -> BoxFuture<'static, HandlerResult> + Send + Sync>;

pub fn command_fn<F, Fut>(f: F) -> CommandFn
where
    F: Fn(CommandContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    Arc::new(move |ctx| Box::pin(f(ctx)))
}

pub fn slash_fn<F, Fut>(f: F) -> SlashFn
where
    F: Fn(SlashContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    Arc::new(move |ctx| Box::pin(f(ctx)))
}

pub fn listener_fn<F, Fut>(f: F) -> ListenerFn
where
    F: Fn(EventContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    Arc::new(move |ctx| Box::pin(f(ctx)))
}

/// Context for a message command invocation
#[derive(Clone)]
pub struct CommandContext {
    pub message: Message,
    pub args: Vec<String>,
    pub bot: Arc<dyn Bot>,
}

impl CommandContext {
    pub async fn reply(&self, text: &str) -> Result<String, HandlerError> {
        Ok(self.bot.reply(&self.message.reply_target(), text).await?)
    }
}

/// Context for a slash command invocation
#[derive(Clone)]
pub struct SlashContext {
    pub interaction: Interaction,
    pub bot: Arc<dyn Bot>,
}

impl SlashContext {
    pub async fn reply(&self, text: &str) -> Result<String, HandlerError> {
        Ok(self.bot.reply(&self.interaction.reply_target(), text).await?)
    }
}

/// Context for an event listener invocation
#[derive(Clone)]
pub struct EventContext {
    pub event: ClientEvent,
    pub bot: Arc<dyn Bot>,
}
