//! Domain entities - units, messages and events

pub mod command;
pub mod context;
pub mod event;
pub mod message;
pub mod slash_command;
pub mod slash_definition;
pub mod unit;
pub mod user;
pub mod validation;

pub use command::{Command, CommandData, ContextFlags};
pub use context::{
    command_fn, listener_fn, slash_fn, CommandContext, CommandFn, EventContext, HandlerResult,
    ListenerFn, SlashContext, SlashFn,
};
pub use event::{EventData, EventListener};
pub use message::{
    ClientEvent, Interaction, InteractionKind, Message, ReplyTarget, INTERACTION_CREATE,
    MESSAGE_CREATE, READY,
};
pub use slash_command::{BuilderFn, DefinitionSource, SlashCommand, SlashCommandData};
pub use slash_definition::{OptionKind, SlashCommandBuilder, SlashCommandDefinition, SlashOption};
pub use unit::{Gated, Unit, UnitKind};
pub use user::User;
pub use validation::{Validator, MAX_SAFE_INTEGER};
