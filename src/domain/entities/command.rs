use std::fmt;
use std::future::Future;

use super::context::{command_fn, CommandContext, CommandFn, HandlerResult};
use super::unit::{Gated, UnitKind};
use super::validation::Validator;
use crate::application::errors::ValidationError;

/// Where a command may be invoked. Restriction applies only when exactly
/// one flag is set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ContextFlags {
    pub guild_only: bool,
    pub dm_only: bool,
}

impl ContextFlags {
    pub fn allows(&self, in_guild: bool) -> bool {
        match (self.guild_only, self.dm_only) {
            (true, false) => in_guild,
            (false, true) => !in_guild,
            _ => true,
        }
    }

    pub fn is_restricted(&self) -> bool {
        self.guild_only != self.dm_only
    }
}

/// Represents a validated prefix command
pub struct Command {
    name: String,
    aliases: Vec<String>,
    context: ContextFlags,
    developer_only: bool,
    maintenance: bool,
    cooldown: Option<f64>,
    handler: CommandFn,
}

impl Command {
    /// Validate `data` and build the command
    pub fn new(data: CommandData) -> Result<Self, ValidationError> {
        data.build()
    }

    pub fn builder(name: impl Into<String>) -> CommandData {
        CommandData::new(name)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    pub fn context(&self) -> ContextFlags {
        self.context
    }

    pub fn developer_only(&self) -> bool {
        self.developer_only
    }

    pub fn maintenance(&self) -> bool {
        self.maintenance
    }

    pub fn cooldown(&self) -> Option<f64> {
        self.cooldown
    }

    pub fn handler(&self) -> &CommandFn {
        &self.handler
    }

    /// Name and aliases, in that order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.name.as_str()).chain(self.aliases.iter().map(String::as_str))
    }

    pub fn matches(&self, input: &str) -> bool {
        self.names().any(|n| n == input)
    }
}

impl Gated for Command {
    fn kind(&self) -> UnitKind {
        UnitKind::Command
    }

    fn cooldown_name(&self) -> String {
        self.name.clone()
    }

    fn cooldown(&self) -> Option<f64> {
        self.cooldown
    }

    fn developer_only(&self) -> bool {
        self.developer_only
    }

    fn maintenance(&self) -> bool {
        self.maintenance
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("name", &self.name)
            .field("aliases", &self.aliases)
            .field("context", &self.context)
            .field("developer_only", &self.developer_only)
            .field("maintenance", &self.maintenance)
            .field("cooldown", &self.cooldown)
            .finish_non_exhaustive()
    }
}

/// Raw configuration for a `Command`
#[derive(Default)]
pub struct CommandData {
    pub name: String,
    pub aliases: Vec<String>,
    pub guild_only: Option<bool>,
    pub dm_only: Option<bool>,
    pub developer_only: Option<bool>,
    pub maintenance: Option<bool>,
    pub cooldown: Option<f64>,
    pub handler: Option<CommandFn>,
}

impl CommandData {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn aliases<I, S>(mut self, aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.aliases = aliases.into_iter().map(Into::into).collect();
        self
    }

    pub fn guild_only(mut self, value: bool) -> Self {
        self.guild_only = Some(value);
        self
    }

    pub fn dm_only(mut self, value: bool) -> Self {
        self.dm_only = Some(value);
        self
    }

    pub fn developer_only(mut self, value: bool) -> Self {
        self.developer_only = Some(value);
        self
    }

    pub fn maintenance(mut self, value: bool) -> Self {
        self.maintenance = Some(value);
        self
    }

    pub fn cooldown(mut self, seconds: f64) -> Self {
        self.cooldown = Some(seconds);
        self
    }

    pub fn handler<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(CommandContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.handler = Some(command_fn(f));
        self
    }

    pub fn runner(mut self, handler: CommandFn) -> Self {
        self.handler = Some(handler);
        self
    }

    pub fn build(self) -> Result<Command, ValidationError> {
        self.build_with(Validator::new("command"))
    }

    /// Finish validation on a validator that may already hold issues
    /// found while reading untyped data.
    pub(crate) fn build_with(self, mut v: Validator) -> Result<Command, ValidationError> {
        v.non_empty("name", &self.name);
        v.aliases(&self.aliases);
        v.cooldown(self.cooldown);

        if let (Some(guild_only), Some(dm_only)) = (self.guild_only, self.dm_only) {
            if guild_only == dm_only {
                tracing::warn!(
                    "Command '{}' sets guild-only and dm-only both to {} (same as not setting them). Command can work everywhere.",
                    self.name,
                    guild_only
                );
            }
        }

        let handler = v.finish_with("handler", self.handler)?;

        Ok(Command {
            name: self.name,
            aliases: self.aliases,
            context: ContextFlags {
                guild_only: self.guild_only.unwrap_or(false),
                dm_only: self.dm_only.unwrap_or(false),
            },
            developer_only: self.developer_only.unwrap_or(false),
            maintenance: self.maintenance.unwrap_or(false),
            cooldown: self.cooldown,
            handler,
        })
    }
}
