//! The closed set of loadable units

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::{Command, EventListener, SlashCommand};

/// Unit variant tag. Also the cooldown namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum UnitKind {
    Command,
    SlashCommand,
    Event,
}

impl UnitKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnitKind::Command => "command",
            UnitKind::SlashCommand => "slash command",
            UnitKind::Event => "event",
        }
    }

    pub fn plural(&self, count: usize) -> String {
        if count == 1 {
            self.as_str().to_string()
        } else {
            format!("{}s", self.as_str())
        }
    }
}

impl fmt::Display for UnitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A loaded, validated unit
#[derive(Debug, Clone)]
pub enum Unit {
    Command(Arc<Command>),
    SlashCommand(Arc<SlashCommand>),
    Event(Arc<EventListener>),
}

impl Unit {
    pub fn kind(&self) -> UnitKind {
        match self {
            Unit::Command(_) => UnitKind::Command,
            Unit::SlashCommand(_) => UnitKind::SlashCommand,
            Unit::Event(_) => UnitKind::Event,
        }
    }

    /// Command name, resolved slash name, or event category
    pub fn label(&self) -> String {
        match self {
            Unit::Command(cmd) => cmd.name().to_string(),
            Unit::SlashCommand(slash) => slash.name(),
            Unit::Event(listener) => listener.category().to_string(),
        }
    }
}

impl From<Command> for Unit {
    fn from(cmd: Command) -> Self {
        Unit::Command(Arc::new(cmd))
    }
}

impl From<SlashCommand> for Unit {
    fn from(slash: SlashCommand) -> Self {
        Unit::SlashCommand(Arc::new(slash))
    }
}

impl From<EventListener> for Unit {
    fn from(listener: EventListener) -> Self {
        Unit::Event(Arc::new(listener))
    }
}

/// Units that pass through the dispatch gates
pub trait Gated: Send + Sync {
    fn kind(&self) -> UnitKind;

    /// Name used in the cooldown key
    fn cooldown_name(&self) -> String;

    /// Configured cooldown in seconds, if any
    fn cooldown(&self) -> Option<f64>;

    fn developer_only(&self) -> bool;

    fn maintenance(&self) -> bool;

    fn has_cooldown(&self) -> bool {
        matches!(self.cooldown(), Some(secs) if secs > 0.0)
    }
}
