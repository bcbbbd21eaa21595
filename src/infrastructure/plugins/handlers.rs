//! Compiled handler table.
//!
//! Manifests refer to handlers by name; the host registers the matching
//! functions here before loading.

use std::collections::HashMap;
use std::future::Future;

use crate::domain::entities::{
    command_fn, listener_fn, slash_fn, CommandContext, CommandFn, EventContext, HandlerResult,
    ListenerFn, SlashContext, SlashFn, UnitKind,
};

#[derive(Clone, Default)]
pub struct HandlerTable {
    commands: HashMap<String, CommandFn>,
    slash_commands: HashMap<String, SlashFn>,
    events: HashMap<String, ListenerFn>,
}

impl HandlerTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn command<F, Fut>(mut self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(CommandContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.commands.insert(name.into(), command_fn(f));
        self
    }

    pub fn slash_command<F, Fut>(mut self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(SlashContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.slash_commands.insert(name.into(), slash_fn(f));
        self
    }

    pub fn event<F, Fut>(mut self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(EventContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.events.insert(name.into(), listener_fn(f));
        self
    }

    pub fn get_command(&self, name: &str) -> Option<CommandFn> {
        self.commands.get(name).cloned()
    }

    pub fn get_slash_command(&self, name: &str) -> Option<SlashFn> {
        self.slash_commands.get(name).cloned()
    }

    pub fn get_event(&self, name: &str) -> Option<ListenerFn> {
        self.events.get(name).cloned()
    }

    pub fn contains(&self, kind: UnitKind, name: &str) -> bool {
        match kind {
            UnitKind::Command => self.commands.contains_key(name),
            UnitKind::SlashCommand => self.slash_commands.contains_key(name),
            UnitKind::Event => self.events.contains_key(name),
        }
    }

    pub fn len(&self) -> usize {
        self.commands.len() + self.slash_commands.len() + self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
