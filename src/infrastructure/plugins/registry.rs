//! Unit registry - Indexes loaded units by name, alias and event category

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::application::errors::RegistryError;
use crate::domain::entities::{Command, EventListener, SlashCommand};
use crate::domain::traits::SubscriptionId;

/// Listeners of one event category, in dispatch order
#[derive(Debug, Clone)]
pub struct CategoryEntry {
    pub listeners: Arc<[Arc<EventListener>]>,
    /// Runner bound on the transport client, if any
    pub subscription: Option<SubscriptionId>,
}

#[derive(Default)]
struct CommandIndex {
    by_name: HashMap<String, Arc<Command>>,
    /// alias -> command name
    aliases: HashMap<String, String>,
}

impl CommandIndex {
    fn resolve(&self, name_or_alias: &str) -> Option<Arc<Command>> {
        self.by_name.get(name_or_alias).cloned().or_else(|| {
            self.aliases
                .get(name_or_alias)
                .and_then(|name| self.by_name.get(name))
                .cloned()
        })
    }
}

/// Registry for loaded commands, slash commands and event listeners
#[derive(Default)]
pub struct Registry {
    commands: RwLock<CommandIndex>,
    slash_commands: RwLock<HashMap<String, Arc<SlashCommand>>>,
    events: RwLock<HashMap<String, CategoryEntry>>,
}

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a command. The first registered command keeps a name or
    /// alias; later conflicting commands are rejected.
    pub fn insert_command(&self, command: Arc<Command>) -> Result<(), RegistryError> {
        let mut index = write(&self.commands);

        if index.resolve(command.name()).is_some() {
            return Err(RegistryError::NameTaken(command.name().to_string()));
        }
        if let Some(alias) = command.aliases().iter().find(|a| index.resolve(a).is_some()) {
            return Err(RegistryError::AliasTaken {
                name: command.name().to_string(),
                alias: alias.clone(),
            });
        }

        for alias in command.aliases() {
            index.aliases.insert(alias.clone(), command.name().to_string());
        }
        index.by_name.insert(command.name().to_string(), command);
        Ok(())
    }

    pub fn get_command(&self, name: &str) -> Option<Arc<Command>> {
        read(&self.commands).by_name.get(name).cloned()
    }

    pub fn get_command_or_aliases(&self, name_or_alias: &str) -> Option<Arc<Command>> {
        read(&self.commands).resolve(name_or_alias)
    }

    /// All commands, sorted by name
    pub fn get_commands(&self) -> Vec<Arc<Command>> {
        let mut commands: Vec<_> = read(&self.commands).by_name.values().cloned().collect();
        commands.sort_by(|a, b| a.name().cmp(b.name()));
        commands
    }

    pub fn remove_command(&self, name: &str) -> Option<Arc<Command>> {
        let mut index = write(&self.commands);
        let removed = index.by_name.remove(name)?;
        index.aliases.retain(|_, owner| owner != name);
        Some(removed)
    }

    pub fn clear_commands(&self) {
        let mut index = write(&self.commands);
        index.by_name.clear();
        index.aliases.clear();
    }

    /// Register a slash command under its resolved name.
    pub fn insert_slash_command(&self, slash: Arc<SlashCommand>) -> Result<String, RegistryError> {
        let name = slash.name();
        if name.trim().is_empty() {
            return Err(RegistryError::EmptySlashName);
        }

        let mut slash_commands = write(&self.slash_commands);
        if slash_commands.contains_key(&name) {
            return Err(RegistryError::NameTaken(name));
        }
        slash_commands.insert(name.clone(), slash);
        Ok(name)
    }

    pub fn get_slash_command(&self, name: &str) -> Option<Arc<SlashCommand>> {
        read(&self.slash_commands).get(name).cloned()
    }

    /// All slash commands, sorted by registered name
    pub fn get_slash_commands(&self) -> Vec<Arc<SlashCommand>> {
        let slash_commands = read(&self.slash_commands);
        let mut names: Vec<_> = slash_commands.keys().collect();
        names.sort();
        names
            .into_iter()
            .filter_map(|name| slash_commands.get(name).cloned())
            .collect()
    }

    pub fn remove_slash_command(&self, name: &str) -> Option<Arc<SlashCommand>> {
        write(&self.slash_commands).remove(name)
    }

    pub fn clear_slash_commands(&self) {
        write(&self.slash_commands).clear();
    }

    pub fn set_category(&self, category: impl Into<String>, entry: CategoryEntry) {
        write(&self.events).insert(category.into(), entry);
    }

    pub fn get_event_category(&self, category: &str) -> Option<CategoryEntry> {
        read(&self.events).get(category).cloned()
    }

    /// Every listener of every category, categories sorted by name
    pub fn get_events(&self) -> Vec<Arc<EventListener>> {
        let events = read(&self.events);
        let mut categories: Vec<_> = events.keys().collect();
        categories.sort();
        categories
            .into_iter()
            .filter_map(|c| events.get(c))
            .flat_map(|entry| entry.listeners.iter().cloned())
            .collect()
    }

    pub fn event_category_count(&self) -> usize {
        read(&self.events).len()
    }

    /// Remove every category, returning what was registered
    pub fn take_categories(&self) -> Vec<(String, CategoryEntry)> {
        write(&self.events).drain().collect()
    }
}

/// Order listeners for dispatch: listeners with a run order first, ascending,
/// then the rest. Ties keep discovery order.
pub fn sort_listeners(mut listeners: Vec<Arc<EventListener>>) -> Vec<Arc<EventListener>> {
    listeners.sort_by_key(|l| (l.run_order().is_none(), l.run_order().unwrap_or(0)));
    listeners
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{CommandData, EventData, SlashCommandBuilder};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn command(name: &str, aliases: &[&str]) -> Arc<Command> {
        Arc::new(
            CommandData::new(name)
                .aliases(aliases.iter().copied())
                .handler(|_ctx| async { Ok(()) })
                .build()
                .unwrap(),
        )
    }

    fn listener(order: Option<u64>, tag: &str) -> Arc<EventListener> {
        let mut data = EventData::new(tag).handler(|_ctx| async { Ok(()) });
        data.run_order = order;
        Arc::new(data.build().unwrap())
    }

    #[test]
    fn test_lookup_by_name_and_alias() {
        let registry = Registry::new();
        registry.insert_command(command("ping", &["p"])).unwrap();

        assert!(registry.get_command("ping").is_some());
        assert!(registry.get_command("p").is_none());
        assert_eq!(registry.get_command_or_aliases("p").unwrap().name(), "ping");
        assert!(registry.get_command_or_aliases("x").is_none());
    }

    #[test]
    fn test_first_registered_wins() {
        let registry = Registry::new();
        registry.insert_command(command("ping", &["p"])).unwrap();

        assert_eq!(
            registry.insert_command(command("ping", &[])),
            Err(RegistryError::NameTaken("ping".into()))
        );
        // a new name that collides with an existing alias
        assert_eq!(
            registry.insert_command(command("p", &[])),
            Err(RegistryError::NameTaken("p".into()))
        );
        assert_eq!(
            registry.insert_command(command("pong", &["x", "ping"])),
            Err(RegistryError::AliasTaken {
                name: "pong".into(),
                alias: "ping".into()
            })
        );

        let commands = registry.get_commands();
        assert_eq!(commands.len(), 1);
        assert_eq!(commands[0].aliases(), ["p".to_string()]);
        assert!(registry.get_command_or_aliases("x").is_none());
    }

    #[test]
    fn test_remove_command_drops_aliases() {
        let registry = Registry::new();
        registry.insert_command(command("ping", &["p"])).unwrap();

        assert!(registry.remove_command("ping").is_some());
        assert!(registry.get_command_or_aliases("p").is_none());
        registry.insert_command(command("p", &[])).unwrap();
    }

    #[test]
    fn test_slash_commands() {
        let registry = Registry::new();
        let slash = |name: &str| {
            Arc::new(
                SlashCommand::builder()
                    .definition(SlashCommandBuilder::new().name(name))
                    .handler(|_ctx| async { Ok(()) })
                    .build()
                    .unwrap(),
            )
        };

        assert_eq!(registry.insert_slash_command(slash("ping")).unwrap(), "ping");
        assert_eq!(
            registry.insert_slash_command(slash("ping")),
            Err(RegistryError::NameTaken("ping".into()))
        );
        // a builder can stop producing a name after construction
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let fading = SlashCommand::builder()
            .build_definition(move |b| match counter.fetch_add(1, Ordering::SeqCst) {
                0 => b.name("fading"),
                _ => b.name(" "),
            })
            .handler(|_ctx| async { Ok(()) })
            .build()
            .unwrap();
        assert_eq!(
            registry.insert_slash_command(Arc::new(fading)),
            Err(RegistryError::EmptySlashName)
        );
        // message commands live in a separate namespace
        registry.insert_command(command("ping", &[])).unwrap();

        assert!(registry.remove_slash_command("ping").is_some());
        assert!(registry.get_slash_commands().is_empty());
    }

    #[test]
    fn test_listener_order() {
        let sorted = sort_listeners(vec![
            listener(Some(5), "a"),
            listener(Some(1), "b"),
            listener(None, "c"),
            listener(Some(2), "d"),
            listener(None, "e"),
            listener(Some(1), "f"),
        ]);

        let order: Vec<_> = sorted.iter().map(|l| (l.run_order(), l.category())).collect();
        assert_eq!(
            order,
            vec![
                (Some(1), "b"),
                (Some(1), "f"),
                (Some(2), "d"),
                (Some(5), "a"),
                (None, "c"),
                (None, "e"),
            ]
        );
    }
}
