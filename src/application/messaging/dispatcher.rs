//! Message dispatcher - Routes messages and interactions to command handlers

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use tokio::task::JoinHandle;

use super::gates::{Dispatch, Gates, Rejection};
use super::parser::MessageParser;
use crate::application::cooldown::CooldownStore;
use crate::application::errors::{BotError, ConfigError, LoadError, RegistryError};
use crate::application::tasks::run_isolated;
use crate::domain::entities::{
    ClientEvent, Command, CommandContext, Interaction, Message, SlashCommand, SlashContext, Unit,
    UnitKind, INTERACTION_CREATE, MESSAGE_CREATE,
};
use crate::domain::traits::{Bot, EventCallback, SubscriptionId};
use crate::infrastructure::config::HandlerConfig;
use crate::infrastructure::plugins::{HandlerTable, Registry, UnitLoader};

/// Loads commands and slash commands and dispatches invocations to them
pub struct CommandHandler {
    config: HandlerConfig,
    parser: MessageParser,
    loader: UnitLoader,
    registry: Arc<Registry>,
    cooldowns: Arc<CooldownStore>,
    bot: Arc<dyn Bot>,
    message_subscription: Mutex<Option<SubscriptionId>>,
    slash_subscription: Mutex<Option<SubscriptionId>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl CommandHandler {
    /// Create a handler; the configuration is validated eagerly.
    pub fn new(
        config: HandlerConfig,
        bot: Arc<dyn Bot>,
        handlers: Arc<HandlerTable>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        Ok(Self {
            parser: MessageParser::new(config.prefix.clone()),
            loader: UnitLoader::new(handlers, config.suppress_warnings),
            registry: Arc::new(Registry::new()),
            cooldowns: Arc::new(CooldownStore::new()),
            bot,
            config,
            message_subscription: Mutex::new(None),
            slash_subscription: Mutex::new(None),
        })
    }

    /// Share a registry with other handlers
    pub fn with_registry(mut self, registry: Arc<Registry>) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_cooldowns(mut self, cooldowns: Arc<CooldownStore>) -> Self {
        self.cooldowns = cooldowns;
        self
    }

    pub fn config(&self) -> &HandlerConfig {
        &self.config
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    pub fn cooldowns(&self) -> &Arc<CooldownStore> {
        &self.cooldowns
    }

    fn warn(&self, message: impl AsRef<str>) {
        if !self.config.suppress_warnings {
            tracing::warn!("{}", message.as_ref());
        }
    }

    // ---- loading -------------------------------------------------------

    /// Re-scan the commands directory. Previously loaded commands are
    /// cleared first. Never fails; problems are logged.
    pub async fn set_commands(&self) {
        self.registry.clear_commands();
        if let Err(e) = self.load_commands(&self.config.commands_dir).await {
            tracing::error!("Failed to set commands!");
            tracing::error!("{}", e);
        }
    }

    async fn load_commands(&self, dir: &Path) -> Result<usize, LoadError> {
        let units = self.loader.load_dir(dir, UnitKind::Command).await?;

        let mut loaded = 0;
        for loaded_unit in units {
            let Unit::Command(command) = loaded_unit.unit else {
                continue;
            };
            let name = command.name().to_string();
            match self.registry.insert_command(command) {
                Ok(()) => {
                    tracing::info!("Command '{}' ({}) loaded successfully.", loaded_unit.file_name, name);
                    loaded += 1;
                }
                Err(e) => self.warn(format!("{} (from '{}')", e, loaded_unit.file_name)),
            }
        }

        tracing::info!("{} {} registered.", loaded, UnitKind::Command.plural(loaded));
        Ok(loaded)
    }

    /// Re-scan the slash commands directory. Never fails; problems are logged.
    pub async fn set_slash_commands(&self) {
        self.registry.clear_slash_commands();
        if let Err(e) = self.load_slash_commands(&self.config.slash_commands_dir).await {
            tracing::error!("Failed to set slash commands!");
            tracing::error!("{}", e);
        }
    }

    async fn load_slash_commands(&self, dir: &Path) -> Result<usize, LoadError> {
        let units = self.loader.load_dir(dir, UnitKind::SlashCommand).await?;

        let mut loaded = 0;
        for loaded_unit in units {
            let Unit::SlashCommand(slash) = loaded_unit.unit else {
                continue;
            };
            match self.registry.insert_slash_command(slash) {
                Ok(name) => {
                    tracing::info!("Slash command '{}' ({}) loaded successfully.", loaded_unit.file_name, name);
                    loaded += 1;
                }
                Err(e) => self.warn(format!("{} (from '{}')", e, loaded_unit.file_name)),
            }
        }

        tracing::info!("{} {} registered.", loaded, UnitKind::SlashCommand.plural(loaded));
        Ok(loaded)
    }

    /// Register a command built in code, under the same collision rules
    pub fn add_command(&self, command: Command) -> Result<(), RegistryError> {
        self.registry.insert_command(Arc::new(command))
    }

    pub fn add_slash_command(&self, slash: SlashCommand) -> Result<String, RegistryError> {
        self.registry.insert_slash_command(Arc::new(slash))
    }

    // ---- registry surface ----------------------------------------------

    pub fn get_command(&self, name: &str) -> Option<Arc<Command>> {
        self.registry.get_command(name)
    }

    pub fn get_command_or_aliases(&self, name_or_alias: &str) -> Option<Arc<Command>> {
        self.registry.get_command_or_aliases(name_or_alias)
    }

    pub fn get_commands(&self) -> Vec<Arc<Command>> {
        self.registry.get_commands()
    }

    pub fn remove_command(&self, name: &str) -> &Self {
        self.registry.remove_command(name);
        self
    }

    pub fn clear_commands(&self) -> &Self {
        self.registry.clear_commands();
        self
    }

    pub fn get_slash_command(&self, name: &str) -> Option<Arc<SlashCommand>> {
        self.registry.get_slash_command(name)
    }

    pub fn get_slash_commands(&self) -> Vec<Arc<SlashCommand>> {
        self.registry.get_slash_commands()
    }

    pub fn remove_slash_command(&self, name: &str) -> &Self {
        self.registry.remove_slash_command(name);
        self
    }

    pub fn clear_slash_commands(&self) -> &Self {
        self.registry.clear_slash_commands();
        self
    }

    /// Push every loaded slash command's definition to the remote service,
    /// globally or to one guild.
    pub async fn register_slash_commands(
        &self,
        client: &dyn Bot,
        guild_id: Option<&str>,
    ) -> Result<(), BotError> {
        let definitions = self
            .registry
            .get_slash_commands()
            .iter()
            .map(|slash| slash.definition())
            .collect();
        client.set_application_commands(definitions, guild_id).await
    }

    // ---- dispatch ------------------------------------------------------

    /// Run the message command pipeline. Never returns an error; the
    /// outcome is reported for logging and tests.
    pub async fn run_default_handler(&self, message: Message, prefix_override: Option<&str>) -> Dispatch {
        if message.author.is_bot {
            return Rejection::BotSender.into();
        }
        if !self.parser.has_prefix(&message.content, prefix_override) {
            return Rejection::NoPrefix.into();
        }
        let Some(parsed) = self.parser.parse(&message.content, prefix_override) else {
            return Rejection::EmptyCommand.into();
        };
        let Some(command) = self.registry.get_command_or_aliases(&parsed.name) else {
            return Rejection::NotFound.into();
        };

        let target = message.reply_target();
        let gates = Gates {
            cooldowns: &self.cooldowns,
            config: &self.config,
            bot: self.bot.as_ref(),
            user_id: &message.author.id,
            target: &target,
        };
        let unit = command.as_ref();
        let passed = async {
            gates.context(command.context(), message.is_in_guild())?;
            gates.cooldown(unit).await?;
            gates.maintenance(unit).await?;
            gates.developer_only(unit)
        };
        if let Err(rejection) = passed.await {
            tracing::debug!("Command '{}' rejected for {}: {}", command.name(), message.author.id, rejection);
            return rejection.into();
        }

        self.cooldowns.add(&message.author.id, unit, None);

        let ctx = CommandContext {
            message,
            args: parsed.args,
            bot: Arc::clone(&self.bot),
        };
        let handler = Arc::clone(command.handler());
        match run_isolated(async move { handler(ctx).await }).await {
            Ok(()) => Dispatch::Executed,
            Err(failure) => {
                tracing::error!("Command '{}' failed: {}", command.name(), failure);
                Dispatch::Failed(failure.to_string())
            }
        }
    }

    /// Run the slash command pipeline. Never returns an error.
    pub async fn run_default_slash_handler(&self, interaction: Interaction) -> Dispatch {
        if interaction.user.is_bot {
            return Rejection::BotSender.into();
        }
        if !interaction.is_chat_input() {
            return Rejection::NotChatInput.into();
        }
        let Some(slash) = self.registry.get_slash_command(&interaction.command_name) else {
            return Rejection::NotFound.into();
        };

        let target = interaction.reply_target();
        let gates = Gates {
            cooldowns: &self.cooldowns,
            config: &self.config,
            bot: self.bot.as_ref(),
            user_id: &interaction.user.id,
            target: &target,
        };
        let unit = slash.as_ref();
        let passed = async {
            gates.cooldown(unit).await?;
            gates.maintenance(unit).await?;
            gates.developer_only(unit)
        };
        if let Err(rejection) = passed.await {
            tracing::debug!(
                "Slash command '{}' rejected for {}: {}",
                interaction.command_name,
                interaction.user.id,
                rejection
            );
            return rejection.into();
        }

        self.cooldowns.add(&interaction.user.id, unit, None);

        let name = interaction.command_name.clone();
        let ctx = SlashContext {
            interaction,
            bot: Arc::clone(&self.bot),
        };
        let handler = Arc::clone(slash.handler());
        match run_isolated(async move { handler(ctx).await }).await {
            Ok(()) => Dispatch::Executed,
            Err(failure) => {
                tracing::error!("Slash command '{}' failed: {}", name, failure);
                Dispatch::Failed(failure.to_string())
            }
        }
    }

    // ---- transport wiring ----------------------------------------------

    /// Bind `run_default_handler` to the client's message events.
    pub fn set_default_handler(self: &Arc<Self>, client: &dyn Bot) -> &Arc<Self> {
        self.warn(
            [
                "You are using the default command handler included in this package.",
                "This may restrict you when modifying the command handler.",
                "For example, you cannot change your bot's prefix per server!",
                "Call 'CommandHandler::run_default_handler(message, prefix)' from your own event listener for more flexibility.",
                "You can ignore this message by setting 'suppress-warnings' to true.",
            ]
            .join("\n"),
        );

        let weak = Arc::downgrade(self);
        let callback: EventCallback = Arc::new(move |event| {
            let weak: Weak<Self> = weak.clone();
            Box::pin(async move {
                if let (Some(handler), ClientEvent::MessageCreate(message)) = (weak.upgrade(), event) {
                    handler.run_default_handler(message, None).await;
                }
            })
        });

        let id = client.subscribe(MESSAGE_CREATE, callback);
        if let Some(previous) = lock(&self.message_subscription).replace(id) {
            client.unsubscribe(MESSAGE_CREATE, previous);
        }
        self
    }

    pub fn remove_default_handler(&self, client: &dyn Bot) -> &Self {
        self.warn("Default command handler removed from the bot.\nCommands will not be detected by the bot.");

        if let Some(id) = lock(&self.message_subscription).take() {
            client.unsubscribe(MESSAGE_CREATE, id);
        }
        self
    }

    /// Bind `run_default_slash_handler` to the client's interaction events.
    pub fn set_default_slash_handler(self: &Arc<Self>, client: &dyn Bot) -> &Arc<Self> {
        self.warn(
            [
                "You are using the default slash command handler included in this package.",
                "This may restrict you when modifying the slash command handler.",
                "Call 'CommandHandler::run_default_slash_handler(interaction)' from your own event listener for more flexibility.",
                "You can ignore this message by setting 'suppress-warnings' to true.",
            ]
            .join("\n"),
        );

        let weak = Arc::downgrade(self);
        let callback: EventCallback = Arc::new(move |event| {
            let weak: Weak<Self> = weak.clone();
            Box::pin(async move {
                if let (Some(handler), ClientEvent::InteractionCreate(interaction)) = (weak.upgrade(), event) {
                    handler.run_default_slash_handler(interaction).await;
                }
            })
        });

        let id = client.subscribe(INTERACTION_CREATE, callback);
        if let Some(previous) = lock(&self.slash_subscription).replace(id) {
            client.unsubscribe(INTERACTION_CREATE, previous);
        }
        self
    }

    pub fn remove_default_slash_handler(&self, client: &dyn Bot) -> &Self {
        self.warn("Default slash command handler removed from the bot.\nSlash commands will not be detected by the bot.");

        if let Some(id) = lock(&self.slash_subscription).take() {
            client.unsubscribe(INTERACTION_CREATE, id);
        }
        self
    }

    /// Start the periodic expired-cooldown sweep, if configured
    pub fn spawn_cooldown_sweeper(&self) -> Option<JoinHandle<()>> {
        match self.config.cooldown_sweep_secs {
            0 => None,
            secs => Some(self.cooldowns.spawn_sweeper(Duration::from_secs(secs))),
        }
    }
}
