//! Event handler - Loads event listeners and binds one runner per category

use std::collections::HashMap;
use std::sync::{Arc, Weak};

use super::router::{route, RouteOutcome};
use crate::application::errors::{ConfigError, LoadError};
use crate::domain::entities::{ClientEvent, EventListener, Unit, UnitKind};
use crate::domain::traits::{Bot, EventCallback};
use crate::infrastructure::config::HandlerConfig;
use crate::infrastructure::plugins::{sort_listeners, CategoryEntry, HandlerTable, Registry, UnitLoader};

/// Loads event listeners and routes client events to them
pub struct EventHandler {
    config: HandlerConfig,
    loader: UnitLoader,
    registry: Arc<Registry>,
    bot: Arc<dyn Bot>,
}

impl EventHandler {
    pub fn new(
        config: HandlerConfig,
        bot: Arc<dyn Bot>,
        handlers: Arc<HandlerTable>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        Ok(Self {
            loader: UnitLoader::new(handlers, config.suppress_warnings),
            registry: Arc::new(Registry::new()),
            bot,
            config,
        })
    }

    /// Share a registry with other handlers
    pub fn with_registry(mut self, registry: Arc<Registry>) -> Self {
        self.registry = registry;
        self
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// Re-scan the events directory and bind one runner per category on
    /// `client`. Bindings from an earlier call are removed first, so the
    /// call is idempotent. Never fails; problems are logged.
    pub async fn set_events(&self, client: &dyn Bot) {
        if self.unbind_all(client) > 0 {
            tracing::info!("Old events cleared before setting new events.");
        }

        match self.load_events().await {
            Ok(categories) => {
                let mut total = 0;
                for (category, listeners) in categories {
                    total += listeners.len();
                    self.bind(client, category, listeners);
                }
                tracing::info!("{} {} registered.", total, UnitKind::Event.plural(total));
                tracing::info!("Reading events finished.");
            }
            Err(e) => {
                tracing::error!("Reading events failed!");
                tracing::error!("{}", e);
            }
        }
    }

    /// Listeners grouped by category, categories in first-seen order
    async fn load_events(&self) -> Result<Vec<(String, Vec<Arc<EventListener>>)>, LoadError> {
        let units = self.loader.load_dir(&self.config.events_dir, UnitKind::Event).await?;

        let mut order: Vec<String> = Vec::new();
        let mut grouped: HashMap<String, Vec<Arc<EventListener>>> = HashMap::new();
        for loaded in units {
            let Unit::Event(listener) = loaded.unit else {
                continue;
            };
            tracing::info!("Event file '{}' read.", loaded.file_name);

            let category = listener.category().to_string();
            if !grouped.contains_key(&category) {
                order.push(category.clone());
            }
            grouped.entry(category).or_default().push(listener);
        }

        Ok(order
            .into_iter()
            .filter_map(|category| grouped.remove(&category).map(|l| (category, l)))
            .collect())
    }

    /// Register listeners built in code, replacing the category's bindings
    pub fn add_listeners(&self, client: &dyn Bot, listeners: Vec<EventListener>) {
        let mut grouped: HashMap<String, Vec<Arc<EventListener>>> = HashMap::new();
        for listener in listeners {
            grouped
                .entry(listener.category().to_string())
                .or_default()
                .push(Arc::new(listener));
        }

        for (category, mut added) in grouped {
            let mut listeners: Vec<_> = match self.registry.get_event_category(&category) {
                Some(entry) => {
                    if let Some(id) = entry.subscription {
                        client.unsubscribe(&category, id);
                    }
                    entry.listeners.to_vec()
                }
                None => Vec::new(),
            };
            listeners.append(&mut added);
            self.bind(client, category, listeners);
        }
    }

    fn bind(&self, client: &dyn Bot, category: String, listeners: Vec<Arc<EventListener>>) {
        let listeners: Arc<[Arc<EventListener>]> = sort_listeners(listeners).into();
        let count = listeners.len();

        let callback = self.runner(category.clone(), Arc::clone(&listeners));
        let subscription = client.subscribe(&category, callback);

        tracing::info!(
            "Event category '{}' ({} {}) registered.",
            category,
            count,
            UnitKind::Event.plural(count)
        );
        self.registry.set_category(
            category,
            CategoryEntry {
                listeners,
                subscription: Some(subscription),
            },
        );
    }

    fn runner(&self, category: String, listeners: Arc<[Arc<EventListener>]>) -> EventCallback {
        // the client may be this bot; hold it weakly
        let bot: Weak<dyn Bot> = Arc::downgrade(&self.bot);
        let execution = self.config.event_execution;

        Arc::new(move |event: ClientEvent| {
            let bot = bot.clone();
            let category = category.clone();
            let listeners = Arc::clone(&listeners);
            Box::pin(async move {
                if let Some(bot) = bot.upgrade() {
                    route(&category, &listeners, event, bot, execution).await;
                }
            })
        })
    }

    fn unbind_all(&self, client: &dyn Bot) -> usize {
        let categories = self.registry.take_categories();
        for (category, entry) in &categories {
            if let Some(id) = entry.subscription {
                client.unsubscribe(category, id);
            }
        }
        categories.len()
    }

    /// Route `event` to its category directly, without the client
    pub async fn dispatch(&self, event: ClientEvent) -> RouteOutcome {
        let Some(entry) = self.registry.get_event_category(event.category()) else {
            return RouteOutcome::default();
        };
        let category = event.category().to_string();
        route(
            &category,
            &entry.listeners,
            event,
            Arc::clone(&self.bot),
            self.config.event_execution,
        )
        .await
    }

    pub fn get_event_category(&self, category: &str) -> Option<Vec<Arc<EventListener>>> {
        self.registry
            .get_event_category(category)
            .map(|entry| entry.listeners.to_vec())
    }

    pub fn get_events(&self) -> Vec<Arc<EventListener>> {
        self.registry.get_events()
    }

    /// Unbind every category from `client` and forget the listeners
    pub fn clear_events(&self, client: &dyn Bot) -> &Self {
        self.unbind_all(client);
        self
    }
}
