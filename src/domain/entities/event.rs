use std::fmt;
use std::future::Future;

use super::context::{listener_fn, EventContext, HandlerResult, ListenerFn};
use super::validation::Validator;
use crate::application::errors::ValidationError;

/// Represents a validated event listener
pub struct EventListener {
    category: String,
    run_order: Option<u64>,
    handler: ListenerFn,
}

impl EventListener {
    pub fn new(data: EventData) -> Result<Self, ValidationError> {
        data.build()
    }

    pub fn builder(category: impl Into<String>) -> EventData {
        EventData::new(category)
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn run_order(&self) -> Option<u64> {
        self.run_order
    }

    pub fn handler(&self) -> &ListenerFn {
        &self.handler
    }
}

impl fmt::Debug for EventListener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventListener")
            .field("category", &self.category)
            .field("run_order", &self.run_order)
            .finish_non_exhaustive()
    }
}

/// Raw configuration for an `EventListener`
#[derive(Default)]
pub struct EventData {
    pub category: String,
    pub run_order: Option<u64>,
    pub handler: Option<ListenerFn>,
}

impl EventData {
    pub fn new(category: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            ..Self::default()
        }
    }

    pub fn run_order(mut self, order: u64) -> Self {
        self.run_order = Some(order);
        self
    }

    pub fn handler<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(EventContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.handler = Some(listener_fn(f));
        self
    }

    pub fn runner(mut self, handler: ListenerFn) -> Self {
        self.handler = Some(handler);
        self
    }

    pub fn build(self) -> Result<EventListener, ValidationError> {
        self.build_with(Validator::new("event"))
    }

    pub(crate) fn build_with(self, mut v: Validator) -> Result<EventListener, ValidationError> {
        v.non_empty("category", &self.category);
        v.run_order(self.run_order);
        let handler = v.finish_with("handler", self.handler)?;

        Ok(EventListener {
            category: self.category,
            run_order: self.run_order,
            handler,
        })
    }
}
