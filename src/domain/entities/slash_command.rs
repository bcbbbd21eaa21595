use std::fmt;
use std::future::Future;
use std::sync::Arc;

use super::context::{slash_fn, HandlerResult, SlashContext, SlashFn};
use super::slash_definition::{SlashCommandBuilder, SlashCommandDefinition};
use super::unit::{Gated, UnitKind};
use super::validation::Validator;
use crate::application::errors::ValidationError;

/// Function that fills in a fresh `SlashCommandBuilder`
pub type BuilderFn = Arc<dyn Fn(SlashCommandBuilder) -> SlashCommandBuilder + Send + Sync>;

/// Source of a slash command's definition
#[derive(Clone)]
pub enum DefinitionSource {
    Static(SlashCommandDefinition),
    Builder(BuilderFn),
}

impl DefinitionSource {
    pub fn resolve(&self) -> SlashCommandDefinition {
        match self {
            DefinitionSource::Static(definition) => definition.clone(),
            DefinitionSource::Builder(build) => build(SlashCommandBuilder::new()).build(),
        }
    }
}

/// Represents a validated slash command
pub struct SlashCommand {
    source: DefinitionSource,
    developer_only: bool,
    maintenance: bool,
    cooldown: Option<f64>,
    handler: SlashFn,
}

impl SlashCommand {
    pub fn new(data: SlashCommandData) -> Result<Self, ValidationError> {
        data.build()
    }

    pub fn builder() -> SlashCommandData {
        SlashCommandData::default()
    }

    /// Resolve the definition from its source. Builder sources run on
    /// every call, so the result always reflects the current builder.
    pub fn definition(&self) -> SlashCommandDefinition {
        self.source.resolve()
    }

    pub fn name(&self) -> String {
        self.definition().name
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

    pub fn handler(&self) -> &SlashFn {
        &self.handler
    }
}

impl Gated for SlashCommand {
    fn kind(&self) -> UnitKind {
        UnitKind::SlashCommand
    }

    fn cooldown_name(&self) -> String {
        self.name()
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

impl fmt::Debug for SlashCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SlashCommand")
            .field("definition", &self.definition())
            .field("developer_only", &self.developer_only)
            .field("maintenance", &self.maintenance)
            .field("cooldown", &self.cooldown)
            .finish_non_exhaustive()
    }
}

/// Raw configuration for a `SlashCommand`
#[derive(Default)]
pub struct SlashCommandData {
    pub source: Option<DefinitionSource>,
    pub developer_only: Option<bool>,
    pub maintenance: Option<bool>,
    pub cooldown: Option<f64>,
    pub handler: Option<SlashFn>,
}

impl SlashCommandData {
    pub fn definition(mut self, definition: impl Into<SlashCommandDefinition>) -> Self {
        self.source = Some(DefinitionSource::Static(definition.into()));
        self
    }

    pub fn build_definition<F>(mut self, build: F) -> Self
    where
        F: Fn(SlashCommandBuilder) -> SlashCommandBuilder + Send + Sync + 'static,
    {
        self.source = Some(DefinitionSource::Builder(Arc::new(build)));
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
        F: Fn(SlashContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.handler = Some(slash_fn(f));
        self
    }

    pub fn runner(mut self, handler: SlashFn) -> Self {
        self.handler = Some(handler);
        self
    }

    pub fn build(self) -> Result<SlashCommand, ValidationError> {
        self.build_with(Validator::new("slash command"))
    }

    pub(crate) fn build_with(self, mut v: Validator) -> Result<SlashCommand, ValidationError> {
        v.cooldown(self.cooldown);
        match &self.source {
            // builder sources are checked against the name they resolve to now
            Some(source) if !v.has_issue("name") => v.non_empty("name", &source.resolve().name),
            Some(_) => {}
            None => v.issue("definition", "must be a definition or a builder function"),
        }

        let handler = v.finish_with("handler", self.handler)?;
        let source = self
            .source
            .unwrap_or_else(|| DefinitionSource::Static(SlashCommandDefinition::default()));

        Ok(SlashCommand {
            source,
            developer_only: self.developer_only.unwrap_or(false),
            maintenance: self.maintenance.unwrap_or(false),
            cooldown: self.cooldown,
            handler,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::OptionKind;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_static_definition() {
        let slash = SlashCommand::builder()
            .definition(SlashCommandBuilder::new().name("ping").description("Pong!"))
            .handler(|_ctx| async { Ok(()) })
            .build()
            .unwrap();

        assert_eq!(slash.name(), "ping");
        assert_eq!(slash.definition().description, "Pong!");
    }

    #[test]
    fn test_builder_is_resolved_on_every_lookup() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let slash = SlashCommand::builder()
            .build_definition(move |b| {
                counter.fetch_add(1, Ordering::SeqCst);
                b.name("roll").option("sides", "Dice sides", OptionKind::Integer, false)
            })
            .handler(|_ctx| async { Ok(()) })
            .build()
            .unwrap();

        assert_eq!(slash.name(), "roll");
        assert_eq!(slash.definition().options.len(), 1);
        // once while validating, then once per lookup
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_rejects_empty_name() {
        let err = SlashCommand::builder()
            .definition(SlashCommandBuilder::new().description("No name"))
            .handler(|_ctx| async { Ok(()) })
            .build()
            .unwrap_err();
        assert!(err.has_field("name"));

        let err = SlashCommand::builder()
            .build_definition(|b| b.name("  "))
            .handler(|_ctx| async { Ok(()) })
            .build()
            .unwrap_err();
        assert_eq!(err.issues.len(), 1);
    }

    #[test]
    fn test_requires_source_and_handler() {
        let err = SlashCommand::builder().cooldown(0.0).build().unwrap_err();
        assert!(err.has_field("definition"));
        assert!(err.has_field("handler"));
        assert!(err.has_field("cooldown"));
    }
}
