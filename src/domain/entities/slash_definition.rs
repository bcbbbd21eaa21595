//! Slash command definitions pushed to the remote service

use serde::{Deserialize, Serialize};

/// Type of a slash command option
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum OptionKind {
    String,
    Integer,
    Number,
    Boolean,
    User,
    Channel,
    Role,
}

/// A single slash command option
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct SlashOption {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub kind: OptionKind,
    #[serde(default)]
    pub required: bool,
}

/// Resolved definition of a slash command
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct SlashCommandDefinition {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub options: Vec<SlashOption>,
}

/// Incremental builder for a `SlashCommandDefinition`
#[derive(Debug, Clone, Default)]
pub struct SlashCommandBuilder {
    definition: SlashCommandDefinition,
}

impl SlashCommandBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.definition.name = name.into();
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.definition.description = description.into();
        self
    }

    pub fn option(
        mut self,
        name: impl Into<String>,
        description: impl Into<String>,
        kind: OptionKind,
        required: bool,
    ) -> Self {
        self.definition.options.push(SlashOption {
            name: name.into(),
            description: description.into(),
            kind,
            required,
        });
        self
    }

    pub fn build(self) -> SlashCommandDefinition {
        self.definition
    }
}

impl From<SlashCommandBuilder> for SlashCommandDefinition {
    fn from(builder: SlashCommandBuilder) -> Self {
        builder.build()
    }
}
