//! Application layer errors

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Transport-level errors raised by a `Bot` implementation
#[derive(Error, Debug)]
pub enum BotError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Send failed: {0}")]
    Send(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Errors returned by unit handlers
#[derive(Error, Debug)]
pub enum HandlerError {
    #[error("Invalid arguments: {0}")]
    InvalidArgs(String),

    #[error("Execution failed: {0}")]
    ExecutionFailed(String),

    #[error("Transport error: {0}")]
    Bot(#[from] BotError),
}

/// A single offending field found while validating a unit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldIssue {
    pub field: &'static str,
    pub reason: String,
}

impl FieldIssue {
    pub fn new(field: &'static str, reason: impl Into<String>) -> Self {
        Self {
            field,
            reason: reason.into(),
        }
    }
}

impl fmt::Display for FieldIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}' {}", self.field, self.reason)
    }
}

/// Construction-time validation failure. Lists every offending field.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid {unit}: {}", join_issues(.issues))]
pub struct ValidationError {
    pub unit: String,
    pub issues: Vec<FieldIssue>,
}

impl ValidationError {
    pub fn has_field(&self, field: &str) -> bool {
        self.issues.iter().any(|i| i.field == field)
    }
}

fn join_issues(issues: &[FieldIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid value for '{field}': {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised while reading plugin manifests
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Failed to read directory {}: {source}", .dir.display())]
    ReadDir {
        dir: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read '{file}': {source}")]
    Read {
        file: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse '{file}': {source}")]
    Parse {
        file: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Registry insertion conflicts
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Command '{0}' already exists")]
    NameTaken(String),

    #[error("Command '{name}' has conflicting alias '{alias}'")]
    AliasTaken { name: String, alias: String },

    #[error("Slash command has no valid name set in its builder")]
    EmptySlashName,
}
