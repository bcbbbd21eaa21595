//! Configuration management

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use crate::application::errors::ConfigError;

/// Bot configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct Config {
    pub bot: BotConfig,
    pub handler: HandlerConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct BotConfig {
    pub name: String,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            name: "botbase".to_string(),
        }
    }
}

/// How listeners of one category are run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum EventExecution {
    /// One after another, each awaited before the next starts
    #[default]
    Sequential,
    /// Started in order, driven concurrently
    Concurrent,
}

/// User-facing notice templates. `{cooldown}` is replaced with the
/// seconds remaining.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct NoticeMessages {
    pub cooldown: Option<String>,
    pub maintenance: Option<String>,
}

pub const DEFAULT_COOLDOWN_MESSAGE: &str =
    "Please wait **{cooldown}** seconds before using this command again.";
pub const DEFAULT_MAINTENANCE_MESSAGE: &str = "This command is under maintenance.";

impl NoticeMessages {
    pub fn cooldown(&self, seconds_left: i64) -> String {
        self.cooldown
            .as_deref()
            .unwrap_or(DEFAULT_COOLDOWN_MESSAGE)
            .replace("{cooldown}", &seconds_left.to_string())
    }

    pub fn maintenance(&self) -> &str {
        self.maintenance.as_deref().unwrap_or(DEFAULT_MAINTENANCE_MESSAGE)
    }
}

/// Settings of the command and event handlers
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct HandlerConfig {
    pub commands_dir: PathBuf,
    pub slash_commands_dir: PathBuf,
    pub events_dir: PathBuf,
    pub developer_ids: Vec<String>,
    pub prefix: String,
    pub suppress_warnings: bool,
    pub maintenance: bool,
    pub messages: NoticeMessages,
    pub event_execution: EventExecution,
    /// Interval of the expired-cooldown sweep; 0 disables it
    pub cooldown_sweep_secs: u64,
}

impl Default for HandlerConfig {
    fn default() -> Self {
        Self {
            commands_dir: PathBuf::from("commands"),
            slash_commands_dir: PathBuf::from("slashCommands"),
            events_dir: PathBuf::from("events"),
            developer_ids: Vec::new(),
            prefix: String::new(),
            suppress_warnings: false,
            maintenance: false,
            messages: NoticeMessages::default(),
            event_execution: EventExecution::default(),
            cooldown_sweep_secs: 300,
        }
    }
}

impl HandlerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let dirs = [
            ("commands-dir", &self.commands_dir),
            ("slash-commands-dir", &self.slash_commands_dir),
            ("events-dir", &self.events_dir),
        ];
        for (field, dir) in dirs {
            if dir.as_os_str().is_empty() {
                return Err(invalid(field, "must not be empty"));
            }
        }

        if self.developer_ids.iter().any(|id| id.trim().is_empty()) {
            return Err(invalid("developer-ids", "must only contain non-empty ids"));
        }

        if self.prefix.chars().any(char::is_whitespace) {
            return Err(invalid("prefix", "must not contain whitespace"));
        }

        let templates = [
            ("messages.cooldown", &self.messages.cooldown),
            ("messages.maintenance", &self.messages.maintenance),
        ];
        for (field, template) in templates {
            if matches!(template, Some(t) if t.trim().is_empty()) {
                return Err(invalid(field, "must not be empty"));
            }
        }

        Ok(())
    }

    pub fn is_developer(&self, user_id: &str) -> bool {
        self.developer_ids.iter().any(|id| id == user_id)
    }
}

fn invalid(field: &'static str, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        field,
        reason: reason.to_string(),
    }
}

impl Config {
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let content = std::fs::read_to_string(&path)?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_yaml::from_str(content)
            .map_err(|e| ConfigError::Parse(format!("Failed to parse config: {}", e)))?;
        config.handler.validate()?;
        Ok(config)
    }

    /// Defaults overridden by environment variables
    pub fn load_env() -> Result<Self, ConfigError> {
        let mut config = Config::default();
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn apply_env<F>(&mut self, var: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(name) = var("BOT_NAME") {
            self.bot.name = name;
        }

        if let Some(prefix) = var("BOT_PREFIX") {
            self.handler.prefix = prefix;
        }

        if let Some(ids) = var("BOT_DEVELOPER_IDS") {
            self.handler.developer_ids = ids
                .split(',')
                .map(str::trim)
                .filter(|id| !id.is_empty())
                .map(str::to_string)
                .collect();
        }

        if let Some(flag) = var("BOT_MAINTENANCE") {
            self.handler.maintenance = flag
                .parse()
                .map_err(|_| invalid("BOT_MAINTENANCE", "must be true or false"))?;
        }

        self.handler.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = HandlerConfig::default();
        assert_eq!(config.commands_dir, PathBuf::from("commands"));
        assert_eq!(config.slash_commands_dir, PathBuf::from("slashCommands"));
        assert_eq!(config.events_dir, PathBuf::from("events"));
        assert!(config.developer_ids.is_empty());
        assert_eq!(config.prefix, "");
        assert!(!config.suppress_warnings);
        assert!(!config.maintenance);
        assert_eq!(config.event_execution, EventExecution::Sequential);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_partial_yaml() {
        let config = Config::from_yaml(
            r#"
handler:
  prefix: "!"
  developer-ids: ["42"]
  event-execution: concurrent
  messages:
    cooldown: "Wait {cooldown}s ({cooldown})"
"#,
        )
        .unwrap();

        assert_eq!(config.bot.name, "botbase");
        assert_eq!(config.handler.prefix, "!");
        assert!(config.handler.is_developer("42"));
        assert!(!config.handler.is_developer("43"));
        assert_eq!(config.handler.event_execution, EventExecution::Concurrent);
        assert_eq!(config.handler.messages.cooldown(3), "Wait 3s (3)");
        assert_eq!(config.handler.messages.maintenance(), DEFAULT_MAINTENANCE_MESSAGE);
    }

    #[test]
    fn test_rejects_invalid_values() {
        assert!(Config::from_yaml("handler:\n  prefix: \"! \"\n").is_err());
        assert!(Config::from_yaml("handler:\n  developer-ids: [\"\"]\n").is_err());
        assert!(Config::from_yaml("handler:\n  commands-dir: \"\"\n").is_err());
        assert!(Config::from_yaml("handler:\n  maintenance: maybe\n").is_err());
        assert!(Config::from_yaml("handler:\n  messages:\n    maintenance: \" \"\n").is_err());
    }

    #[test]
    fn test_apply_env() {
        let mut config = Config::default();
        config
            .apply_env(|key| match key {
                "BOT_PREFIX" => Some("?".to_string()),
                "BOT_DEVELOPER_IDS" => Some("1, 2,,3".to_string()),
                "BOT_MAINTENANCE" => Some("true".to_string()),
                _ => None,
            })
            .unwrap();

        assert_eq!(config.handler.prefix, "?");
        assert_eq!(config.handler.developer_ids, vec!["1", "2", "3"]);
        assert!(config.handler.maintenance);

        let err = config.apply_env(|key| (key == "BOT_MAINTENANCE").then(|| "on".to_string()));
        assert!(err.is_err());
    }
}
