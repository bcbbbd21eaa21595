//! Message parser - Splits prefixed message content into a command and its arguments

/// A command invocation found in message content
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCommand {
    pub name: String,
    pub args: Vec<String>,
}

/// Parses prefixed commands out of message content
pub struct MessageParser {
    command_prefix: String,
}

impl MessageParser {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            command_prefix: prefix.into(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.command_prefix
    }

    /// Parse with the configured prefix, or `prefix_override` when given
    pub fn parse(&self, content: &str, prefix_override: Option<&str>) -> Option<ParsedCommand> {
        parse_command(content, prefix_override.unwrap_or(&self.command_prefix))
    }

    pub fn has_prefix(&self, content: &str, prefix_override: Option<&str>) -> bool {
        content.starts_with(prefix_override.unwrap_or(&self.command_prefix))
    }
}

/// Strip `prefix` and split the rest on whitespace.
/// Returns `None` when the prefix is missing or no command name follows it.
pub fn parse_command(content: &str, prefix: &str) -> Option<ParsedCommand> {
    let rest = content.strip_prefix(prefix)?;
    let mut parts = rest.split_whitespace();
    let name = parts.next()?.to_string();

    Some(ParsedCommand {
        name,
        args: parts.map(str::to_string).collect(),
    })
}
