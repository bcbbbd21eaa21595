//! Plugin manifest parsing
//!
//! A manifest is a YAML mapping describing one unit:
//!
//! ```yaml
//! kind: command
//! name: ping
//! aliases: [p]
//! cooldown: 10
//! handler: ping
//! ```
//!
//! Every field is type-checked here before the unit builder runs its own
//! checks, and all problems are reported together.

use serde_yaml::{Mapping, Value};

use super::handlers::HandlerTable;
use crate::application::errors::{LoadError, ValidationError};
use crate::domain::entities::{
    CommandData, EventData, SlashCommandData, SlashCommandDefinition, SlashOption, Unit, UnitKind,
    Validator,
};

/// What a manifest file turned out to contain
#[derive(Debug)]
pub enum Manifest {
    /// Empty or null document
    Empty,
    /// A manifest for another unit variant (or none at all)
    OtherKind(Option<String>),
    Unit(Unit),
}

/// Parse `text` and build the unit it describes, if it is of `expected` kind.
pub fn parse(
    file_name: &str,
    text: &str,
    expected: UnitKind,
    handlers: &HandlerTable,
) -> Result<Manifest, LoadError> {
    let document: Value = serde_yaml::from_str(text).map_err(|source| LoadError::Parse {
        file: file_name.to_string(),
        source,
    })?;

    let map = match document {
        Value::Null => return Ok(Manifest::Empty),
        Value::Mapping(map) => map,
        other => return Ok(Manifest::OtherKind(Some(type_name(&other).to_string()))),
    };

    match map.get("kind").map(|k| serde_yaml::from_value::<UnitKind>(k.clone())) {
        Some(Ok(kind)) if kind == expected => {}
        Some(Ok(kind)) => return Ok(Manifest::OtherKind(Some(kind.to_string()))),
        Some(Err(_)) => {
            let raw = map.get("kind").and_then(Value::as_str).map(str::to_string);
            return Ok(Manifest::OtherKind(raw));
        }
        None => return Ok(Manifest::OtherKind(None)),
    }

    Ok(Manifest::Unit(build_unit(&map, expected, handlers)?))
}

/// Build a unit from an untyped mapping.
pub fn build_unit(
    map: &Mapping,
    kind: UnitKind,
    handlers: &HandlerTable,
) -> Result<Unit, ValidationError> {
    let mut v = Validator::new(kind.as_str());
    let mut fields = Fields { map, v: &mut v };

    let unit = match kind {
        UnitKind::Command => {
            let handler = fields
                .string("handler")
                .and_then(|name| fields.resolve(&name, handlers.get_command(&name)));
            let data = CommandData {
                name: fields.string("name").unwrap_or_default(),
                aliases: fields.aliases(),
                guild_only: fields.boolean("guild-only"),
                dm_only: fields.boolean("dm-only"),
                developer_only: fields.boolean("developer-only"),
                maintenance: fields.boolean("maintenance"),
                cooldown: fields.number("cooldown"),
                handler,
            };
            data.build_with(v)?.into()
        }
        UnitKind::SlashCommand => {
            let handler = fields
                .string("handler")
                .and_then(|name| fields.resolve(&name, handlers.get_slash_command(&name)));
            let name = fields.string("name");
            if name.is_none() && !map.contains_key("name") {
                fields.v.issue("name", "must be given");
            }
            let definition = SlashCommandDefinition {
                name: name.unwrap_or_default(),
                description: fields.string("description").unwrap_or_default(),
                options: fields.options(),
            };
            let data = SlashCommandData {
                source: None,
                developer_only: fields.boolean("developer-only"),
                maintenance: fields.boolean("maintenance"),
                cooldown: fields.number("cooldown"),
                handler,
            };
            data.definition(definition).build_with(v)?.into()
        }
        UnitKind::Event => {
            let handler = fields
                .string("handler")
                .and_then(|name| fields.resolve(&name, handlers.get_event(&name)));
            let data = EventData {
                category: fields.string("category").unwrap_or_default(),
                run_order: fields.run_order(),
                handler,
            };
            data.build_with(v)?.into()
        }
    };

    Ok(unit)
}

struct Fields<'a> {
    map: &'a Mapping,
    v: &'a mut Validator,
}

impl Fields<'_> {
    fn string(&mut self, key: &'static str) -> Option<String> {
        match self.map.get(key)? {
            Value::String(s) => Some(s.clone()),
            _ => {
                self.v.issue(key, "must be a string");
                None
            }
        }
    }

    fn boolean(&mut self, key: &'static str) -> Option<bool> {
        match self.map.get(key)? {
            Value::Bool(b) => Some(*b),
            _ => {
                self.v.issue(key, "must be a boolean");
                None
            }
        }
    }

    fn number(&mut self, key: &'static str) -> Option<f64> {
        match self.map.get(key)?.as_f64() {
            Some(n) => Some(n),
            None => {
                self.v.issue(key, "must be a number");
                None
            }
        }
    }

    fn aliases(&mut self) -> Vec<String> {
        let Some(value) = self.map.get("aliases") else {
            return Vec::new();
        };
        let Some(seq) = value.as_sequence() else {
            self.v.issue("aliases", "must be a list of strings");
            return Vec::new();
        };

        let aliases: Vec<String> = seq
            .iter()
            .filter_map(|a| a.as_str().map(str::to_string))
            .collect();
        if aliases.len() != seq.len() {
            self.v.issue("aliases", "must be a list of strings");
        }
        aliases
    }

    fn run_order(&mut self) -> Option<u64> {
        let value = self.map.get("run-order")?;
        if let Some(order) = value.as_u64() {
            return Some(order);
        }

        let reason = match value.as_i64() {
            Some(_) => "must be greater than or equal to zero",
            None => "must be an integer",
        };
        self.v.issue("run-order", reason);
        None
    }

    fn options(&mut self) -> Vec<SlashOption> {
        let Some(value) = self.map.get("options") else {
            return Vec::new();
        };
        match serde_yaml::from_value(value.clone()) {
            Ok(options) => options,
            Err(e) => {
                self.v.issue("options", format!("is invalid: {}", e));
                Vec::new()
            }
        }
    }

    fn resolve<T>(&mut self, name: &str, found: Option<T>) -> Option<T> {
        if found.is_none() {
            self.v
                .issue("handler", format!("names no registered handler '{}'", name));
        }
        found
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Sequence(_) => "sequence",
        Value::Mapping(_) => "mapping",
        Value::Tagged(_) => "tagged value",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> HandlerTable {
        HandlerTable::new()
            .command("ping", |_ctx| async { Ok(()) })
            .slash_command("ping", |_ctx| async { Ok(()) })
            .event("log", |_ctx| async { Ok(()) })
    }

    fn parse_as(text: &str, kind: UnitKind) -> Result<Manifest, LoadError> {
        parse("test.yaml", text, kind, &table())
    }

    #[test]
    fn test_parses_command() {
        let text = "kind: command\nname: ping\naliases: [p]\ncooldown: 10\nguild-only: true\nhandler: ping\n";
        let Manifest::Unit(Unit::Command(cmd)) = parse_as(text, UnitKind::Command).unwrap() else {
            panic!("expected a command");
        };

        assert_eq!(cmd.name(), "ping");
        assert_eq!(cmd.aliases(), ["p".to_string()]);
        assert_eq!(cmd.cooldown(), Some(10.0));
        assert!(cmd.context().guild_only);
    }

    #[test]
    fn test_parses_slash_command() {
        let text = r#"
kind: slash-command
name: echo
description: Repeat text
options:
  - name: text
    description: What to say
    kind: string
    required: true
handler: ping
"#;
        let Manifest::Unit(Unit::SlashCommand(slash)) =
            parse_as(text, UnitKind::SlashCommand).unwrap()
        else {
            panic!("expected a slash command");
        };

        let definition = slash.definition();
        assert_eq!(definition.name, "echo");
        assert_eq!(definition.options.len(), 1);
        assert!(definition.options[0].required);
    }

    #[test]
    fn test_parses_event() {
        let text = "kind: event\ncategory: ready\nrun-order: 3\nhandler: log\n";
        let Manifest::Unit(Unit::Event(listener)) = parse_as(text, UnitKind::Event).unwrap() else {
            panic!("expected an event");
        };
        assert_eq!(listener.category(), "ready");
        assert_eq!(listener.run_order(), Some(3));
    }

    #[test]
    fn test_empty_document() {
        assert!(matches!(parse_as("", UnitKind::Command).unwrap(), Manifest::Empty));
        assert!(matches!(parse_as("~", UnitKind::Command).unwrap(), Manifest::Empty));
    }

    #[test]
    fn test_other_kind() {
        let text = "kind: event\ncategory: ready\nhandler: log\n";
        match parse_as(text, UnitKind::Command).unwrap() {
            Manifest::OtherKind(Some(kind)) => assert_eq!(kind, "event"),
            other => panic!("unexpected {:?}", other),
        }
        assert!(matches!(
            parse_as("name: ping\n", UnitKind::Command).unwrap(),
            Manifest::OtherKind(None)
        ));
        assert!(matches!(
            parse_as("- a\n- b\n", UnitKind::Command).unwrap(),
            Manifest::OtherKind(Some(_))
        ));
    }

    #[test]
    fn test_reports_every_bad_field() {
        let text = r#"
kind: command
name: 42
aliases: [ok, 7]
guild-only: "yes"
developer-only: 1
cooldown: fast
handler: missing
"#;
        let Err(LoadError::Validation(err)) = parse_as(text, UnitKind::Command) else {
            panic!("expected a validation error");
        };

        for field in ["name", "aliases", "guild-only", "developer-only", "cooldown", "handler"] {
            assert!(err.has_field(field), "missing issue for {}", field);
        }
        assert_eq!(err.issues.iter().filter(|i| i.field == "handler").count(), 1);
    }

    #[test]
    fn test_rejects_negative_run_order() {
        let text = "kind: event\ncategory: ready\nrun-order: -1\nhandler: log\n";
        let Err(LoadError::Validation(err)) = parse_as(text, UnitKind::Event) else {
            panic!("expected a validation error");
        };
        assert!(err.has_field("run-order"));
    }

    #[test]
    fn test_invalid_yaml() {
        assert!(matches!(
            parse_as("kind: [command", UnitKind::Command),
            Err(LoadError::Parse { .. })
        ));
    }
}
