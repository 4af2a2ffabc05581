use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{OptionsSchema, PositionalsSchema};

/// What runs when a command-based CLI is invoked without a command token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DefaultHandler {
    /// A dedicated handler that receives the global options only.
    Handler,
    /// Behave as if the named command had been given first.
    Command(String),
}

/// Schema half of a subcommand: its local options and positionals.
///
/// The handler and transforms are attached by the pipeline layer; this type
/// only carries what parsing, help and completion need to read.
///
/// # Examples
///
/// ```
/// use argweave_core::*;
///
/// let test = CommandSchema::new("Run the test suite")
///     .with_option("filter", OptionDef::string().with_alias("f"))
///     .with_positional(PositionalDef::variadic(ItemKind::String).named("paths"))
///     .with_alias("t");
///
/// assert_eq!(test.options.len(), 1);
/// assert!(test.positionals[0].is_variadic());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CommandSchema {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "OptionsSchema::is_empty")]
    pub options: OptionsSchema,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub positionals: PositionalsSchema,
    /// Alternate command names.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub hidden: bool,
}

impl CommandSchema {
    pub fn new(description: &str) -> Self {
        Self {
            description: Some(description.to_string()),
            ..Default::default()
        }
    }

    pub fn with_option(mut self, name: &str, def: crate::OptionDef) -> Self {
        self.options.insert(name, def);
        self
    }

    pub fn with_positional(mut self, def: crate::PositionalDef) -> Self {
        self.positionals.push(def);
        self
    }

    pub fn with_alias(mut self, alias: &str) -> Self {
        self.aliases.push(alias.to_string());
        self
    }
}

/// Complete schema of a command-line program.
///
/// A CLI either declares top-level `positionals` (and usually a handler), or
/// registers `commands` with an optional `default_handler`. Mixing the two is
/// rejected by [`validate_cli`](crate::validate_cli).
///
/// # Examples
///
/// ```
/// use argweave_core::*;
///
/// let mut cli = CliSchema::new("tool");
/// cli.options.insert("verbose", OptionDef::boolean().with_alias("v"));
/// cli.commands.insert("test".into(), CommandSchema::new("Run tests"));
/// cli.default_handler = Some(DefaultHandler::Command("test".into()));
///
/// assert!(cli.has_commands());
/// assert_eq!(cli.find_command("test").map(|(name, _)| name), Some("test"));
/// assert!(validate_cli(&cli).is_ok());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CliSchema {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Global options, shared by every command.
    #[serde(default, skip_serializing_if = "OptionsSchema::is_empty")]
    pub options: OptionsSchema,
    /// Top-level positionals; only allowed when no commands are registered.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub positionals: PositionalsSchema,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub commands: BTreeMap<String, CommandSchema>,
    /// Whether a top-level handler is attached.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub has_handler: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_handler: Option<DefaultHandler>,
}

impl CliSchema {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    /// Parses a schema from its JSON form.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn has_commands(&self) -> bool {
        !self.commands.is_empty()
    }

    /// Finds a command by name or alias, returning its canonical name.
    pub fn find_command(&self, token: &str) -> Option<(&str, &CommandSchema)> {
        self.commands
            .iter()
            .find(|(name, cmd)| *name == token || cmd.aliases.iter().any(|a| a == token))
            .map(|(name, cmd)| (name.as_str(), cmd))
    }

    /// Gets all visible command names.
    pub fn command_names(&self) -> Vec<&str> {
        self.commands
            .iter()
            .filter(|(_, cmd)| !cmd.hidden)
            .map(|(name, _)| name.as_str())
            .collect()
    }
}
