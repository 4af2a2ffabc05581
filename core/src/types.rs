//! Schema type definitions for options, positionals and parse results.
//!
//! This module defines the data model every other layer reads: the closed
//! set of option and positional kinds, the typed [`Value`] produced by a
//! parse, and the [`ParseResult`] handed to transforms and handlers. The
//! types serialize with [`serde`] so a schema can be stored as JSON.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A typed value produced by parsing or declared as a default.
///
/// Serialized untagged, so JSON schemas write defaults as plain scalars
/// (`"default": "world"`, `"default": 3`, `"default": ["a", "b"]`).
///
/// # Examples
///
/// ```
/// use argweave_core::Value;
///
/// let v = Value::from("world");
/// assert_eq!(v.as_str(), Some("world"));
/// assert_eq!(Value::from(3.0).as_count(), Some(3));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Bool(bool),
    Number(f64),
    String(String),
    Array(Vec<Value>),
}

impl Value {
    /// Short name of the value's type, used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Array(_) => "array",
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns the value as an occurrence count if it is a non-negative
    /// integral number.
    pub fn as_count(&self) -> Option<u64> {
        match self {
            Value::Number(n) if *n >= 0.0 && n.fract() == 0.0 => Some(*n as u64),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Number(value)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(values: Vec<T>) -> Self {
        Value::Array(values.into_iter().map(Into::into).collect())
    }
}

/// Element kind of array options and variadic positionals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    #[default]
    String,
    Number,
    /// Elements must be members of the owning definition's `choices`.
    Enum,
}

/// Kind of an option, with kind-specific data.
///
/// # Examples
///
/// ```
/// use argweave_core::{ItemKind, OptionKind};
///
/// let kind = OptionKind::Array { items: ItemKind::Number, choices: None };
/// assert!(kind.takes_value());
/// assert!(!OptionKind::Boolean.takes_value());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum OptionKind {
    String,
    Boolean,
    Number,
    Enum {
        choices: Vec<String>,
    },
    Array {
        #[serde(default)]
        items: ItemKind,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        choices: Option<Vec<String>>,
    },
    Count,
}

impl OptionKind {
    /// Whether the flag consumes a value token.
    pub fn takes_value(&self) -> bool {
        !matches!(self, OptionKind::Boolean | OptionKind::Count)
    }

    /// Whether repeated occurrences accumulate instead of overwriting.
    pub fn is_repeatable(&self) -> bool {
        matches!(self, OptionKind::Array { .. } | OptionKind::Count)
    }

    /// Placeholder shown after the flag in usage text.
    pub fn placeholder(&self) -> Option<String> {
        match self {
            OptionKind::String => Some("<string>".to_string()),
            OptionKind::Number => Some("<number>".to_string()),
            OptionKind::Enum { choices } => Some(format!("<{}>", choices.join("|"))),
            OptionKind::Array { items, choices } => Some(match choices {
                Some(choices) => format!("<{}>...", choices.join("|")),
                None if *items == ItemKind::Number => "<number>...".to_string(),
                None => "<string>...".to_string(),
            }),
            OptionKind::Boolean | OptionKind::Count => None,
        }
    }
}

/// Schema for a named option (`--name value` or `--flag`).
///
/// Create one with a kind constructor and chain builder methods.
///
/// # Examples
///
/// ```
/// use argweave_core::{OptionDef, Value};
///
/// let name = OptionDef::string()
///     .with_alias("n")
///     .with_description("Who to greet")
///     .with_default("world");
/// assert_eq!(name.short_alias(), Some("n"));
/// assert_eq!(name.default, Some(Value::from("world")));
///
/// let verbose = OptionDef::boolean().with_alias("v");
/// assert!(!verbose.kind.takes_value());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionDef {
    #[serde(flatten)]
    pub kind: OptionKind,
    /// Alternate spellings without dashes (`"v"` → `-v`, `"verb"` → `--verb`).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Heading the option is listed under in help output.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub hidden: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

impl OptionDef {
    /// Creates an option of the given kind with no metadata.
    pub fn new(kind: OptionKind) -> Self {
        Self {
            kind,
            aliases: Vec::new(),
            description: None,
            group: None,
            hidden: false,
            required: false,
            default: None,
        }
    }

    pub fn string() -> Self {
        Self::new(OptionKind::String)
    }

    /// Creates a boolean option. It also answers to `--no-<name>`.
    pub fn boolean() -> Self {
        Self::new(OptionKind::Boolean)
    }

    pub fn number() -> Self {
        Self::new(OptionKind::Number)
    }

    /// Creates an option restricted to `choices`.
    pub fn enumeration<I, S>(choices: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(OptionKind::Enum {
            choices: choices.into_iter().map(Into::into).collect(),
        })
    }

    /// Creates a repeatable option collecting every occurrence.
    pub fn array(items: ItemKind) -> Self {
        Self::new(OptionKind::Array {
            items,
            choices: None,
        })
    }

    /// Creates a repeatable option whose elements must be one of `choices`.
    pub fn array_of_choices<I, S>(choices: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(OptionKind::Array {
            items: ItemKind::Enum,
            choices: Some(choices.into_iter().map(Into::into).collect()),
        })
    }

    /// Creates an option counting how often it was supplied (`-vvv`).
    pub fn count() -> Self {
        Self::new(OptionKind::Count)
    }

    pub fn with_alias(mut self, alias: &str) -> Self {
        self.aliases.push(alias.to_string());
        self
    }

    pub fn with_description(mut self, desc: &str) -> Self {
        self.description = Some(desc.to_string());
        self
    }

    pub fn in_group(mut self, group: &str) -> Self {
        self.group = Some(group.to_string());
        self
    }

    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    /// Returns the first single-character alias, used as the short form.
    pub fn short_alias(&self) -> Option<&str> {
        self.aliases
            .iter()
            .map(String::as_str)
            .find(|alias| alias.chars().count() == 1)
    }
}

/// Kind of a positional argument.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum PositionalKind {
    String,
    Number,
    Enum {
        choices: Vec<String>,
    },
    /// Consumes every remaining positional token. Must be last.
    Variadic {
        #[serde(default)]
        items: ItemKind,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        choices: Option<Vec<String>>,
    },
}

/// Schema for a positional argument.
///
/// # Examples
///
/// ```
/// use argweave_core::{ItemKind, PositionalDef};
///
/// let file = PositionalDef::string().named("file").required();
/// assert!(file.required);
/// assert!(!file.is_optional());
///
/// let rest = PositionalDef::variadic(ItemKind::String).named("files");
/// assert!(rest.is_variadic());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionalDef {
    #[serde(flatten)]
    pub kind: PositionalKind,
    /// Display name used in usage text and error messages.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub hidden: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

impl PositionalDef {
    pub fn new(kind: PositionalKind) -> Self {
        Self {
            kind,
            name: None,
            description: None,
            group: None,
            hidden: false,
            required: false,
            default: None,
        }
    }

    pub fn string() -> Self {
        Self::new(PositionalKind::String)
    }

    pub fn number() -> Self {
        Self::new(PositionalKind::Number)
    }

    pub fn enumeration<I, S>(choices: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(PositionalKind::Enum {
            choices: choices.into_iter().map(Into::into).collect(),
        })
    }

    pub fn variadic(items: ItemKind) -> Self {
        Self::new(PositionalKind::Variadic {
            items,
            choices: None,
        })
    }

    pub fn named(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    pub fn with_description(mut self, desc: &str) -> Self {
        self.description = Some(desc.to_string());
        self
    }

    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    pub fn is_variadic(&self) -> bool {
        matches!(self.kind, PositionalKind::Variadic { .. })
    }

    /// An optional positional has neither `required` nor a default.
    pub fn is_optional(&self) -> bool {
        !self.required && self.default.is_none()
    }

    /// Name for messages: the declared name, else `arg<N>` (1-based).
    pub fn display_name(&self, index: usize) -> String {
        match &self.name {
            Some(name) => name.clone(),
            None => format!("arg{}", index + 1),
        }
    }
}

/// Ordered positional schema. Sequence rules are checked by
/// [`validate_positionals`](crate::validate_positionals).
pub type PositionalsSchema = Vec<PositionalDef>;

/// Mapping from canonical option name to its definition.
///
/// Names are unique by construction. Iteration is ordered by name.
///
/// # Examples
///
/// ```
/// use argweave_core::{OptionDef, OptionsSchema};
///
/// let schema = OptionsSchema::new()
///     .with("verbose", OptionDef::boolean().with_alias("v"))
///     .with("name", OptionDef::string());
/// assert_eq!(schema.len(), 2);
/// assert_eq!(schema.find_by_alias("v").map(|(name, _)| name), Some("verbose"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OptionsSchema(BTreeMap<String, OptionDef>);

impl OptionsSchema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds (or replaces) an option.
    pub fn with(mut self, name: &str, def: OptionDef) -> Self {
        self.insert(name, def);
        self
    }

    /// Inserts an option, returning the definition it replaced.
    pub fn insert(&mut self, name: &str, def: OptionDef) -> Option<OptionDef> {
        self.0.insert(name.to_string(), def)
    }

    pub fn get(&self, name: &str) -> Option<&OptionDef> {
        self.0.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    /// Finds an option by canonical name or explicit alias.
    pub fn find_by_alias(&self, spelling: &str) -> Option<(&str, &OptionDef)> {
        self.iter()
            .find(|(name, def)| *name == spelling || def.aliases.iter().any(|a| a == spelling))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &OptionDef)> {
        self.0.iter().map(|(name, def)| (name.as_str(), def))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, OptionDef)> for OptionsSchema {
    fn from_iter<I: IntoIterator<Item = (String, OptionDef)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Outcome of a parse: the resolved command, option values and positionals.
///
/// A key missing from `values` or a `None` positional slot means the input
/// was absent and had no default.
///
/// # Examples
///
/// ```
/// use argweave_core::{ParseResult, Value};
///
/// let mut result = ParseResult::default();
/// result.values.insert("name".into(), Value::from("x"));
/// assert_eq!(result.value("name").and_then(Value::as_str), Some("x"));
/// assert!(result.value("missing").is_none());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParseResult {
    pub command: Option<String>,
    pub values: BTreeMap<String, Value>,
    pub positionals: Vec<Option<Value>>,
}

impl ParseResult {
    pub fn value(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn positional(&self, index: usize) -> Option<&Value> {
        self.positionals.get(index).and_then(Option::as_ref)
    }
}
