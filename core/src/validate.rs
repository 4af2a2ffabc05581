//! Construction-time schema validation.
//!
//! Rejects structurally invalid schemas before any argument is read:
//! malformed names, defaults that do not match their kind, alias collisions
//! (including the implicit `no-<name>` flag of every boolean option) and
//! positional sequences that cannot be parsed unambiguously. The first
//! violation found is returned; errors are never aggregated.
//!
//! # Examples
//!
//! ```
//! use argweave_core::*;
//!
//! let ok = OptionsSchema::new().with("verbose", OptionDef::boolean().with_alias("v"));
//! assert!(validate_options(&ok).is_ok());
//!
//! // `no-verbose` is reserved by the boolean `verbose`.
//! let bad = ok.clone().with("quiet", OptionDef::boolean().with_alias("no-verbose"));
//! let err = validate_options(&bad).unwrap_err();
//! assert_eq!(err.path, "options.quiet.aliases[0]");
//! ```

use std::collections::{HashMap, HashSet};

use thiserror::Error;

use crate::{
    CliSchema, CommandSchema, DefaultHandler, ItemKind, OptionDef, OptionKind, OptionsSchema,
    PositionalDef, PositionalKind, PositionalsSchema, Value,
};

/// A schema violation and where it was found.
///
/// `path` uses dot/bracket notation rooted at the CLI schema, e.g.
/// `options.verbose.aliases[0]` or `commands.test.positionals[1]`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{path}: {kind}")]
pub struct ValidationError {
    pub path: String,
    pub kind: ValidationErrorKind,
}

impl ValidationError {
    pub fn new(path: impl Into<String>, kind: ValidationErrorKind) -> Self {
        Self {
            path: path.into(),
            kind,
        }
    }
}

/// The specific structural problem behind a [`ValidationError`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationErrorKind {
    #[error("cli name cannot be empty")]
    EmptyCliName,
    /// Option or command names must be non-empty, dash-free, whitespace-free tokens.
    #[error("invalid name: {0:?}")]
    InvalidName(String),
    #[error("invalid alias: {0:?}")]
    InvalidAlias(String),
    #[error("choices cannot be empty")]
    EmptyChoices,
    #[error("duplicate choice: {0}")]
    DuplicateChoice(String),
    #[error("choices are not allowed on number items")]
    ChoicesOnNumberItems,
    #[error("enum items require choices")]
    MissingChoices,
    #[error("default must be a {expected}, found {found}")]
    DefaultTypeMismatch {
        expected: &'static str,
        found: &'static str,
    },
    #[error("default {0:?} is not one of the allowed choices")]
    DefaultNotInChoices(String),
    #[error("{spelling:?} is already used by option {owner}")]
    AliasConflict { spelling: String, owner: String },
    #[error("implicit negation flag {negation:?} collides with option {owner}")]
    NegationConflict { negation: String, owner: String },
    #[error("variadic positional must be last")]
    VariadicNotLast,
    #[error("required positional cannot follow an optional positional")]
    RequiredAfterOptional,
    #[error("top-level positionals are not allowed when commands are defined; declare them per command")]
    PositionalsWithCommands,
    #[error("top-level handler is not allowed when commands are defined; use a default handler")]
    HandlerWithCommands,
    #[error("default handler requires commands")]
    DefaultHandlerWithoutCommands,
    #[error("default command {0:?} is not a registered command")]
    UnknownDefaultCommand(String),
    #[error("duplicate command name or alias: {0}")]
    DuplicateCommand(String),
    #[error("alias given for unregistered command {0:?}")]
    UnknownAliasTarget(String),
}

/// Validates a complete CLI schema.
///
/// Checks, in order: the CLI name, global options (kind rules, then alias
/// uniqueness), top-level positionals, and for command-based CLIs every
/// command with the global alias namespace seeded in. Top-level positionals
/// and handlers are rejected when commands exist.
///
/// # Examples
///
/// ```
/// use argweave_core::*;
///
/// let mut cli = CliSchema::new("tool");
/// cli.options.insert("verbose", OptionDef::boolean().with_alias("v"));
/// cli.commands.insert(
///     "test".into(),
///     CommandSchema::new("Run tests").with_option("version", OptionDef::boolean().with_alias("v")),
/// );
///
/// let err = validate_cli(&cli).unwrap_err();
/// assert_eq!(err.path, "commands.test.options.version.aliases[0]");
/// ```
pub fn validate_cli(cli: &CliSchema) -> Result<(), ValidationError> {
    if cli.name.trim().is_empty() {
        return Err(ValidationError::new("name", ValidationErrorKind::EmptyCliName));
    }

    let globals = check_options("options", &cli.options, Namespace::default())?;
    check_positionals("positionals", &cli.positionals)?;

    if !cli.has_commands() {
        if cli.default_handler.is_some() {
            return Err(ValidationError::new(
                "default_handler",
                ValidationErrorKind::DefaultHandlerWithoutCommands,
            ));
        }
        return Ok(());
    }

    if !cli.positionals.is_empty() {
        return Err(ValidationError::new(
            "positionals",
            ValidationErrorKind::PositionalsWithCommands,
        ));
    }
    if cli.has_handler {
        return Err(ValidationError::new(
            "handler",
            ValidationErrorKind::HandlerWithCommands,
        ));
    }

    check_command_names(cli)?;

    for (name, command) in &cli.commands {
        check_command(name, command, &globals)?;
    }

    if let Some(DefaultHandler::Command(target)) = &cli.default_handler {
        if cli.find_command(target).is_none() {
            return Err(ValidationError::new(
                "default_handler",
                ValidationErrorKind::UnknownDefaultCommand(target.clone()),
            ));
        }
    }

    Ok(())
}

/// Validates a standalone options schema (kind rules and alias uniqueness).
pub fn validate_options(options: &OptionsSchema) -> Result<(), ValidationError> {
    check_options("options", options, Namespace::default()).map(|_| ())
}

/// Validates a positional sequence.
///
/// # Examples
///
/// ```
/// use argweave_core::*;
///
/// let ok = vec![PositionalDef::string().required(), PositionalDef::string()];
/// assert!(validate_positionals(&ok).is_ok());
///
/// let bad = vec![PositionalDef::variadic(ItemKind::String), PositionalDef::string()];
/// assert_eq!(
///     validate_positionals(&bad).unwrap_err().kind,
///     ValidationErrorKind::VariadicNotLast,
/// );
/// ```
pub fn validate_positionals(positionals: &PositionalsSchema) -> Result<(), ValidationError> {
    check_positionals("positionals", positionals)
}

fn check_command(
    name: &str,
    command: &CommandSchema,
    globals: &Namespace,
) -> Result<(), ValidationError> {
    let prefix = format!("commands.{name}");
    check_options(&format!("{prefix}.options"), &command.options, globals.clone())?;
    check_positionals(&format!("{prefix}.positionals"), &command.positionals)
}

fn check_command_names(cli: &CliSchema) -> Result<(), ValidationError> {
    let mut seen: HashSet<&str> = HashSet::new();

    for name in cli.commands.keys() {
        if !is_valid_token(name) {
            return Err(ValidationError::new(
                format!("commands.{name}"),
                ValidationErrorKind::InvalidName(name.clone()),
            ));
        }
        seen.insert(name.as_str());
    }

    for (name, command) in &cli.commands {
        for (i, alias) in command.aliases.iter().enumerate() {
            let path = format!("commands.{name}.aliases[{i}]");
            if !is_valid_token(alias) {
                return Err(ValidationError::new(
                    path,
                    ValidationErrorKind::InvalidAlias(alias.clone()),
                ));
            }
            if !seen.insert(alias.as_str()) {
                return Err(ValidationError::new(
                    path,
                    ValidationErrorKind::DuplicateCommand(alias.clone()),
                ));
            }
        }
    }

    Ok(())
}

/// Every flag spelling in scope, mapped to the option that owns it.
#[derive(Debug, Clone, Default)]
struct Namespace {
    owners: HashMap<String, String>,
}

impl Namespace {
    /// Drops every spelling owned by `option`, used when a command-local
    /// option shadows a global one of the same name.
    fn release(&mut self, option: &str) {
        self.owners.retain(|_, owner| owner != option);
    }

    fn claim(&mut self, spelling: &str, owner: &str) -> Result<(), String> {
        match self.owners.get(spelling) {
            Some(existing) => Err(existing.clone()),
            None => {
                self.owners.insert(spelling.to_string(), owner.to_string());
                Ok(())
            }
        }
    }
}

fn check_options(
    prefix: &str,
    options: &OptionsSchema,
    mut namespace: Namespace,
) -> Result<Namespace, ValidationError> {
    for (name, def) in options.iter() {
        let path = format!("{prefix}.{name}");
        if !is_valid_token(name) {
            return Err(ValidationError::new(
                path,
                ValidationErrorKind::InvalidName(name.to_string()),
            ));
        }
        check_option_kind(&path, def)?;
    }

    for (name, _) in options.iter() {
        namespace.release(name);
    }

    for (name, _) in options.iter() {
        if let Err(owner) = namespace.claim(name, name) {
            return Err(ValidationError::new(
                format!("{prefix}.{name}"),
                ValidationErrorKind::AliasConflict {
                    spelling: name.to_string(),
                    owner,
                },
            ));
        }
    }

    for (name, def) in options.iter() {
        if def.kind != OptionKind::Boolean {
            continue;
        }
        let negation = format!("no-{name}");
        if let Err(owner) = namespace.claim(&negation, name) {
            return Err(ValidationError::new(
                format!("{prefix}.{name}"),
                ValidationErrorKind::NegationConflict { negation, owner },
            ));
        }
    }

    for (name, def) in options.iter() {
        for (i, alias) in def.aliases.iter().enumerate() {
            let path = format!("{prefix}.{name}.aliases[{i}]");
            if !is_valid_token(alias) {
                return Err(ValidationError::new(
                    path,
                    ValidationErrorKind::InvalidAlias(alias.clone()),
                ));
            }
            if let Err(owner) = namespace.claim(alias, name) {
                return Err(ValidationError::new(
                    path,
                    ValidationErrorKind::AliasConflict {
                        spelling: alias.clone(),
                        owner,
                    },
                ));
            }
        }
    }

    Ok(namespace)
}

fn check_option_kind(path: &str, def: &OptionDef) -> Result<(), ValidationError> {
    match &def.kind {
        OptionKind::String => check_default(path, def.default.as_ref(), expect_string),
        OptionKind::Boolean => check_default(path, def.default.as_ref(), expect_bool),
        OptionKind::Number => check_default(path, def.default.as_ref(), expect_number),
        OptionKind::Count => check_default(path, def.default.as_ref(), expect_count),
        OptionKind::Enum { choices } => {
            check_choices(path, choices)?;
            check_default(path, def.default.as_ref(), |v| expect_choice(v, choices))
        }
        OptionKind::Array { items, choices } => {
            check_items(path, *items, choices.as_deref())?;
            check_array_default(path, def.default.as_ref(), *items, choices.as_deref())
        }
    }
}

fn check_positionals(prefix: &str, positionals: &[PositionalDef]) -> Result<(), ValidationError> {
    let mut seen_optional = false;

    for (i, def) in positionals.iter().enumerate() {
        let path = format!("{prefix}[{i}]");
        check_positional_kind(&path, def)?;

        if def.is_variadic() && i + 1 != positionals.len() {
            return Err(ValidationError::new(path, ValidationErrorKind::VariadicNotLast));
        }
        if def.required && seen_optional && !def.is_variadic() {
            return Err(ValidationError::new(
                path,
                ValidationErrorKind::RequiredAfterOptional,
            ));
        }
        if def.is_optional() {
            seen_optional = true;
        }
    }

    Ok(())
}

fn check_positional_kind(path: &str, def: &PositionalDef) -> Result<(), ValidationError> {
    match &def.kind {
        PositionalKind::String => check_default(path, def.default.as_ref(), expect_string),
        PositionalKind::Number => check_default(path, def.default.as_ref(), expect_number),
        PositionalKind::Enum { choices } => {
            check_choices(path, choices)?;
            check_default(path, def.default.as_ref(), |v| expect_choice(v, choices))
        }
        PositionalKind::Variadic { items, choices } => {
            check_items(path, *items, choices.as_deref())?;
            check_array_default(path, def.default.as_ref(), *items, choices.as_deref())
        }
    }
}

fn check_choices(path: &str, choices: &[String]) -> Result<(), ValidationError> {
    let path = format!("{path}.choices");
    if choices.is_empty() {
        return Err(ValidationError::new(path, ValidationErrorKind::EmptyChoices));
    }
    let mut seen = HashSet::new();
    for choice in choices {
        if !seen.insert(choice.as_str()) {
            return Err(ValidationError::new(
                path,
                ValidationErrorKind::DuplicateChoice(choice.clone()),
            ));
        }
    }
    Ok(())
}

fn check_items(path: &str, items: ItemKind, choices: Option<&[String]>) -> Result<(), ValidationError> {
    match (items, choices) {
        (ItemKind::Number, Some(_)) => Err(ValidationError::new(
            format!("{path}.choices"),
            ValidationErrorKind::ChoicesOnNumberItems,
        )),
        (ItemKind::Enum, None) => Err(ValidationError::new(
            format!("{path}.choices"),
            ValidationErrorKind::MissingChoices,
        )),
        (_, Some(choices)) => check_choices(path, choices),
        (_, None) => Ok(()),
    }
}

fn check_default<F>(path: &str, default: Option<&Value>, expect: F) -> Result<(), ValidationError>
where
    F: Fn(&Value) -> Result<(), ValidationErrorKind>,
{
    match default {
        Some(value) => {
            expect(value).map_err(|kind| ValidationError::new(format!("{path}.default"), kind))
        }
        None => Ok(()),
    }
}

fn check_array_default(
    path: &str,
    default: Option<&Value>,
    items: ItemKind,
    choices: Option<&[String]>,
) -> Result<(), ValidationError> {
    let Some(value) = default else {
        return Ok(());
    };
    let Value::Array(elements) = value else {
        return Err(ValidationError::new(
            format!("{path}.default"),
            ValidationErrorKind::DefaultTypeMismatch {
                expected: "array",
                found: value.type_name(),
            },
        ));
    };

    for (i, element) in elements.iter().enumerate() {
        let checked = match (items, choices) {
            (ItemKind::Number, _) => expect_number(element),
            (_, Some(choices)) => expect_choice(element, choices),
            (_, None) => expect_string(element),
        };
        checked.map_err(|kind| ValidationError::new(format!("{path}.default[{i}]"), kind))?;
    }
    Ok(())
}

fn expect_string(value: &Value) -> Result<(), ValidationErrorKind> {
    match value {
        Value::String(_) => Ok(()),
        other => Err(mismatch("string", other)),
    }
}

fn expect_bool(value: &Value) -> Result<(), ValidationErrorKind> {
    match value {
        Value::Bool(_) => Ok(()),
        other => Err(mismatch("boolean", other)),
    }
}

fn expect_number(value: &Value) -> Result<(), ValidationErrorKind> {
    match value {
        Value::Number(n) if n.is_finite() => Ok(()),
        other => Err(mismatch("number", other)),
    }
}

fn expect_count(value: &Value) -> Result<(), ValidationErrorKind> {
    match value.as_count() {
        Some(_) => Ok(()),
        None => Err(mismatch("non-negative integer", value)),
    }
}

fn expect_choice(value: &Value, choices: &[String]) -> Result<(), ValidationErrorKind> {
    match value {
        Value::String(s) if choices.contains(s) => Ok(()),
        Value::String(s) => Err(ValidationErrorKind::DefaultNotInChoices(s.clone())),
        other => Err(mismatch("string", other)),
    }
}

fn mismatch(expected: &'static str, found: &Value) -> ValidationErrorKind {
    ValidationErrorKind::DefaultTypeMismatch {
        expected,
        found: found.type_name(),
    }
}

/// A name or alias is a single token: non-empty, no leading dash, no
/// whitespace and no `=`.
fn is_valid_token(token: &str) -> bool {
    !token.is_empty()
        && !token.starts_with('-')
        && !token.contains('=')
        && !token.chars().any(char::is_whitespace)
}
