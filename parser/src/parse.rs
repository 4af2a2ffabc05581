//! Raw parsing of one flat option namespace plus positionals.

use std::collections::{BTreeMap, HashSet};

use argweave_core::{
    OptionDef, OptionKind, OptionsSchema, ParseResult, PositionalDef, PositionalKind,
    PositionalsSchema, Value,
};
use tracing::debug;

use crate::coerce::{coerce_choice, coerce_items, coerce_number};
use crate::error::{ParseError, Result};
use crate::flags::{FlagTable, RawArgs, RawFlag, tokenize};

/// Parses `argv` against an options schema and a positionals schema.
///
/// The schemas are assumed valid (see
/// [`validate_options`](argweave_core::validate_options)). The returned
/// result has no `command`; [`parse_cli`](crate::parse_cli) fills it in.
///
/// # Errors
///
/// Any [`ParseError`]; a failed parse never yields a partial result.
///
/// # Examples
///
/// ```
/// use argweave_core::*;
/// use argweave_parser::parse;
///
/// let options = OptionsSchema::new()
///     .with("name", OptionDef::string().with_default("world"))
///     .with("verbose", OptionDef::boolean().with_alias("v"));
/// let positionals = vec![PositionalDef::variadic(ItemKind::String)];
///
/// let result = parse(&["--no-verbose", "a", "b"], &options, &positionals).unwrap();
/// assert_eq!(result.value("name"), Some(&Value::from("world")));
/// assert_eq!(result.value("verbose"), Some(&Value::Bool(false)));
/// assert!(result.value("no-verbose").is_none());
/// assert_eq!(result.positional(0), Some(&Value::from(vec!["a", "b"])));
/// ```
pub fn parse<S: AsRef<str>>(
    argv: &[S],
    options: &OptionsSchema,
    positionals: &PositionalsSchema,
) -> Result<ParseResult> {
    let argv: Vec<String> = argv.iter().map(|s| s.as_ref().to_string()).collect();
    let table = FlagTable::from_options(options);
    let mut raw = tokenize(&argv, &table)?;
    debug!(
        flags = raw.flags.len(),
        positionals = raw.positionals.len(),
        "Tokenized arguments"
    );

    let negated = resolve_negations(options, &mut raw)?;
    let values = coerce_options(options, &raw.flags, &negated)?;
    let positionals = coerce_positionals(positionals, raw.positionals)?;

    Ok(ParseResult {
        command: None,
        values,
        positionals,
    })
}

/// Removes every `no-<name>` key, returning the boolean options that were
/// negated and not also set.
fn resolve_negations(options: &OptionsSchema, raw: &mut RawArgs) -> Result<HashSet<String>> {
    let mut negated = HashSet::new();

    for (name, def) in options.iter() {
        if def.kind != OptionKind::Boolean {
            continue;
        }
        let negation = format!("no-{name}");
        if raw.flags.remove(&negation).is_none() {
            continue;
        }
        if raw.flags.contains_key(name) {
            return Err(ParseError::ConflictingOptions {
                option: name.to_string(),
                negation,
            });
        }
        negated.insert(name.to_string());
    }

    Ok(negated)
}

fn coerce_options(
    options: &OptionsSchema,
    flags: &BTreeMap<String, RawFlag>,
    negated: &HashSet<String>,
) -> Result<BTreeMap<String, Value>> {
    let mut values = BTreeMap::new();

    for (name, def) in options.iter() {
        let value = match flags.get(name) {
            Some(raw) => Some(coerce_option(name, def, raw)?),
            None if negated.contains(name) => Some(Value::Bool(false)),
            None => absent_option(name, def)?,
        };
        if let Some(value) = value {
            values.insert(name.to_string(), value);
        }
    }

    Ok(values)
}

fn absent_option(name: &str, def: &OptionDef) -> Result<Option<Value>> {
    if let Some(default) = &def.default {
        return Ok(Some(default.clone()));
    }
    if def.required {
        return Err(ParseError::MissingRequiredOption(name.to_string()));
    }
    Ok(match def.kind {
        OptionKind::Count => Some(Value::Number(0.0)),
        _ => None,
    })
}

fn coerce_option(name: &str, def: &OptionDef, raw: &RawFlag) -> Result<Value> {
    let target = format!("--{name}");
    // Non-repeatable options keep the last occurrence.
    let last = raw.values.last().map(String::as_str).unwrap_or_default();

    match &def.kind {
        OptionKind::Boolean => Ok(Value::Bool(true)),
        OptionKind::Count => Ok(Value::Number(raw.occurrences as f64)),
        OptionKind::String => Ok(Value::String(last.to_string())),
        OptionKind::Number => coerce_number(&target, last),
        OptionKind::Enum { choices } => coerce_choice(&target, last, choices),
        OptionKind::Array { items, choices } => {
            coerce_items(&target, &raw.values, *items, choices.as_deref())
        }
    }
}

fn coerce_positionals(
    schema: &PositionalsSchema,
    tokens: Vec<String>,
) -> Result<Vec<Option<Value>>> {
    let mut tokens = tokens.into_iter();
    let mut values = Vec::with_capacity(schema.len());

    for (i, def) in schema.iter().enumerate() {
        let name = def.display_name(i);

        if let PositionalKind::Variadic { items, choices } = &def.kind {
            let rest: Vec<String> = tokens.by_ref().collect();
            let value = if rest.is_empty() {
                absent_variadic(&name, def)?
            } else {
                coerce_items(&name, &rest, *items, choices.as_deref())?
            };
            values.push(Some(value));
            break;
        }

        let value = match tokens.next() {
            Some(token) => Some(coerce_positional(&name, def, token)?),
            None => absent_positional(&name, def)?,
        };
        values.push(value);
    }

    if let Some(extra) = tokens.next() {
        return Err(ParseError::UnexpectedArgument(extra));
    }

    Ok(values)
}

fn coerce_positional(name: &str, def: &PositionalDef, token: String) -> Result<Value> {
    match &def.kind {
        PositionalKind::String => Ok(Value::String(token)),
        PositionalKind::Number => coerce_number(name, &token),
        PositionalKind::Enum { choices } => coerce_choice(name, &token, choices),
        PositionalKind::Variadic { items, choices } => {
            coerce_items(name, &[token], *items, choices.as_deref())
        }
    }
}

fn absent_positional(name: &str, def: &PositionalDef) -> Result<Option<Value>> {
    match (&def.default, def.required) {
        (Some(default), _) => Ok(Some(default.clone())),
        (None, true) => Err(ParseError::MissingRequiredPositional(name.to_string())),
        (None, false) => Ok(None),
    }
}

fn absent_variadic(name: &str, def: &PositionalDef) -> Result<Value> {
    Ok(absent_positional(name, def)?.unwrap_or(Value::Array(Vec::new())))
}
