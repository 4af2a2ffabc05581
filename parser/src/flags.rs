//! Flag table derivation and strict argv tokenization.
//!
//! An [`OptionsSchema`] is flattened into a table of dash-prefixed spellings
//! (`--name`, `--alias`, `-a`, `--no-name`), and argv is split into raw flag
//! occurrences and raw positional tokens. No value is typed here.

use std::collections::{BTreeMap, HashMap};

use argweave_core::{OptionKind, OptionsSchema};

use crate::coerce::is_number_literal;
use crate::error::{ParseError, Result};

/// One spelling in the flag table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Flag {
    /// Canonical option name the spelling belongs to.
    pub option: String,
    /// Set for the implicit `--no-<name>` spelling of a boolean option.
    pub negated: bool,
    pub takes_value: bool,
}

impl Flag {
    /// Key the occurrence is recorded under: the option name, or
    /// `no-<name>` for a negation.
    pub fn key(&self) -> String {
        if self.negated {
            format!("no-{}", self.option)
        } else {
            self.option.clone()
        }
    }
}

/// Every accepted flag spelling, dashes included.
///
/// # Examples
///
/// ```
/// use argweave_core::{OptionDef, OptionsSchema};
/// use argweave_parser::FlagTable;
///
/// let options = OptionsSchema::new()
///     .with("verbose", OptionDef::boolean().with_alias("v"))
///     .with("name", OptionDef::string().with_alias("title"));
/// let table = FlagTable::from_options(&options);
///
/// assert!(table.lookup("-v").is_some());
/// assert!(table.lookup("--no-verbose").unwrap().negated);
/// assert!(table.lookup("--title").unwrap().takes_value);
/// assert!(table.lookup("--no-name").is_none());
/// ```
#[derive(Debug, Clone, Default)]
pub struct FlagTable {
    flags: HashMap<String, Flag>,
}

impl FlagTable {
    pub fn from_options(options: &OptionsSchema) -> Self {
        let mut flags = HashMap::new();

        for (name, def) in options.iter() {
            let flag = Flag {
                option: name.to_string(),
                negated: false,
                takes_value: def.kind.takes_value(),
            };
            flags.insert(spelling(name), flag.clone());
            if name.chars().count() == 1 {
                flags.insert(format!("--{name}"), flag.clone());
            }
            for alias in &def.aliases {
                flags.insert(spelling(alias), flag.clone());
            }
            if def.kind == OptionKind::Boolean {
                flags.insert(
                    format!("--no-{name}"),
                    Flag {
                        negated: true,
                        ..flag
                    },
                );
            }
        }

        Self { flags }
    }

    pub fn lookup(&self, spelling: &str) -> Option<&Flag> {
        self.flags.get(spelling)
    }

    /// Whether `token`, read as a flag, swallows the following argv token
    /// as its value.
    pub fn consumes_next(&self, token: &str) -> bool {
        if let Some(body) = token.strip_prefix("--") {
            return !body.contains('=')
                && self
                    .lookup(token)
                    .is_some_and(|flag| flag.takes_value);
        }
        let Some(cluster) = token.strip_prefix('-') else {
            return false;
        };
        let chars: Vec<char> = cluster.chars().collect();
        for (i, c) in chars.iter().enumerate() {
            match self.lookup(&format!("-{c}")) {
                Some(flag) if flag.takes_value => return i + 1 == chars.len(),
                Some(_) => continue,
                None => return false,
            }
        }
        false
    }
}

/// Single characters become `-x`, words become `--word`.
fn spelling(name: &str) -> String {
    if name.chars().count() == 1 {
        format!("-{name}")
    } else {
        format!("--{name}")
    }
}

/// Occurrences of one flag key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawFlag {
    pub occurrences: usize,
    pub values: Vec<String>,
}

/// Argv split into flag occurrences and positional tokens.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawArgs {
    /// Keyed by option name, or `no-<name>` for negations.
    pub flags: BTreeMap<String, RawFlag>,
    pub positionals: Vec<String>,
}

impl RawArgs {
    fn record(&mut self, flag: &Flag, value: Option<String>) {
        let entry = self.flags.entry(flag.key()).or_default();
        entry.occurrences += 1;
        entry.values.extend(value);
    }
}

/// Splits argv into raw flags and positionals.
///
/// Accepts `--name value`, `--name=value`, `-n value`, `-nvalue` and
/// clusters of no-value short flags (`-abc`). Everything after `--`, a lone
/// `-`, and negative numbers that are not themselves short flags are
/// positionals.
///
/// # Errors
///
/// [`ParseError::UnknownOption`] for spellings not in `table`,
/// [`ParseError::MissingValue`] when a value-taking flag has no value, and
/// [`ParseError::UnexpectedValue`] for `--flag=value` on a no-value flag.
pub fn tokenize(argv: &[String], table: &FlagTable) -> Result<RawArgs> {
    let mut raw = RawArgs::default();
    let mut i = 0;

    while i < argv.len() {
        let token = &argv[i];
        i += 1;

        if token == "--" {
            raw.positionals.extend(argv[i..].iter().cloned());
            break;
        }

        if let Some(body) = token.strip_prefix("--") {
            let (name, inline) = match body.split_once('=') {
                Some((name, value)) => (name, Some(value.to_string())),
                None => (body, None),
            };
            let spelled = format!("--{name}");
            let flag = table
                .lookup(&spelled)
                .ok_or_else(|| ParseError::UnknownOption(spelled.clone()))?;
            let value = match (flag.takes_value, inline) {
                (true, Some(value)) => Some(value),
                (true, None) => Some(take_value(argv, &mut i, &spelled)?),
                (false, Some(_)) => return Err(ParseError::UnexpectedValue(spelled)),
                (false, None) => None,
            };
            raw.record(flag, value);
            continue;
        }

        if token.len() > 1 && token.starts_with('-') {
            let first = token.chars().nth(1).map(|c| format!("-{c}")).unwrap_or_default();
            if is_number_literal(token) && table.lookup(&first).is_none() {
                raw.positionals.push(token.clone());
                continue;
            }
            tokenize_cluster(token, argv, &mut i, table, &mut raw)?;
            continue;
        }

        raw.positionals.push(token.clone());
    }

    Ok(raw)
}

fn tokenize_cluster(
    token: &str,
    argv: &[String],
    i: &mut usize,
    table: &FlagTable,
    raw: &mut RawArgs,
) -> Result<()> {
    let chars: Vec<char> = token.chars().skip(1).collect();

    for (j, c) in chars.iter().enumerate() {
        let spelled = format!("-{c}");
        let flag = table
            .lookup(&spelled)
            .ok_or_else(|| ParseError::UnknownOption(spelled.clone()))?;
        if !flag.takes_value {
            raw.record(flag, None);
            continue;
        }
        let rest: String = chars[j + 1..].iter().collect();
        let value = if rest.is_empty() {
            take_value(argv, i, &spelled)?
        } else {
            rest.strip_prefix('=').map(str::to_string).unwrap_or(rest)
        };
        raw.record(flag, Some(value));
        return Ok(());
    }

    Ok(())
}

fn take_value(argv: &[String], i: &mut usize, flag: &str) -> Result<String> {
    match argv.get(*i) {
        Some(next) if !looks_like_flag(next) => {
            *i += 1;
            Ok(next.clone())
        }
        _ => Err(ParseError::MissingValue(flag.to_string())),
    }
}

fn looks_like_flag(token: &str) -> bool {
    token.len() > 1 && token.starts_with('-') && !is_number_literal(token)
}
