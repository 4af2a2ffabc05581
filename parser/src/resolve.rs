//! Command resolution: picking the subcommand and its effective schema.
//!
//! The first non-flag token of argv names the command. It is spliced out,
//! and the remaining tokens are parsed against the global options overlaid
//! with the command's own options and the command's positionals.

use argweave_core::{
    CliSchema, CommandSchema, DefaultHandler, OptionsSchema, ParseResult, PositionalsSchema,
    overlay_options,
};
use tracing::debug;

use crate::error::{ParseError, Result};
use crate::flags::FlagTable;
use crate::parse::parse;

/// The command chosen for an invocation and what to parse for it.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    /// Canonical command name; `None` for command-less CLIs and for the
    /// default handler.
    pub command: Option<String>,
    /// Global options overlaid with the command's local options.
    pub options: OptionsSchema,
    pub positionals: PositionalsSchema,
    /// Argv with the command token removed.
    pub argv: Vec<String>,
}

/// Finds the index of the candidate command token.
///
/// Flags are skipped, along with the value token of flags in `options` that
/// take one (`--name value`). Scanning stops at `--`.
pub fn find_command_token<S: AsRef<str>>(argv: &[S], options: &OptionsSchema) -> Option<usize> {
    let table = FlagTable::from_options(options);
    let mut skip_next = false;

    for (i, token) in argv.iter().enumerate() {
        let token = token.as_ref();
        if skip_next {
            skip_next = false;
            continue;
        }
        if token == "--" {
            return None;
        }
        if token.starts_with('-') {
            skip_next = table.consumes_next(token);
            continue;
        }
        return Some(i);
    }

    None
}

/// Resolves which command applies to `argv`.
///
/// Without commands, the top-level schema applies unchanged. With commands:
/// a matching token selects that command; no token falls back to the
/// default handler (a named default command behaves as if its name came
/// first); an unknown token is an error.
///
/// # Errors
///
/// [`ParseError::NoCommand`] when no command token is present and there is
/// no default, [`ParseError::UnknownCommand`] for an unregistered token.
///
/// # Examples
///
/// ```
/// use argweave_core::*;
/// use argweave_parser::resolve;
///
/// let mut cli = CliSchema::new("tool");
/// cli.options.insert("verbose", OptionDef::boolean());
/// cli.commands.insert(
///     "test".into(),
///     CommandSchema::new("Run tests").with_option("filter", OptionDef::string()),
/// );
///
/// let resolution = resolve(&["--verbose", "test", "--filter", "x"], &cli).unwrap();
/// assert_eq!(resolution.command.as_deref(), Some("test"));
/// assert_eq!(resolution.argv, vec!["--verbose", "--filter", "x"]);
/// assert_eq!(resolution.options.len(), 2);
/// ```
pub fn resolve<S: AsRef<str>>(argv: &[S], cli: &CliSchema) -> Result<Resolution> {
    let argv: Vec<String> = argv.iter().map(|s| s.as_ref().to_string()).collect();

    if !cli.has_commands() {
        return Ok(Resolution {
            command: None,
            options: cli.options.clone(),
            positionals: cli.positionals.clone(),
            argv,
        });
    }

    let Some(index) = find_command_token(&argv, &scan_options(cli)) else {
        return match &cli.default_handler {
            Some(DefaultHandler::Command(name)) => {
                debug!(command = %name, "No command token, using default command");
                resolve_command(name, argv, cli)
            }
            Some(DefaultHandler::Handler) => {
                debug!("No command token, using default handler");
                Ok(Resolution {
                    command: None,
                    options: cli.options.clone(),
                    positionals: Vec::new(),
                    argv,
                })
            }
            None => Err(ParseError::NoCommand),
        };
    };

    let mut remaining = argv;
    let token = remaining.remove(index);
    resolve_command(&token, remaining, cli)
}

/// Options whose values the command scan skips: the globals, plus the
/// default command's own options so that `--filter x` alone still reaches it.
///
/// Pass the result to [`find_command_token`] to locate the same command
/// token [`resolve`] would.
pub fn scan_options(cli: &CliSchema) -> OptionsSchema {
    match &cli.default_handler {
        Some(DefaultHandler::Command(name)) => match cli.find_command(name) {
            Some((_, command)) => overlay_options(&cli.options, &command.options),
            None => cli.options.clone(),
        },
        _ => cli.options.clone(),
    }
}

fn resolve_command(token: &str, argv: Vec<String>, cli: &CliSchema) -> Result<Resolution> {
    let (name, command) = cli
        .find_command(token)
        .ok_or_else(|| ParseError::UnknownCommand(token.to_string()))?;
    debug!(command = %name, remaining = argv.len(), "Resolved command");
    Ok(merged(name, command, &cli.options, argv))
}

fn merged(name: &str, command: &CommandSchema, globals: &OptionsSchema, argv: Vec<String>) -> Resolution {
    Resolution {
        command: Some(name.to_string()),
        options: overlay_options(globals, &command.options),
        positionals: command.positionals.clone(),
        argv,
    }
}

/// Resolves the command and parses the remaining argv against its schema.
///
/// # Examples
///
/// ```
/// use argweave_core::*;
/// use argweave_parser::parse_cli;
///
/// let mut cli = CliSchema::new("tool");
/// cli.options.insert("verbose", OptionDef::boolean());
/// cli.commands.insert(
///     "test".into(),
///     CommandSchema::new("Run tests").with_option("filter", OptionDef::string()),
/// );
///
/// let result = parse_cli(&["test", "--verbose", "--filter", "x"], &cli).unwrap();
/// assert_eq!(result.command.as_deref(), Some("test"));
/// assert_eq!(result.value("verbose"), Some(&Value::Bool(true)));
/// assert_eq!(result.value("filter"), Some(&Value::from("x")));
/// ```
pub fn parse_cli<S: AsRef<str>>(argv: &[S], cli: &CliSchema) -> Result<ParseResult> {
    let resolution = resolve(argv, cli)?;
    let mut result = parse(&resolution.argv, &resolution.options, &resolution.positionals)?;
    result.command = resolution.command;
    Ok(result)
}

#[cfg(test)]
mod tests {
    use argweave_core::{OptionDef, PositionalDef};

    use super::*;

    fn cli() -> CliSchema {
        let mut cli = CliSchema::new("tool");
        cli.options.insert("verbose", OptionDef::boolean());
        cli.options.insert("config", OptionDef::string().with_alias("c"));
        cli.commands.insert(
            "test".into(),
            CommandSchema::new("Run tests")
                .with_option("filter", OptionDef::string())
                .with_alias("t"),
        );
        cli.commands.insert(
            "build".into(),
            CommandSchema::new("Build").with_positional(PositionalDef::string().named("target")),
        );
        cli
    }

    #[test]
    fn test_find_command_token_skips_global_values() {
        let globals = cli().options;
        assert_eq!(find_command_token(&["--config", "a.toml", "test"], &globals), Some(2));
        assert_eq!(find_command_token(&["-c", "a.toml", "test"], &globals), Some(2));
        assert_eq!(find_command_token(&["--config=a.toml", "test"], &globals), Some(1));
        assert_eq!(find_command_token(&["--verbose"], &globals), None);
        assert_eq!(find_command_token(&["--", "test"], &globals), None);
    }

    #[test]
    fn test_no_command_without_default() {
        assert_eq!(resolve(&["--verbose"], &cli()), Err(ParseError::NoCommand));
    }

    #[test]
    fn test_unknown_command() {
        assert_eq!(
            resolve(&["deploy"], &cli()),
            Err(ParseError::UnknownCommand("deploy".into()))
        );
    }

    #[test]
    fn test_alias_resolves_to_canonical_name() {
        let resolution = resolve(&["t"], &cli()).unwrap();
        assert_eq!(resolution.command.as_deref(), Some("test"));
    }

    #[test]
    fn test_default_command_consumes_flags() {
        let mut cli = cli();
        cli.default_handler = Some(DefaultHandler::Command("test".into()));

        let result = parse_cli(&["--filter", "unit"], &cli).unwrap();
        assert_eq!(result.command.as_deref(), Some("test"));
        assert_eq!(result.value("filter"), Some(&argweave_core::Value::from("unit")));
    }

    #[test]
    fn test_scan_options_include_default_command_values() {
        let mut cli = cli();
        assert!(!scan_options(&cli).contains("filter"));

        cli.default_handler = Some(DefaultHandler::Command("test".into()));
        let scan = scan_options(&cli);
        assert!(scan.contains("filter"));
        assert_eq!(find_command_token(&["--filter", "unit"], &scan), None);
    }

    #[test]
    fn test_default_handler_sees_globals_only() {
        let mut cli = cli();
        cli.default_handler = Some(DefaultHandler::Handler);

        let resolution = resolve(&["--verbose"], &cli).unwrap();
        assert_eq!(resolution.command, None);
        assert!(resolution.positionals.is_empty());
        assert!(!resolution.options.contains("filter"));

        assert_eq!(
            parse_cli(&["--filter", "x"], &cli),
            Err(ParseError::UnknownOption("--filter".into()))
        );
    }

    #[test]
    fn test_command_positionals_not_shared() {
        let result = parse_cli(&["build", "web"], &cli()).unwrap();
        assert_eq!(result.command.as_deref(), Some("build"));
        assert_eq!(result.positional(0), Some(&argweave_core::Value::from("web")));

        assert_eq!(
            parse_cli(&["test", "web"], &cli()),
            Err(ParseError::UnexpectedArgument("web".into()))
        );
    }

    #[test]
    fn test_commandless_cli_uses_top_level_schema() {
        let mut cli = CliSchema::new("greet");
        cli.positionals.push(PositionalDef::string().named("who"));

        let result = parse_cli(&["bob"], &cli).unwrap();
        assert_eq!(result.command, None);
        assert_eq!(result.positional(0), Some(&argweave_core::Value::from("bob")));
    }
}
