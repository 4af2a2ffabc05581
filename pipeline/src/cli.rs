//! The `Cli` entry points: built-ins, command dispatch and the pipeline.

use std::collections::BTreeMap;
use std::future::Future;

use argweave_core::{
    CliSchema, CommandSchema, DefaultHandler, OptionsSchema, ParseResult, PositionalsSchema,
    ValidationError, ValidationErrorKind, overlay_options, validate_cli,
};
use argweave_parser::{find_command_token, parse, resolve, scan_options};
use tracing::debug;

use crate::error::CliError;
use crate::help::{HelpRenderer, PlainHelp};
use crate::parser::{Command, Parser};
use crate::stage::{Handler, Stages, Transform};

type VersionLookup = Box<dyn Fn() -> Option<String>>;

/// What a successful invocation produced.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// No handler applied; the transformed result is returned to the caller.
    Parsed(ParseResult),
    /// A handler consumed the result.
    Handled { command: Option<String> },
    /// `--help` was given; the rendered help text.
    Help(String),
    /// `--version` was given; the resolved version string.
    Version(String),
}

/// A validated command-line program with its transforms and handlers.
///
/// The core never prints or exits; callers decide what to do with each
/// [`Outcome`] and [`CliError`].
///
/// # Examples
///
/// ```
/// use argweave::{Cli, Outcome, Parser};
/// use argweave::{OptionDef, OptionsSchema, Value};
///
/// let greet = Parser::from_options(
///     OptionsSchema::new().with("name", OptionDef::string().with_default("world")),
/// )
/// .unwrap()
/// .handle(|result| {
///     assert_eq!(result.value("name"), Some(&Value::from("bob")));
///     Ok(())
/// });
///
/// let cli = Cli::builder("hello")
///     .version("1.2.3")
///     .command("greet", "Say hello", greet)
///     .build()
///     .unwrap();
///
/// let outcome = cli.parse(&["greet", "--name", "bob"]).unwrap();
/// assert_eq!(outcome, Outcome::Handled { command: Some("greet".into()) });
/// assert_eq!(cli.parse(&["--version"]).unwrap(), Outcome::Version("1.2.3".into()));
/// ```
pub struct Cli {
    schema: CliSchema,
    globals: Vec<Transform>,
    handler: Option<Handler>,
    default_handler: Option<Handler>,
    commands: BTreeMap<String, Command>,
    help: Box<dyn HelpRenderer>,
    version_lookup: Option<VersionLookup>,
}

impl std::fmt::Debug for Cli {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cli")
            .field("schema", &self.schema)
            .field("globals", &self.globals)
            .field("handler", &self.handler)
            .field("default_handler", &self.default_handler)
            .field("commands", &self.commands)
            .finish_non_exhaustive()
    }
}

impl Cli {
    pub fn builder(name: &str) -> CliBuilder {
        CliBuilder::new(name)
    }

    /// Wraps a plain schema with no transforms or handlers. Every successful
    /// parse yields [`Outcome::Parsed`].
    pub fn from_schema(schema: CliSchema) -> Result<Self, ValidationError> {
        validate_cli(&schema)?;
        Ok(Self {
            schema,
            globals: Vec::new(),
            handler: None,
            default_handler: None,
            commands: BTreeMap::new(),
            help: Box::new(PlainHelp),
            version_lookup: None,
        })
    }

    pub fn schema(&self) -> &CliSchema {
        &self.schema
    }

    /// Help text, scoped to `command` when it names a registered command.
    pub fn render_help(&self, command: Option<&str>) -> String {
        self.help.render(&self.schema, command)
    }

    /// The explicit version, else the lookup's answer, else `"unknown"`.
    pub fn version(&self) -> String {
        self.schema
            .version
            .clone()
            .or_else(|| self.version_lookup.as_ref().and_then(|lookup| lookup()))
            .unwrap_or_else(|| "unknown".to_string())
    }

    /// Runs one invocation synchronously.
    ///
    /// # Errors
    ///
    /// [`CliError::Usage`] for bad input (scoped to the command when one was
    /// resolved), [`CliError::AsyncInSyncContext`] when the selected pipeline
    /// holds an async stage, and transform or handler failures.
    pub fn parse<S: AsRef<str>>(&self, argv: &[S]) -> Result<Outcome, CliError> {
        let argv = to_strings(argv);
        if let Some(outcome) = self.builtin(&argv) {
            return Ok(outcome);
        }

        let result = self.parse_result(&argv)?;
        let command = result.command.clone();
        let handled = self.stages(command.as_deref()).run(result)?;
        Ok(finish(handled, command))
    }

    /// Runs one invocation, awaiting async transforms and handlers in order.
    pub async fn parse_async<S: AsRef<str>>(&self, argv: &[S]) -> Result<Outcome, CliError> {
        let argv = to_strings(argv);
        if let Some(outcome) = self.builtin(&argv) {
            return Ok(outcome);
        }

        let result = self.parse_result(&argv)?;
        let command = result.command.clone();
        let handled = self.stages(command.as_deref()).run_async(result).await?;
        Ok(finish(handled, command))
    }

    fn parse_result(&self, argv: &[String]) -> Result<ParseResult, CliError> {
        let resolution = resolve(argv, &self.schema).map_err(CliError::usage(None))?;
        let mut result = parse(&resolution.argv, &resolution.options, &resolution.positionals)
            .map_err(CliError::usage(resolution.command.clone()))?;
        result.command = resolution.command;
        debug!(command = ?result.command, values = result.values.len(), "Parsed invocation");
        Ok(result)
    }

    /// Global transforms first, then the command's, then its handler.
    fn stages(&self, command: Option<&str>) -> Stages<'_> {
        match command {
            Some(name) => match self.commands.get(name) {
                Some(cmd) => Stages::new(
                    self.globals.iter().chain(&cmd.parser.transforms),
                    Some(&cmd.handler),
                ),
                None => Stages::new(&self.globals, None),
            },
            None if self.schema.has_commands() => Stages::new(&self.globals, self.default_handler.as_ref()),
            None => Stages::new(&self.globals, self.handler.as_ref()),
        }
    }

    /// Checks for `--help`, `-h` and `--version` ahead of `--`. A spelling the
    /// effective schema defines itself is not treated as a built-in.
    fn builtin(&self, argv: &[String]) -> Option<Outcome> {
        let (command, options) = self.builtin_scope(argv);
        let end = argv.iter().position(|t| t == "--").unwrap_or(argv.len());

        for token in &argv[..end] {
            let (name, is_help) = match token.as_str() {
                "--help" => ("help", true),
                "-h" => ("h", true),
                "--version" => ("version", false),
                _ => continue,
            };
            if options.find_by_alias(name).is_some() {
                continue;
            }
            debug!(builtin = token.as_str(), command = ?command, "Built-in flag");
            return Some(if is_help {
                Outcome::Help(self.render_help(command.as_deref()))
            } else {
                Outcome::Version(self.version())
            });
        }

        None
    }

    /// The command a built-in applies to, and the options visible there.
    /// Uses the resolver's scan set so both agree on the command.
    fn builtin_scope(&self, argv: &[String]) -> (Option<String>, OptionsSchema) {
        if !self.schema.has_commands() {
            return (None, self.schema.options.clone());
        }

        let target = match find_command_token(argv, &scan_options(&self.schema)) {
            Some(index) => self.schema.find_command(&argv[index]),
            None => match &self.schema.default_handler {
                Some(DefaultHandler::Command(name)) => self.schema.find_command(name),
                _ => None,
            },
        };

        match target {
            Some((name, cmd)) => (
                Some(name.to_string()),
                overlay_options(&self.schema.options, &cmd.options),
            ),
            None => (None, self.schema.options.clone()),
        }
    }
}

fn to_strings<S: AsRef<str>>(argv: &[S]) -> Vec<String> {
    argv.iter().map(|s| s.as_ref().to_string()).collect()
}

fn finish(handled: Option<ParseResult>, command: Option<String>) -> Outcome {
    match handled {
        Some(result) => Outcome::Parsed(result),
        None => Outcome::Handled { command },
    }
}

enum DefaultTarget {
    Command(String),
    Handler(Handler),
}

/// Builder for [`Cli`]. [`build`](CliBuilder::build) validates the whole
/// schema before anything is parsed.
///
/// # Examples
///
/// ```
/// use argweave::{Cli, CliError, Parser};
/// use argweave::{OptionDef, OptionsSchema, ParseError};
///
/// let test = Parser::from_options(OptionsSchema::new().with("filter", OptionDef::string()))
///     .unwrap()
///     .handle(|_| Ok(()));
///
/// let cli = Cli::builder("runner")
///     .options(OptionsSchema::new().with("verbose", OptionDef::boolean().with_alias("v")))
///     .command("test", "Run tests", test)
///     .command_alias("test", "t")
///     .build()
///     .unwrap();
///
/// assert!(cli.parse(&["t", "-v", "--filter", "unit"]).is_ok());
///
/// let err = cli.parse(&["deploy"]).unwrap_err();
/// assert!(matches!(err, CliError::Usage { error: ParseError::UnknownCommand(_), .. }));
/// assert_eq!(err.exit_code(), 2);
/// ```
pub struct CliBuilder {
    name: String,
    version: Option<String>,
    description: Option<String>,
    options: OptionsSchema,
    positionals: PositionalsSchema,
    globals: Vec<Transform>,
    handler: Option<Handler>,
    commands: Vec<(String, String, Command)>,
    command_aliases: Vec<(String, String)>,
    default: Option<DefaultTarget>,
    help: Option<Box<dyn HelpRenderer>>,
    version_lookup: Option<VersionLookup>,
}

impl CliBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            version: None,
            description: None,
            options: OptionsSchema::new(),
            positionals: PositionalsSchema::new(),
            globals: Vec::new(),
            handler: None,
            commands: Vec::new(),
            command_aliases: Vec::new(),
            default: None,
            help: None,
            version_lookup: None,
        }
    }

    pub fn version(mut self, version: &str) -> Self {
        self.version = Some(version.to_string());
        self
    }

    pub fn description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    /// Adds a parser's options, positionals and transforms at the top level.
    /// Its transforms run before any command's.
    pub fn globals(mut self, parser: Parser) -> Self {
        self.options = overlay_options(&self.options, parser.options_schema());
        self.positionals.extend(parser.positionals_schema().iter().cloned());
        self.globals.extend(parser.transforms);
        self
    }

    pub fn options(mut self, options: OptionsSchema) -> Self {
        self.options = overlay_options(&self.options, &options);
        self
    }

    pub fn positionals(mut self, positionals: PositionalsSchema) -> Self {
        self.positionals.extend(positionals);
        self
    }

    /// Top-level handler for a CLI without commands.
    pub fn handler<H>(mut self, handler: H) -> Self
    where
        H: Fn(ParseResult) -> anyhow::Result<()> + 'static,
    {
        self.handler = Some(Handler::sync(handler));
        self
    }

    pub fn handler_async<H, Fut>(mut self, handler: H) -> Self
    where
        H: Fn(ParseResult) -> Fut + 'static,
        Fut: Future<Output = anyhow::Result<()>> + 'static,
    {
        self.handler = Some(Handler::future(handler));
        self
    }

    pub fn command(mut self, name: &str, description: &str, command: Command) -> Self {
        self.commands.push((name.to_string(), description.to_string(), command));
        self
    }

    pub fn command_alias(mut self, command: &str, alias: &str) -> Self {
        self.command_aliases.push((command.to_string(), alias.to_string()));
        self
    }

    /// Runs the named command when argv holds no command token.
    pub fn default_command(mut self, name: &str) -> Self {
        self.default = Some(DefaultTarget::Command(name.to_string()));
        self
    }

    /// Runs `handler` against the global options when argv holds no command token.
    pub fn default_handler<H>(mut self, handler: H) -> Self
    where
        H: Fn(ParseResult) -> anyhow::Result<()> + 'static,
    {
        self.default = Some(DefaultTarget::Handler(Handler::sync(handler)));
        self
    }

    pub fn default_handler_async<H, Fut>(mut self, handler: H) -> Self
    where
        H: Fn(ParseResult) -> Fut + 'static,
        Fut: Future<Output = anyhow::Result<()>> + 'static,
    {
        self.default = Some(DefaultTarget::Handler(Handler::future(handler)));
        self
    }

    pub fn help_renderer(mut self, renderer: impl HelpRenderer + 'static) -> Self {
        self.help = Some(Box::new(renderer));
        self
    }

    /// Fallback for `--version` when no explicit version is set.
    pub fn version_lookup<F>(mut self, lookup: F) -> Self
    where
        F: Fn() -> Option<String> + 'static,
    {
        self.version_lookup = Some(Box::new(lookup));
        self
    }

    /// Assembles the schema and validates it.
    ///
    /// # Errors
    ///
    /// The first [`ValidationError`] found, e.g. an alias conflict between a
    /// command-local and a global option, or a default command that is not
    /// registered.
    pub fn build(self) -> Result<Cli, ValidationError> {
        let mut schema = CliSchema::new(&self.name);
        schema.version = self.version;
        schema.description = self.description;
        schema.options = self.options;
        schema.positionals = self.positionals;
        schema.has_handler = self.handler.is_some();

        let mut commands = BTreeMap::new();
        for (name, description, command) in self.commands {
            if commands.contains_key(&name) {
                return Err(ValidationError::new(
                    format!("commands.{name}"),
                    ValidationErrorKind::DuplicateCommand(name),
                ));
            }
            schema.commands.insert(name.clone(), CommandSchema {
                description: (!description.is_empty()).then_some(description),
                options: command.parser.options_schema().clone(),
                positionals: command.parser.positionals_schema().clone(),
                aliases: command.aliases.clone(),
                hidden: command.hidden,
            });
            commands.insert(name, command);
        }

        for (target, alias) in self.command_aliases {
            match schema.commands.get_mut(&target) {
                Some(cmd) => cmd.aliases.push(alias),
                None => {
                    return Err(ValidationError::new(
                        format!("commands.{target}.aliases"),
                        ValidationErrorKind::UnknownAliasTarget(target),
                    ));
                }
            }
        }

        let default_handler = match self.default {
            Some(DefaultTarget::Command(name)) => {
                schema.default_handler = Some(DefaultHandler::Command(name));
                None
            }
            Some(DefaultTarget::Handler(handler)) => {
                schema.default_handler = Some(DefaultHandler::Handler);
                Some(handler)
            }
            None => None,
        };

        validate_cli(&schema)?;
        debug!(cli = %schema.name, commands = schema.commands.len(), "Built CLI");

        Ok(Cli {
            schema,
            globals: self.globals,
            handler: self.handler,
            default_handler,
            commands,
            help: self.help.unwrap_or_else(|| Box::new(PlainHelp)),
            version_lookup: self.version_lookup,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use argweave_core::{OptionDef, PositionalDef, Value};
    use argweave_parser::ParseError;
    use futures::executor::block_on;

    use super::*;

    fn recorder() -> (Rc<RefCell<Vec<ParseResult>>>, impl Fn(ParseResult) -> anyhow::Result<()>) {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        (seen, move |result| {
            sink.borrow_mut().push(result);
            Ok(())
        })
    }

    #[test]
    fn test_handler_receives_command_result() {
        let (seen, handler) = recorder();
        let test = Parser::from_options(OptionsSchema::new().with("filter", OptionDef::string()))
            .unwrap()
            .handle(handler);
        let cli = Cli::builder("runner")
            .options(OptionsSchema::new().with("verbose", OptionDef::boolean()))
            .command("test", "Run tests", test)
            .build()
            .unwrap();

        let outcome = cli.parse(&["test", "--verbose", "--filter", "x"]).unwrap();
        assert_eq!(outcome, Outcome::Handled { command: Some("test".into()) });

        let seen = seen.borrow();
        assert_eq!(seen[0].command.as_deref(), Some("test"));
        assert_eq!(seen[0].value("verbose"), Some(&Value::Bool(true)));
        assert_eq!(seen[0].value("filter"), Some(&Value::from("x")));
    }

    #[test]
    fn test_top_level_handler_without_commands() {
        let (seen, handler) = recorder();
        let cli = Cli::builder("greet")
            .positionals(vec![PositionalDef::string().named("who").with_default("world")])
            .handler(handler)
            .build()
            .unwrap();

        assert!(matches!(cli.parse::<&str>(&[]), Ok(Outcome::Handled { command: None })));
        assert_eq!(seen.borrow()[0].positional(0), Some(&Value::from("world")));
    }

    #[test]
    fn test_build_rejects_handler_with_commands() {
        let cmd = Parser::empty().handle(|_| Ok(()));
        let err = Cli::builder("x")
            .handler(|_| Ok(()))
            .command("a", "A", cmd)
            .build()
            .unwrap_err();
        assert_eq!(err.kind, ValidationErrorKind::HandlerWithCommands);
    }

    #[test]
    fn test_build_rejects_alias_for_unknown_command() {
        let err = Cli::builder("x").command_alias("nope", "n").build().unwrap_err();
        assert_eq!(err.kind, ValidationErrorKind::UnknownAliasTarget("nope".into()));
    }

    #[test]
    fn test_default_handler_runs_without_command_token() {
        let (seen, handler) = recorder();
        let cmd = Parser::empty().handle(|_| Ok(()));
        let cli = Cli::builder("x")
            .options(OptionsSchema::new().with("verbose", OptionDef::boolean()))
            .command("a", "A", cmd)
            .default_handler(handler)
            .build()
            .unwrap();

        assert_eq!(cli.parse(&["--verbose"]).unwrap(), Outcome::Handled { command: None });
        assert_eq!(seen.borrow()[0].value("verbose"), Some(&Value::Bool(true)));
    }

    #[test]
    fn test_help_is_scoped_and_suppressible() {
        let cmd = Parser::from_options(OptionsSchema::new().with("host", OptionDef::string().with_alias("h")))
            .unwrap()
            .handle(|_| Ok(()));
        let cli = Cli::builder("x").command("serve", "Serve", cmd).build().unwrap();

        match cli.parse(&["serve", "--help"]).unwrap() {
            Outcome::Help(text) => assert!(text.starts_with("Usage: x serve")),
            other => panic!("expected help, got {other:?}"),
        }
        match cli.parse(&["-h"]).unwrap() {
            Outcome::Help(text) => assert!(text.contains("Commands:")),
            other => panic!("expected help, got {other:?}"),
        }
        // `-h` belongs to the command's `--host` option here.
        let err = cli.parse(&["serve", "-h"]).unwrap_err();
        assert_eq!(
            err.command(),
            Some("serve"),
        );
        assert!(matches!(err, CliError::Usage { error: ParseError::MissingValue(_), .. }));
    }

    #[test]
    fn test_default_command_keeps_its_own_short_h() {
        let (seen, handler) = recorder();
        let serve = Parser::from_options(OptionsSchema::new().with("host", OptionDef::string().with_alias("h")))
            .unwrap()
            .handle(handler);
        let cli = Cli::builder("x")
            .command("serve", "Serve", serve)
            .default_command("serve")
            .build()
            .unwrap();

        for argv in [&["serve", "-h", "localhost"][..], &["-h", "localhost"][..]] {
            let outcome = cli.parse(argv).unwrap();
            assert_eq!(outcome, Outcome::Handled { command: Some("serve".into()) });
        }
        let seen = seen.borrow();
        assert_eq!(seen.len(), 2);
        assert!(seen.iter().all(|r| r.value("host") == Some(&Value::from("localhost"))));

        match cli.parse(&["--help"]).unwrap() {
            Outcome::Help(text) => assert!(text.starts_with("Usage: x serve")),
            other => panic!("expected help, got {other:?}"),
        }
    }

    #[test]
    fn test_builtins_ignored_after_terminator() {
        let cli = Cli::builder("echo")
            .positionals(vec![PositionalDef::variadic(argweave_core::ItemKind::String)])
            .build()
            .unwrap();

        let outcome = cli.parse(&["--", "--help"]).unwrap();
        let Outcome::Parsed(result) = outcome else {
            panic!("expected parsed result");
        };
        assert_eq!(result.positional(0), Some(&Value::from(vec!["--help"])));
    }

    #[test]
    fn test_version_resolution_order() {
        let cli = Cli::builder("x").version_lookup(|| Some("9.9.9".into())).build().unwrap();
        assert_eq!(cli.parse(&["--version"]).unwrap(), Outcome::Version("9.9.9".into()));

        let cli = Cli::builder("x").build().unwrap();
        assert_eq!(cli.version(), "unknown");

        let cli = Cli::builder("x")
            .options(OptionsSchema::new().with("version", OptionDef::string()))
            .build()
            .unwrap();
        let Outcome::Parsed(result) = cli.parse(&["--version", "2"]).unwrap() else {
            panic!("user option should win");
        };
        assert_eq!(result.value("version"), Some(&Value::from("2")));
    }

    #[test]
    fn test_async_handler_requires_parse_async() {
        let cmd = Parser::empty().handle_async(|_| async { Ok(()) });
        let cli = Cli::builder("x").command("a", "A", cmd).build().unwrap();

        assert!(matches!(cli.parse(&["a"]), Err(CliError::AsyncInSyncContext)));
        assert_eq!(
            block_on(cli.parse_async(&["a"])).unwrap(),
            Outcome::Handled { command: Some("a".into()) }
        );
    }

    #[test]
    fn test_from_schema_returns_parsed() {
        let mut schema = CliSchema::new("x");
        schema.options.insert("n", OptionDef::number().with_default(1.0));
        let cli = Cli::from_schema(schema).unwrap();

        let Outcome::Parsed(result) = cli.parse::<&str>(&[]).unwrap() else {
            panic!("expected parsed result");
        };
        assert_eq!(result.value("n"), Some(&Value::Number(1.0)));
    }
}
