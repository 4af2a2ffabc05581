use std::fs;
use std::path::Path;

use anyhow::{Context, bail};
use argweave::{
    Cli, CliError, CliSchema, ItemKind, OptionDef, OptionsSchema, Outcome, ParseResult, Parser,
    PositionalDef, ValidationError, Value, validate_cli,
};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

const PACKAGE_VERSION: &str = env!("CARGO_PKG_VERSION");

fn main() {
    let cli = match build_cli() {
        Ok(cli) => cli,
        Err(err) => {
            eprintln!("error: invalid command-line definition: {err}");
            std::process::exit(1);
        }
    };

    let argv: Vec<String> = std::env::args().skip(1).collect();
    init_logging(verbosity(&argv));

    match cli.parse(&argv) {
        Ok(Outcome::Help(text)) => print!("{text}"),
        Ok(Outcome::Version(version)) => println!("argweave {version}"),
        Ok(Outcome::Parsed(_) | Outcome::Handled { .. }) => {}
        Err(err) => {
            report(&cli, &err);
            std::process::exit(exit_code(&err));
        }
    }
}

fn build_cli() -> Result<Cli, ValidationError> {
    let globals = Parser::from_options(OptionsSchema::new().with(
        "verbose",
        OptionDef::count()
            .with_alias("v")
            .with_description("Increase log verbosity (-v, -vv, -vvv)"),
    ))?;

    let check = Parser::from_positionals(vec![
        PositionalDef::variadic(ItemKind::String)
            .named("schemas")
            .with_description("Schema JSON files to validate")
            .required(),
    ])?
    .handle(run_check);

    let parse = Parser::new(
        OptionsSchema::new().with(
            "format",
            OptionDef::enumeration(["json", "yaml"])
                .with_alias("f")
                .with_default("json")
                .with_description("Output format for the parse result"),
        ),
        vec![
            schema_arg(),
            PositionalDef::variadic(ItemKind::String)
                .named("args")
                .with_description("Arguments to parse; pass them after `--`"),
        ],
    )?
    .handle(run_parse);

    let help = Parser::from_positionals(vec![
        schema_arg(),
        PositionalDef::string()
            .named("command")
            .with_description("Command to scope the help text to"),
    ])?
    .handle(run_help);

    Cli::builder("argweave")
        .version(PACKAGE_VERSION)
        .description("Validate argweave schema files and parse arguments against them")
        .globals(globals)
        .command("check", "Validate one or more schema files", check)
        .command("parse", "Parse arguments against a schema and print the result", parse)
        .command("help", "Render help text for a schema", help)
        .build()
}

fn schema_arg() -> PositionalDef {
    PositionalDef::string()
        .named("schema")
        .with_description("Path to a schema JSON file")
        .required()
}

/// Counts `-v`/`--verbose` ahead of `--`, so logging is up before parsing
/// starts. Only leading `v`s of a short cluster count; `-fv` reads `v` as a
/// value.
fn verbosity(argv: &[String]) -> usize {
    argv.iter()
        .take_while(|token| *token != "--")
        .map(|token| match token.strip_prefix('-') {
            Some("-verbose") => 1,
            Some(cluster) if !cluster.starts_with('-') => cluster.chars().take_while(|c| *c == 'v').count(),
            _ => 0,
        })
        .sum()
}

fn init_logging(verbosity: usize) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with_writer(std::io::stderr)
        .try_init();
}

fn report(cli: &Cli, err: &CliError) {
    match err {
        CliError::Usage { .. } => {
            eprintln!("error: {err}\n");
            eprint!("{}", cli.render_help(err.command()));
        }
        // Usage errors against a loaded schema were reported with that schema's help.
        CliError::Handler(inner)
            if inner.downcast_ref::<CliError>().is_some_and(CliError::is_usage) => {}
        CliError::Handler(inner) => eprintln!("error: {inner:#}"),
        other => eprintln!("error: {other}"),
    }
}

fn exit_code(err: &CliError) -> i32 {
    match err {
        CliError::Handler(inner) => inner.downcast_ref::<CliError>().map_or(1, CliError::exit_code),
        other => other.exit_code(),
    }
}

fn run_check(result: ParseResult) -> anyhow::Result<()> {
    let paths = string_list(result.positional(0));
    for path in &paths {
        let schema = load_schema(Path::new(path))?;
        validate_cli(&schema).with_context(|| format!("Invalid schema '{path}'"))?;
        info!(path = %path, name = %schema.name, commands = schema.commands.len(), "Schema is valid");
    }

    println!("Validated {} schema file(s).", paths.len());
    Ok(())
}

fn run_parse(result: ParseResult) -> anyhow::Result<()> {
    let path = required_str(&result, 0)?;
    let format = result.value("format").and_then(Value::as_str).unwrap_or("json");
    let args = string_list(result.positional(1));

    let cli = load_cli(Path::new(path))?;
    debug!(schema = %path, args = args.len(), "Parsing against schema");

    match cli.parse(&args) {
        Ok(Outcome::Parsed(parsed)) => print!("{}", render(&parsed, format)?),
        Ok(Outcome::Help(text)) => print!("{text}"),
        Ok(Outcome::Version(version)) => println!("{version}"),
        Ok(Outcome::Handled { .. }) => {}
        Err(err) => {
            if err.is_usage() {
                eprintln!("error: {err}\n");
                eprint!("{}", cli.render_help(err.command()));
            }
            return Err(err.into());
        }
    }
    Ok(())
}

fn run_help(result: ParseResult) -> anyhow::Result<()> {
    let path = required_str(&result, 0)?;
    let command = result.positional(1).and_then(Value::as_str);

    let cli = load_cli(Path::new(path))?;
    if let Some(command) = command {
        if cli.schema().find_command(command).is_none() {
            bail!("Unknown command '{command}' in schema '{path}'");
        }
    }

    print!("{}", cli.render_help(command));
    Ok(())
}

fn load_schema(path: &Path) -> anyhow::Result<CliSchema> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read '{}'", path.display()))?;
    CliSchema::from_json(&raw).with_context(|| format!("Failed to parse '{}'", path.display()))
}

fn load_cli(path: &Path) -> anyhow::Result<Cli> {
    let schema = load_schema(path)?;
    Cli::from_schema(schema).with_context(|| format!("Invalid schema '{}'", path.display()))
}

fn render(result: &ParseResult, format: &str) -> anyhow::Result<String> {
    match format {
        "yaml" => serde_yaml::to_string(result).context("Failed to serialize result as YAML"),
        _ => serde_json::to_string_pretty(result)
            .map(|json| format!("{json}\n"))
            .context("Failed to serialize result as JSON"),
    }
}

fn required_str(result: &ParseResult, index: usize) -> anyhow::Result<&str> {
    match result.positional(index).and_then(Value::as_str) {
        Some(value) => Ok(value),
        None => bail!("missing positional argument {}", index + 1),
    }
}

fn string_list(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_array)
        .unwrap_or_default()
        .iter()
        .filter_map(Value::as_str)
        .map(str::to_string)
        .collect()
}
