//! Schema-driven command-line parsing with composable transforms and handlers.
//!
//! `argweave` ties the workspace together:
//!
//! - [`Parser`] pairs an options schema with a positionals schema and carries
//!   transforms registered with [`map`](Parser::map), [`merge`](Parser::merge)
//!   and [`pipe!`]. [`handle`](Parser::handle) finalizes it into a [`Command`].
//! - [`Cli`] validates a full program once, at [`build`](CliBuilder::build),
//!   then runs each invocation: built-in `--help`/`--version`, command
//!   resolution, parsing, global transforms, command transforms, handler.
//!
//! Sync and async stages have distinct types. [`Cli::parse`] refuses a
//! pipeline holding an async stage with [`CliError::AsyncInSyncContext`]
//! before running anything; [`Cli::parse_async`] awaits every stage in order.
//!
//! # Example
//!
//! ```
//! use argweave::{Cli, Outcome, Parser, map, pipe, handle};
//! use argweave::{ItemKind, OptionDef, OptionsSchema, ParseResult, PositionalDef, Value};
//!
//! let test = pipe!(
//!     Parser::new(
//!         OptionsSchema::new().with("jobs", OptionDef::number().with_alias("j").with_default(1.0)),
//!         vec![PositionalDef::variadic(ItemKind::String).named("paths")],
//!     )
//!     .unwrap(),
//!     map(|mut r: ParseResult| {
//!         let jobs = r.value("jobs").and_then(Value::as_number).unwrap_or(1.0);
//!         r.values.insert("jobs".into(), Value::Number(jobs.max(1.0)));
//!         r
//!     }),
//!     handle(|r: ParseResult| {
//!         assert_eq!(r.value("jobs"), Some(&Value::Number(1.0)));
//!         Ok(())
//!     }),
//! );
//!
//! let cli = Cli::builder("runner")
//!     .options(OptionsSchema::new().with("verbose", OptionDef::boolean().with_alias("v")))
//!     .command("test", "Run tests", test)
//!     .default_command("test")
//!     .build()
//!     .unwrap();
//!
//! assert!(matches!(cli.parse(&["-v", "-j", "0"]), Ok(Outcome::Handled { .. })));
//! ```

mod cli;
mod error;
mod help;
mod parser;
mod stage;

pub use argweave_core::{
    CliSchema, CommandSchema, DefaultHandler, ItemKind, OptionDef, OptionKind, OptionsSchema,
    ParseResult, PositionalDef, PositionalKind, PositionalsSchema, ValidationError,
    ValidationErrorKind, Value, validate_cli,
};
pub use argweave_parser::ParseError;
pub use cli::{Cli, CliBuilder, Outcome};
pub use error::CliError;
pub use help::{HelpRenderer, PlainHelp};
pub use parser::{Command, Parser, Pipe, handle, handle_async, map, map_async, merge, try_map};
pub use stage::{Handler, Transform};
