//! Argument parsing and command resolution for argweave schemas.
//!
//! Two layers, used in order:
//!
//! 1. [`resolve`] picks the subcommand named by the first non-flag token and
//!    builds its effective schema (global options overlaid with the
//!    command's own, plus the command's positionals).
//! 2. [`parse`] tokenizes argv strictly against one flat option namespace,
//!    resolves `--no-<name>` negations, applies defaults, and coerces every
//!    raw string into a typed [`Value`](argweave_core::Value).
//!
//! [`parse_cli`] runs both. Every failure is a [`ParseError`]; there are no
//! partial results.
//!
//! # Example
//!
//! ```
//! use argweave_core::*;
//! use argweave_parser::{ParseError, parse_cli};
//!
//! let mut cli = CliSchema::new("tool");
//! cli.options.insert("verbose", OptionDef::boolean().with_alias("v"));
//! cli.commands.insert(
//!     "greet".into(),
//!     CommandSchema::new("Say hello")
//!         .with_option("name", OptionDef::string().with_default("world")),
//! );
//!
//! let result = parse_cli(&["greet", "-v"], &cli).unwrap();
//! assert_eq!(result.command.as_deref(), Some("greet"));
//! assert_eq!(result.value("name"), Some(&Value::from("world")));
//!
//! let err = parse_cli(&["-v", "--no-verbose", "greet"], &cli).unwrap_err();
//! assert!(matches!(err, ParseError::ConflictingOptions { .. }));
//! ```

mod coerce;
mod error;
mod flags;
mod parse;
mod resolve;

pub use coerce::parse_number;
pub use error::{ParseError, Result};
pub use flags::{Flag, FlagTable, RawArgs, RawFlag, tokenize};
pub use parse::parse;
pub use resolve::{Resolution, find_command_token, parse_cli, resolve, scan_options};
