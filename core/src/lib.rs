//! Core schema types and construction-time validation.
//!
//! This crate defines the declarative model a command-line program is
//! described with:
//!
//! - [`OptionDef`]: a named option (`--name value`, `--flag`) of a closed
//!   [`OptionKind`], with aliases, default and metadata.
//! - [`PositionalDef`]: an unnamed, order-dependent argument of a
//!   [`PositionalKind`]; a variadic one swallows the rest.
//! - [`CommandSchema`] / [`CliSchema`]: subcommands with local schemas, and
//!   the program as a whole.
//! - [`ParseResult`] / [`Value`]: what a parse produces.
//!
//! Validation ([`validate_cli`], [`validate_options`],
//! [`validate_positionals`]) rejects alias collisions, mistyped defaults and
//! ambiguous positional sequences before anything is parsed.
//!
//! Merging ([`overlay_options`]) builds the effective option set of a
//! command from the global and command-local schemas.
//!
//! # Example
//!
//! ```
//! use argweave_core::*;
//!
//! let mut cli = CliSchema::new("mycli");
//! cli.options.insert(
//!     "verbose",
//!     OptionDef::boolean().with_alias("v").with_description("Enable verbose output"),
//! );
//! cli.commands.insert(
//!     "run".into(),
//!     CommandSchema::new("Run a script")
//!         .with_option("port", OptionDef::number().with_default(8080.0))
//!         .with_positional(PositionalDef::string().named("script").required()),
//! );
//!
//! assert!(validate_cli(&cli).is_ok());
//! let effective = overlay_options(&cli.options, &cli.commands["run"].options);
//! assert_eq!(effective.len(), 2);
//! ```

mod config;
mod merge;
mod types;
mod validate;

pub use config::{CliSchema, CommandSchema, DefaultHandler};
pub use merge::{concat_positionals, overlay_options};
pub use types::*;
pub use validate::{
    ValidationError, ValidationErrorKind, validate_cli, validate_options, validate_positionals,
};
