//! Composable parsers: `map`, `merge`, `pipe` and `handle`.
//!
//! A [`Parser`] is an options/positionals schema pair carrying the transforms
//! registered on it. [`handle`](Parser::handle) finalizes it into a
//! [`Command`]. Every combinator exists both as a method and as a free
//! function returning a closure, so pipelines read left to right either way:
//!
//! ```
//! use argweave::{Parser, map, pipe};
//! use argweave::{OptionDef, OptionsSchema, Value};
//!
//! let options = OptionsSchema::new().with("name", OptionDef::string().with_default("world"));
//! let parser = Parser::from_options(options).unwrap();
//!
//! let shout = pipe!(
//!     parser,
//!     map(|mut r: argweave::ParseResult| {
//!         let name = r.value("name").and_then(Value::as_str).unwrap_or_default().to_uppercase();
//!         r.values.insert("name".into(), Value::from(name));
//!         r
//!     }),
//! );
//!
//! let result = shout.parse(&["--name", "bob"]).unwrap();
//! assert_eq!(result.value("name"), Some(&Value::from("BOB")));
//! ```

use std::future::Future;

use argweave_core::{
    OptionsSchema, ParseResult, PositionalsSchema, ValidationError, concat_positionals,
    overlay_options, validate_options, validate_positionals,
};
use tracing::debug;

use crate::error::CliError;
use crate::stage::{Handler, Stages, Transform};

/// An options/positionals schema plus its pending transforms.
#[derive(Debug, Default)]
pub struct Parser {
    options: OptionsSchema,
    positionals: PositionalsSchema,
    pub(crate) transforms: Vec<Transform>,
}

impl Parser {
    /// Creates a parser, validating both schemas.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] for alias conflicts, bad defaults or an
    /// invalid positional sequence.
    pub fn new(options: OptionsSchema, positionals: PositionalsSchema) -> Result<Self, ValidationError> {
        validate_options(&options)?;
        validate_positionals(&positionals)?;
        Ok(Self {
            options,
            positionals,
            transforms: Vec::new(),
        })
    }

    pub fn from_options(options: OptionsSchema) -> Result<Self, ValidationError> {
        Self::new(options, PositionalsSchema::new())
    }

    pub fn from_positionals(positionals: PositionalsSchema) -> Result<Self, ValidationError> {
        Self::new(OptionsSchema::new(), positionals)
    }

    /// A parser accepting no arguments at all.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn options_schema(&self) -> &OptionsSchema {
        &self.options
    }

    pub fn positionals_schema(&self) -> &PositionalsSchema {
        &self.positionals
    }

    pub fn transform_count(&self) -> usize {
        self.transforms.len()
    }

    /// Appends an infallible transform.
    pub fn map<F>(self, f: F) -> Self
    where
        F: Fn(ParseResult) -> ParseResult + 'static,
    {
        self.try_map(move |result| Ok(f(result)))
    }

    /// Appends a fallible transform. Its error aborts the pipeline.
    pub fn try_map<F>(mut self, f: F) -> Self
    where
        F: Fn(ParseResult) -> anyhow::Result<ParseResult> + 'static,
    {
        self.transforms.push(Transform::sync(f));
        self
    }

    /// Appends an async transform. The parser can then only run through the
    /// async entry points.
    pub fn map_async<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(ParseResult) -> Fut + 'static,
        Fut: Future<Output = anyhow::Result<ParseResult>> + 'static,
    {
        self.transforms.push(Transform::future(f));
        self
    }

    /// Combines two parsers.
    ///
    /// Options are unioned with `other` winning per name, positionals are
    /// concatenated, and transform chains run `self`'s first. The merged
    /// schema is validated again, so aliases that were fine apart but
    /// collide together are rejected here.
    ///
    /// # Examples
    ///
    /// ```
    /// use argweave::Parser;
    /// use argweave::{OptionDef, OptionsSchema, ValidationErrorKind};
    ///
    /// let a = Parser::from_options(OptionsSchema::new().with("verbose", OptionDef::boolean().with_alias("v"))).unwrap();
    /// let b = Parser::from_options(OptionsSchema::new().with("version", OptionDef::boolean().with_alias("v"))).unwrap();
    ///
    /// let err = a.merge(b).unwrap_err();
    /// assert!(matches!(err.kind, ValidationErrorKind::AliasConflict { .. }));
    /// ```
    pub fn merge(self, other: Parser) -> Result<Parser, ValidationError> {
        let options = overlay_options(&self.options, &other.options);
        let positionals = concat_positionals(&self.positionals, &other.positionals);
        debug!(
            options = options.len(),
            positionals = positionals.len(),
            "Merging parsers"
        );

        let mut merged = Parser::new(options, positionals)?;
        merged.transforms = self.transforms;
        merged.transforms.extend(other.transforms);
        Ok(merged)
    }

    /// Finalizes the parser into a [`Command`] with a terminal handler.
    pub fn handle<H>(self, handler: H) -> Command
    where
        H: Fn(ParseResult) -> anyhow::Result<()> + 'static,
    {
        Command::new(self, Handler::sync(handler))
    }

    pub fn handle_async<H, Fut>(self, handler: H) -> Command
    where
        H: Fn(ParseResult) -> Fut + 'static,
        Fut: Future<Output = anyhow::Result<()>> + 'static,
    {
        Command::new(self, Handler::future(handler))
    }

    /// Parses `argv` and applies the transforms synchronously.
    ///
    /// # Errors
    ///
    /// [`CliError::Usage`] for bad input, [`CliError::Transform`] when a
    /// transform fails, [`CliError::AsyncInSyncContext`] when any transform
    /// is async.
    pub fn parse<S: AsRef<str>>(&self, argv: &[S]) -> Result<ParseResult, CliError> {
        let result = self.parse_raw(argv)?;
        Stages::new(&self.transforms, None).apply(result)
    }

    pub async fn parse_async<S: AsRef<str>>(&self, argv: &[S]) -> Result<ParseResult, CliError> {
        let result = self.parse_raw(argv)?;
        Stages::new(&self.transforms, None).apply_async(result).await
    }

    fn parse_raw<S: AsRef<str>>(&self, argv: &[S]) -> Result<ParseResult, CliError> {
        argweave_parser::parse(argv, &self.options, &self.positionals).map_err(CliError::usage(None))
    }
}

/// A parser finalized with its handler.
#[derive(Debug)]
pub struct Command {
    pub(crate) parser: Parser,
    pub(crate) handler: Handler,
    pub(crate) aliases: Vec<String>,
    pub(crate) hidden: bool,
}

impl Command {
    fn new(parser: Parser, handler: Handler) -> Self {
        Self {
            parser,
            handler,
            aliases: Vec::new(),
            hidden: false,
        }
    }

    pub fn with_alias(mut self, alias: &str) -> Self {
        self.aliases.push(alias.to_string());
        self
    }

    /// Hides the command from help listings.
    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    pub fn parser(&self) -> &Parser {
        &self.parser
    }

    /// Parses `argv`, runs the transforms, then the handler.
    pub fn run<S: AsRef<str>>(&self, argv: &[S]) -> Result<(), CliError> {
        let result = self.parser.parse_raw(argv)?;
        Stages::new(&self.parser.transforms, Some(&self.handler))
            .run(result)
            .map(|_| ())
    }

    pub async fn run_async<S: AsRef<str>>(&self, argv: &[S]) -> Result<(), CliError> {
        let result = self.parser.parse_raw(argv)?;
        Stages::new(&self.parser.transforms, Some(&self.handler))
            .run_async(result)
            .await
            .map(|_| ())
    }
}

/// `map` for use with [`pipe!`](crate::pipe) or [`Pipe::pipe`].
pub fn map<F>(f: F) -> impl FnOnce(Parser) -> Parser
where
    F: Fn(ParseResult) -> ParseResult + 'static,
{
    move |parser| parser.map(f)
}

pub fn try_map<F>(f: F) -> impl FnOnce(Parser) -> Parser
where
    F: Fn(ParseResult) -> anyhow::Result<ParseResult> + 'static,
{
    move |parser| parser.try_map(f)
}

pub fn map_async<F, Fut>(f: F) -> impl FnOnce(Parser) -> Parser
where
    F: Fn(ParseResult) -> Fut + 'static,
    Fut: Future<Output = anyhow::Result<ParseResult>> + 'static,
{
    move |parser| parser.map_async(f)
}

pub fn handle<H>(handler: H) -> impl FnOnce(Parser) -> Command
where
    H: Fn(ParseResult) -> anyhow::Result<()> + 'static,
{
    move |parser| parser.handle(handler)
}

pub fn handle_async<H, Fut>(handler: H) -> impl FnOnce(Parser) -> Command
where
    H: Fn(ParseResult) -> Fut + 'static,
    Fut: Future<Output = anyhow::Result<()>> + 'static,
{
    move |parser| parser.handle_async(handler)
}

/// Merges any number of parsers left to right.
///
/// # Examples
///
/// ```
/// use argweave::{Parser, merge};
/// use argweave::{ItemKind, OptionDef, OptionsSchema, PositionalDef};
///
/// let flags = Parser::from_options(OptionsSchema::new().with("force", OptionDef::boolean())).unwrap();
/// let files = Parser::from_positionals(vec![PositionalDef::variadic(ItemKind::String)]).unwrap();
///
/// let parser = merge([flags, files]).unwrap();
/// let result = parser.parse(&["a", "--force", "b"]).unwrap();
/// assert_eq!(result.positionals.len(), 1);
/// ```
pub fn merge<I>(parsers: I) -> Result<Parser, ValidationError>
where
    I: IntoIterator<Item = Parser>,
{
    parsers
        .into_iter()
        .try_fold(Parser::empty(), |acc, next| acc.merge(next))
}

/// Left-to-right application: `value.pipe(f)` is `f(value)`.
pub trait Pipe: Sized {
    fn pipe<T, F>(self, f: F) -> T
    where
        F: FnOnce(Self) -> T,
    {
        f(self)
    }
}

impl<T> Pipe for T {}

/// Threads a value through functions left to right.
///
/// `pipe!(x, f, g)` is `g(f(x))`.
#[macro_export]
macro_rules! pipe {
    ($value:expr $(, $f:expr)* $(,)?) => {{
        let value = $value;
        $( let value = ($f)(value); )*
        value
    }};
}
