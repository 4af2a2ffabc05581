//! User-input errors raised while parsing or resolving an argument vector.
//!
//! One taxonomy covers every way an invocation can be wrong, from unknown
//! flags to bad enum values. Callers present all of them the same way
//! (message plus usage hint); [`ParseError::is_help_trigger`] marks the ones
//! where showing full help is the better answer.

use thiserror::Error;

/// Errors that can occur while turning argv into a parse result.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// A flag spelling that no option declares.
    #[error("unknown option: {0}")]
    UnknownOption(String),

    /// A value-taking flag was last on the line or followed by another flag.
    #[error("option {0} requires a value")]
    MissingValue(String),

    /// `--flag=value` on a flag that takes no value.
    #[error("option {0} does not take a value")]
    UnexpectedValue(String),

    /// A boolean option and its `--no-` negation were both supplied.
    #[error("conflicting options: --{option} and --{negation}")]
    ConflictingOptions { option: String, negation: String },

    #[error("missing required option: --{0}")]
    MissingRequiredOption(String),

    #[error("missing required positional: {0}")]
    MissingRequiredPositional(String),

    #[error("invalid number for {target}: {value:?}")]
    InvalidNumber { target: String, value: String },

    #[error("invalid value {value:?} for {target} (expected one of: {})", .choices.join(", "))]
    InvalidChoice {
        target: String,
        value: String,
        choices: Vec<String>,
    },

    /// A positional token beyond what the schema declares.
    #[error("unexpected argument: {0}")]
    UnexpectedArgument(String),

    #[error("no command specified")]
    NoCommand,

    #[error("unknown command: {0}")]
    UnknownCommand(String),
}

impl ParseError {
    /// Whether the invocation needs more guidance than a one-line message:
    /// no command, an unknown command, or contradictory flags.
    pub fn is_help_trigger(&self) -> bool {
        matches!(
            self,
            ParseError::NoCommand
                | ParseError::UnknownCommand(_)
                | ParseError::ConflictingOptions { .. }
        )
    }
}

/// Convenience alias for results with [`ParseError`].
pub type Result<T> = std::result::Result<T, ParseError>;
