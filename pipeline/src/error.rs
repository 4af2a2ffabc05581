//! Error type for running a parser or CLI.

use argweave_core::ValidationError;
use argweave_parser::ParseError;
use thiserror::Error;

/// Errors that can occur while running a [`Cli`](crate::Cli),
/// [`Parser`](crate::Parser) or [`Command`](crate::Command).
#[derive(Debug, Error)]
pub enum CliError {
    /// The invocation was wrong. `command` scopes which help text fits.
    #[error("{error}")]
    Usage {
        command: Option<String>,
        #[source]
        error: ParseError,
    },

    /// A schema composed at runtime (e.g. by [`merge`](crate::merge)) is invalid.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("transform failed: {0:#}")]
    Transform(anyhow::Error),

    #[error("handler failed: {0:#}")]
    Handler(anyhow::Error),

    /// The synchronous entry point met an async transform or handler.
    #[error("an async transform or handler is registered; use the async entry point (parse_async)")]
    AsyncInSyncContext,
}

impl CliError {
    pub(crate) fn usage(command: Option<String>) -> impl FnOnce(ParseError) -> Self {
        move |error| CliError::Usage { command, error }
    }

    /// Whether the caller should print usage help along with the message.
    pub fn is_usage(&self) -> bool {
        matches!(self, CliError::Usage { .. })
    }

    /// Command the failure belongs to, when one was resolved.
    pub fn command(&self) -> Option<&str> {
        match self {
            CliError::Usage { command, .. } => command.as_deref(),
            _ => None,
        }
    }

    /// Process exit status a binary should use for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Usage { .. } => 2,
            _ => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_usage_error_display_and_scope() {
        let err = CliError::usage(Some("test".into()))(ParseError::MissingValue("--filter".into()));
        assert_eq!(err.to_string(), "option --filter requires a value");
        assert_eq!(err.command(), Some("test"));
        assert_eq!(err.exit_code(), 2);
        assert!(err.is_usage());
    }

    #[test]
    fn test_handler_error_display_includes_cause() {
        let err = CliError::Handler(anyhow::anyhow!("disk full").context("writing report"));
        assert_eq!(err.to_string(), "handler failed: writing report: disk full");
        assert_eq!(err.exit_code(), 1);
    }
}
