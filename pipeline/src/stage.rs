//! Transform and handler stages, and their sync/async execution.
//!
//! Sync and async stages are distinct variants, so whether a pipeline can
//! run without suspending is known before any stage runs. The synchronous
//! entry points refuse async stages up front; the asynchronous ones await
//! every stage strictly in order.

use std::future::Future;

use argweave_core::ParseResult;
use futures::FutureExt;
use futures::future::LocalBoxFuture;
use tracing::debug;

use crate::error::CliError;

type SyncTransformFn = dyn Fn(ParseResult) -> anyhow::Result<ParseResult>;
type AsyncTransformFn = dyn Fn(ParseResult) -> LocalBoxFuture<'static, anyhow::Result<ParseResult>>;
type SyncHandlerFn = dyn Fn(ParseResult) -> anyhow::Result<()>;
type AsyncHandlerFn = dyn Fn(ParseResult) -> LocalBoxFuture<'static, anyhow::Result<()>>;

/// A post-parse function rewriting the parse result.
pub enum Transform {
    Sync(Box<SyncTransformFn>),
    Async(Box<AsyncTransformFn>),
}

impl Transform {
    pub fn sync<F>(f: F) -> Self
    where
        F: Fn(ParseResult) -> anyhow::Result<ParseResult> + 'static,
    {
        Transform::Sync(Box::new(f))
    }

    pub fn future<F, Fut>(f: F) -> Self
    where
        F: Fn(ParseResult) -> Fut + 'static,
        Fut: Future<Output = anyhow::Result<ParseResult>> + 'static,
    {
        Transform::Async(Box::new(move |result| f(result).boxed_local()))
    }

    pub fn is_async(&self) -> bool {
        matches!(self, Transform::Async(_))
    }
}

impl std::fmt::Debug for Transform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(if self.is_async() { "Transform::Async" } else { "Transform::Sync" })
    }
}

/// The terminal function that consumes a fully transformed parse result.
pub enum Handler {
    Sync(Box<SyncHandlerFn>),
    Async(Box<AsyncHandlerFn>),
}

impl Handler {
    pub fn sync<F>(f: F) -> Self
    where
        F: Fn(ParseResult) -> anyhow::Result<()> + 'static,
    {
        Handler::Sync(Box::new(f))
    }

    pub fn future<F, Fut>(f: F) -> Self
    where
        F: Fn(ParseResult) -> Fut + 'static,
        Fut: Future<Output = anyhow::Result<()>> + 'static,
    {
        Handler::Async(Box::new(move |result| f(result).boxed_local()))
    }

    pub fn is_async(&self) -> bool {
        matches!(self, Handler::Async(_))
    }
}

impl std::fmt::Debug for Handler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(if self.is_async() { "Handler::Async" } else { "Handler::Sync" })
    }
}

/// The stages selected for one invocation, in execution order.
pub(crate) struct Stages<'a> {
    pub transforms: Vec<&'a Transform>,
    pub handler: Option<&'a Handler>,
}

impl<'a> Stages<'a> {
    pub fn new(transforms: impl IntoIterator<Item = &'a Transform>, handler: Option<&'a Handler>) -> Self {
        Self {
            transforms: transforms.into_iter().collect(),
            handler,
        }
    }

    fn has_async(&self) -> bool {
        self.transforms.iter().any(|t| t.is_async()) || self.handler.is_some_and(Handler::is_async)
    }

    /// Runs every stage without suspending. Returns the result when no
    /// handler consumed it.
    pub fn run(&self, result: ParseResult) -> Result<Option<ParseResult>, CliError> {
        let result = self.apply(result)?;

        match self.handler {
            Some(Handler::Sync(h)) => {
                debug!("Invoking handler");
                h(result).map(|()| None).map_err(CliError::Handler)
            }
            Some(Handler::Async(_)) => Err(CliError::AsyncInSyncContext),
            None => Ok(Some(result)),
        }
    }

    /// Applies the transforms only, refusing any async stage up front.
    pub fn apply(&self, mut result: ParseResult) -> Result<ParseResult, CliError> {
        if self.has_async() {
            return Err(CliError::AsyncInSyncContext);
        }

        for (i, transform) in self.transforms.iter().enumerate() {
            debug!(stage = i, "Applying transform");
            result = match transform {
                Transform::Sync(f) => f(result).map_err(CliError::Transform)?,
                Transform::Async(_) => return Err(CliError::AsyncInSyncContext),
            };
        }

        Ok(result)
    }

    /// Awaits every stage in registration order; nothing runs concurrently.
    pub async fn run_async(&self, result: ParseResult) -> Result<Option<ParseResult>, CliError> {
        let result = self.apply_async(result).await?;

        debug!(handler = self.handler.is_some(), "Transforms complete");
        let outcome = match self.handler {
            Some(Handler::Sync(h)) => h(result),
            Some(Handler::Async(h)) => h(result).await,
            None => return Ok(Some(result)),
        };
        outcome.map(|()| None).map_err(CliError::Handler)
    }

    pub async fn apply_async(&self, mut result: ParseResult) -> Result<ParseResult, CliError> {
        for (i, transform) in self.transforms.iter().enumerate() {
            debug!(stage = i, is_async = transform.is_async(), "Applying transform");
            result = match transform {
                Transform::Sync(f) => f(result),
                Transform::Async(f) => f(result).await,
            }
            .map_err(CliError::Transform)?;
        }
        Ok(result)
    }
}
