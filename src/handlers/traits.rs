//! Handler shapes.
//!
//! A registered command is bound to exactly one [`Handler`]:
//!
//! - [`Handler::Sync`]: runs to completion inside the dispatcher's call.
//! - [`Handler::Suspending`]: returns a future the dispatcher awaits before
//!   the loop reads the next line. It may yield at its own await points
//!   (e.g. a work item request) but never runs alongside another handler.
//!
//! Struct-based handlers implement [`Command`] and are wrapped with
//! [`Handler::command`].

use super::context::CommandContext;
use crate::error::HandlerResult;
use async_trait::async_trait;
use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use std::future::Future;
use std::sync::Arc;

type SyncFn = dyn Fn(&CommandContext) -> HandlerResult + Send + Sync;
type SuspendingFn = dyn Fn(CommandContext) -> BoxFuture<'static, HandlerResult> + Send + Sync;

/// Callback bound to a registered pattern.
pub enum Handler {
    Sync(Box<SyncFn>),
    Suspending(Box<SuspendingFn>),
}

impl Handler {
    /// Wrap a plain callback.
    pub fn sync<F>(f: F) -> Self
    where
        F: Fn(&CommandContext) -> HandlerResult + Send + Sync + 'static,
    {
        Self::Sync(Box::new(f))
    }

    /// Wrap a callback returning a future.
    ///
    /// The context is moved into the callback so the future can own it.
    pub fn suspending<F, Fut>(f: F) -> Self
    where
        F: Fn(CommandContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        Self::Suspending(Box::new(move |ctx: CommandContext| f(ctx).boxed()))
    }

    /// Wrap a [`Command`] implementation as a suspending handler.
    pub fn command<C: Command + 'static>(command: C) -> Self {
        let command = Arc::new(command);
        Self::Suspending(Box::new(move |ctx: CommandContext| {
            let command = Arc::clone(&command);
            async move { command.execute(ctx).await }.boxed()
        }))
    }

    /// Whether the dispatcher has to await this handler.
    pub fn is_suspending(&self) -> bool {
        matches!(self, Self::Suspending(_))
    }

    /// Run the handler to completion.
    pub(crate) async fn invoke(&self, ctx: CommandContext) -> HandlerResult {
        match self {
            Self::Sync(f) => f(&ctx),
            Self::Suspending(f) => f(ctx).await,
        }
    }
}

impl std::fmt::Debug for Handler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sync(_) => f.write_str("Handler::Sync"),
            Self::Suspending(_) => f.write_str("Handler::Suspending"),
        }
    }
}

/// Struct-based command handler.
#[async_trait]
pub trait Command: Send + Sync {
    async fn execute(&self, ctx: CommandContext) -> HandlerResult;
}
