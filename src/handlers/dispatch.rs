//! Line dispatch.
//!
//! The dispatcher is the containment boundary: a line that matches nothing,
//! a handler that returns an error and a handler that panics all end up as
//! one `Error: <message>` line on the terminal. None of them reach the loop.

use super::context::CommandContext;
use super::registry::Registry;
use crate::error::DispatchError;
use crate::telemetry::{CommandTimer, spans};
use crate::terminal::Terminal;
use crate::workitems::WorkItems;
use futures_util::FutureExt;
use std::any::Any;
use std::io;
use std::panic::AssertUnwindSafe;
use tracing::{Instrument, debug};

/// How a dispatched line ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// A handler matched and returned successfully.
    Completed,
    /// A handler matched and failed; the failure was reported.
    Failed,
    /// Nothing matched; "command not found" was reported.
    NotFound,
}

impl Outcome {
    /// Whether some pattern matched the line.
    pub fn matched(self) -> bool {
        !matches!(self, Self::NotFound)
    }
}

/// Resolves lines against a frozen registry and runs the winning handler.
pub struct Dispatcher<'a> {
    registry: &'a Registry,
    work_items: WorkItems,
    terminal: Terminal,
}

impl<'a> Dispatcher<'a> {
    pub fn new(registry: &'a Registry, work_items: WorkItems, terminal: Terminal) -> Self {
        Self {
            registry,
            work_items,
            terminal,
        }
    }

    /// Dispatch `line` and report any failure on the terminal.
    ///
    /// Only a failure to write the report itself is returned.
    pub async fn dispatch(&self, line: &str) -> io::Result<Outcome> {
        match self.try_dispatch(line).await {
            Ok(()) => Ok(Outcome::Completed),
            Err(err) => {
                debug!(line = %line, error = %err, code = err.error_code(), "Command failed");
                self.terminal.write_line(format_args!("Error: {err}"), None)?;
                Ok(match err {
                    DispatchError::NotFound => Outcome::NotFound,
                    _ => Outcome::Failed,
                })
            }
        }
    }

    /// Dispatch `line` without reporting.
    ///
    /// Runs the first pattern, in registration order, that matches. Suspending
    /// handlers are awaited before this returns.
    pub async fn try_dispatch(&self, line: &str) -> Result<(), DispatchError> {
        let (entry, matched) = self.registry.find(line).ok_or(DispatchError::NotFound)?;

        let ctx = CommandContext::new(line, matched, self.work_items.clone(), self.terminal.clone());
        let span = spans::command(entry.pattern.text(), ctx.args().len());
        let _timer = CommandTimer::new(entry.pattern.text());

        let result = AssertUnwindSafe(entry.handler.invoke(ctx))
            .catch_unwind()
            .instrument(span)
            .await;

        match result {
            Ok(Ok(())) => Ok(()),
            Ok(Err(err)) => Err(DispatchError::Handler(err)),
            Err(payload) => Err(DispatchError::Panicked(panic_message(payload.as_ref()))),
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MatchOptions;
    use crate::handlers::Handler;
    use crate::workitems::ServerSet;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn dispatcher(registry: &Registry) -> Dispatcher<'_> {
        Dispatcher::new(
            registry,
            WorkItems::new(&ServerSet::new()),
            Terminal::new(&b""[..], io::sink()),
        )
    }

    fn counting(counter: &Arc<AtomicUsize>) -> Handler {
        let counter = Arc::clone(counter);
        Handler::sync(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
    }

    #[tokio::test]
    async fn only_first_match_runs() {
        let first = Arc::new(AtomicUsize::new(0));
        let second = Arc::new(AtomicUsize::new(0));
        let mut registry = Registry::new();
        registry.register("^run", MatchOptions::default(), counting(&first)).unwrap();
        registry.register("^run now$", MatchOptions::default(), counting(&second)).unwrap();

        dispatcher(&registry).try_dispatch("run now").await.unwrap();
        assert_eq!(first.load(Ordering::SeqCst), 1);
        assert_eq!(second.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn unmatched_line_is_not_found() {
        let registry = Registry::new();
        let err = dispatcher(&registry).try_dispatch("nothing").await.unwrap_err();
        assert!(matches!(err, DispatchError::NotFound));
    }

    #[tokio::test]
    async fn suspending_handler_completes_before_return() {
        let done = Arc::new(AtomicUsize::new(0));
        let flag = Arc::clone(&done);
        let mut registry = Registry::new();
        registry
            .register(
                "^wait$",
                MatchOptions::default(),
                Handler::suspending(move |_| {
                    let flag = Arc::clone(&flag);
                    async move {
                        tokio::task::yield_now().await;
                        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
                        flag.store(1, Ordering::SeqCst);
                        Ok(())
                    }
                }),
            )
            .unwrap();

        dispatcher(&registry).try_dispatch("wait").await.unwrap();
        assert_eq!(done.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn handler_error_is_wrapped() {
        let mut registry = Registry::new();
        registry
            .register(
                "^fail$",
                MatchOptions::default(),
                Handler::sync(|_| anyhow::bail!("boom")),
            )
            .unwrap();

        let err = dispatcher(&registry).try_dispatch("fail").await.unwrap_err();
        assert!(matches!(err, DispatchError::Handler(_)));
        assert_eq!(err.to_string(), "boom");
    }

    #[tokio::test]
    async fn handler_panic_is_contained() {
        let mut registry = Registry::new();
        registry
            .register(
                "^panic$",
                MatchOptions::default(),
                Handler::sync(|_| panic!("handler blew up")),
            )
            .unwrap();

        let outcome = dispatcher(&registry).dispatch("panic").await.unwrap();
        assert_eq!(outcome, Outcome::Failed);
    }

    #[tokio::test]
    async fn outcome_reports_match() {
        let mut registry = Registry::new();
        registry
            .register("^ok$", MatchOptions::default(), Handler::sync(|_| Ok(())))
            .unwrap();
        let d = dispatcher(&registry);

        assert_eq!(d.dispatch("ok").await.unwrap(), Outcome::Completed);
        assert_eq!(d.dispatch("ko").await.unwrap(), Outcome::NotFound);
        assert!(Outcome::Failed.matched());
        assert!(!Outcome::NotFound.matched());
    }
}
