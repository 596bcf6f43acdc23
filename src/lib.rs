//! rexrepl - an embeddable, regex-dispatched read-eval-print loop.
//!
//! Register pattern/handler pairs on an [`Interpreter`], then [`Interpreter::run`]
//! it. Each line typed is matched against the patterns in registration order
//! and the first match's handler runs with a fresh [`CommandContext`].
//!
//! ```no_run
//! use rexrepl::{Handler, Interpreter};
//!
//! # async fn demo() -> anyhow::Result<()> {
//! let mut repl = Interpreter::new();
//! repl.configure(|o| o.prompt = ">> ".into());
//! repl.add_command("^echo (.+)$", Handler::sync(|ctx| {
//!     ctx.terminal().write_line(ctx.matched().group(1).unwrap_or(""), None)?;
//!     Ok(())
//! }))?;
//! repl.run().await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod handlers;
pub mod interpreter;
pub mod telemetry;
pub mod terminal;
pub mod workitems;

pub use config::{Config, MatchOptions, Options};
pub use error::{ConfigError, DispatchError, HandlerResult, RegistrationError};
pub use handlers::{Command, CommandContext, CommandMatch, Handler, Outcome};
pub use interpreter::Interpreter;
pub use terminal::{Terminal, palette};
pub use workitems::{ServerEntry, WorkItemError, WorkItems};
