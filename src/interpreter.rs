//! The interpreter: registration API and the read-eval-print loop.
//!
//! Wiring happens on `&mut Interpreter` before the loop starts. [`Interpreter::run`]
//! takes `&self`, so the options, the registry and the server list are frozen
//! for the whole session.
//!
//! ## Loop states
//!
//! ```text
//! ShowHeader -> Prompting -> Dispatching -> Prompting -> ... -> Terminated
//! ```
//!
//! `Prompting` re-prompts silently on blank lines and moves to `Terminated`
//! on `exit` (any case) or end of input. `Dispatching` writes the optional
//! blank separator line after a matched command.

use crate::config::{Config, MatchOptions, Options};
use crate::error::{ConfigError, RegistrationError};
use crate::handlers::{Dispatcher, Handler, Registry};
use crate::telemetry::spans;
use crate::terminal::Terminal;
use crate::workitems::{ServerEntry, ServerSet, WorkItems};
use std::io;
use tracing::{Instrument, debug, info};

/// Word that ends the session, compared case-insensitively.
const EXIT_COMMAND: &str = "exit";

/// Position of the loop.
#[derive(Debug, PartialEq, Eq)]
enum State {
    ShowHeader,
    Prompting,
    Dispatching(String),
    Terminated,
}

/// Embeddable read-eval-print loop.
#[derive(Debug, Default)]
pub struct Interpreter {
    options: Options,
    registry: Registry,
    servers: ServerSet,
}

impl Interpreter {
    /// Interpreter with default options and nothing registered.
    pub fn new() -> Self {
        Self::default()
    }

    /// Interpreter with the options and servers of a loaded config.
    pub fn from_config(config: Config) -> Result<Self, ConfigError> {
        let mut interpreter = Self::new();
        interpreter.configure(|options| *options = config.options);
        for entry in config.servers {
            interpreter.servers.add(entry)?;
        }
        Ok(interpreter)
    }

    /// Adjust the options.
    ///
    /// Default match options and auto-anchoring are read when a command is
    /// registered, so configure before registering commands.
    pub fn configure<F>(&mut self, f: F) -> &mut Self
    where
        F: FnOnce(&mut Options),
    {
        f(&mut self.options);
        self.registry.set_auto_anchor(self.options.auto_anchor_patterns);
        self
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn servers(&self) -> &ServerSet {
        &self.servers
    }

    /// Register a work item server handlers can reach by `name`.
    pub fn add_server(
        &mut self,
        name: impl Into<String>,
        url: impl Into<String>,
        personal_access_token: impl Into<String>,
    ) -> Result<&mut Self, RegistrationError> {
        self.servers
            .add(ServerEntry::new(name, url, personal_access_token))?;
        Ok(self)
    }

    /// Register `handler` for `pattern` with the default match options.
    pub fn add_command(
        &mut self,
        pattern: &str,
        handler: Handler,
    ) -> Result<&mut Self, RegistrationError> {
        let options = self.options.default_match_options;
        self.add_command_with(pattern, options, handler)
    }

    /// Register `handler` for `pattern` with explicit match options.
    pub fn add_command_with(
        &mut self,
        pattern: &str,
        options: MatchOptions,
        handler: Handler,
    ) -> Result<&mut Self, RegistrationError> {
        self.registry.register(pattern, options, handler)?;
        Ok(self)
    }

    /// Run on the process's stdin and stdout until `exit`.
    pub async fn run(&self) -> io::Result<()> {
        self.run_with(Terminal::stdio()).await
    }

    /// Run on `terminal` until `exit` or end of input.
    ///
    /// Only terminal I/O failures are returned; command failures are
    /// reported on the terminal and the loop continues.
    pub async fn run_with(&self, terminal: Terminal) -> io::Result<()> {
        self.session(terminal)
            .instrument(spans::session(&self.options.prompt))
            .await
    }

    async fn session(&self, terminal: Terminal) -> io::Result<()> {
        let options = &self.options;
        let dispatcher = Dispatcher::new(
            &self.registry,
            WorkItems::new(&self.servers),
            terminal.clone(),
        );
        info!(
            commands = self.registry.len(),
            servers = self.servers.len(),
            "Session started"
        );

        let mut state = State::ShowHeader;
        loop {
            state = match state {
                State::ShowHeader => {
                    if !options.header_text.is_empty() {
                        terminal.write_line(&options.header_text, options.header_color)?;
                    }
                    State::Prompting
                }
                State::Prompting => match self.read_command(&terminal).await? {
                    Some(line) if is_exit(&line) => State::Terminated,
                    Some(line) => State::Dispatching(line),
                    None => {
                        debug!("End of input");
                        State::Terminated
                    }
                },
                State::Dispatching(line) => {
                    let outcome = dispatcher.dispatch(&line).await?;
                    if outcome.matched() && options.line_break_between_commands {
                        terminal.line_break(1)?;
                    }
                    State::Prompting
                }
                State::Terminated => {
                    info!("Session ended");
                    return Ok(());
                }
            };
        }
    }

    /// Prompt until a non-blank line arrives. `None` at end of input.
    async fn read_command(&self, terminal: &Terminal) -> io::Result<Option<String>> {
        let options = &self.options;
        loop {
            terminal.write(&options.prompt, options.prompt_color)?;
            let Some(raw) = terminal.read_line_colored(options.input_color).await? else {
                return Ok(None);
            };

            let line = if options.trim_command {
                raw.trim().to_string()
            } else {
                raw
            };
            if !line.trim().is_empty() {
                return Ok(Some(line));
            }
        }
    }
}

fn is_exit(line: &str) -> bool {
    line.eq_ignore_ascii_case(EXIT_COMMAND)
}
