//! Telemetry utilities for command timing and span construction.

use std::time::Instant;

/// Guard for timing one handler invocation.
///
/// Emits the elapsed time at trace level when dropped, so the timing is
/// recorded whether the handler succeeded or failed.
pub struct CommandTimer {
    pattern: String,
    start: Instant,
}

impl CommandTimer {
    /// Start timing a command.
    pub fn new(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            start: Instant::now(),
        }
    }
}

impl Drop for CommandTimer {
    fn drop(&mut self) {
        let elapsed_ms = self.start.elapsed().as_secs_f64() * 1000.0;
        tracing::trace!(pattern = %self.pattern, elapsed_ms, "Command finished");
    }
}

/// Standardized span constructors for REPL observability.
pub mod spans {
    use tracing::{Span, debug_span, info_span};

    /// Span covering one interactive session.
    pub fn session(prompt: &str) -> Span {
        info_span!("repl.session", prompt = %prompt)
    }

    /// Span covering one dispatched command.
    pub fn command(pattern: &str, args: usize) -> Span {
        debug_span!("repl.command", pattern = %pattern, args = args)
    }
}
