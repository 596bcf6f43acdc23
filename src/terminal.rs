//! Terminal access shared by the loop and the running handler.
//!
//! Output goes through a locked `std::io::Write` sink so both sync and
//! suspending handlers can print. Input is an async line source; the loop
//! holds its lock only while reading, which lets a handler prompt the user
//! (see [`Terminal::confirm`]) while the loop waits on it.

use crossterm::queue;
use crossterm::style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor};
use parking_lot::Mutex;
use std::fmt::Display;
use std::io::{self, Write};
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::debug;

/// Semantic colors for handler output.
pub mod palette {
    use crossterm::style::Color;

    pub const MUTED: Color = Color::DarkGrey;
    pub const WARNING: Color = Color::Yellow;
    pub const DANGER: Color = Color::DarkRed;
    pub const SUCCESS: Color = Color::DarkGreen;
    pub const INFO: Color = Color::Cyan;
}

/// Answers accepted by [`Terminal::confirm`]. Empty means "accept the default".
const CONFIRM_ANSWERS: &[&str] = &["yes", "y", ""];

type Output = Box<dyn Write + Send>;
type Input = Box<dyn AsyncBufRead + Send + Unpin>;

/// Cloneable handle over one input source and one output sink.
#[derive(Clone)]
pub struct Terminal {
    output: Arc<Mutex<Output>>,
    input: Arc<tokio::sync::Mutex<Input>>,
}

impl Terminal {
    /// Bind any line source and sink.
    pub fn new<R, W>(input: R, output: W) -> Self
    where
        R: AsyncBufRead + Send + Unpin + 'static,
        W: Write + Send + 'static,
    {
        Self {
            output: Arc::new(Mutex::new(Box::new(output))),
            input: Arc::new(tokio::sync::Mutex::new(Box::new(input))),
        }
    }

    /// Bind the process's stdin and stdout.
    pub fn stdio() -> Self {
        Self::new(BufReader::new(tokio::io::stdin()), io::stdout())
    }

    /// Write a value, optionally in a foreground color, without a newline.
    pub fn write(&self, value: impl Display, color: Option<Color>) -> io::Result<()> {
        self.write_on(value, color, None)
    }

    /// Write a value with optional foreground and background colors.
    pub fn write_on(
        &self,
        value: impl Display,
        color: Option<Color>,
        background: Option<Color>,
    ) -> io::Result<()> {
        let mut guard = self.output.lock();
        let out = &mut *guard;
        write_colored(out, value, color, background)?;
        out.flush()
    }

    /// Write a value followed by a line terminator.
    pub fn write_line(&self, value: impl Display, color: Option<Color>) -> io::Result<()> {
        self.write_line_on(value, color, None)
    }

    /// Write a line with optional foreground and background colors.
    ///
    /// The terminator is written after the colors are reset.
    pub fn write_line_on(
        &self,
        value: impl Display,
        color: Option<Color>,
        background: Option<Color>,
    ) -> io::Result<()> {
        let mut guard = self.output.lock();
        let out = &mut *guard;
        write_colored(out, value, color, background)?;
        out.write_all(b"\n")?;
        out.flush()
    }

    /// Write `count` line terminators.
    pub fn line_break(&self, count: usize) -> io::Result<()> {
        let mut out = self.output.lock();
        for _ in 0..count {
            out.write_all(b"\n")?;
        }
        out.flush()
    }

    /// Read one line without its terminator. `None` at end of input.
    pub async fn read_line(&self) -> io::Result<Option<String>> {
        self.read_line_colored(None).await
    }

    /// Read one line while the echoed input is shown in `color`.
    pub async fn read_line_colored(&self, color: Option<Color>) -> io::Result<Option<String>> {
        if let Some(color) = color {
            let mut guard = self.output.lock();
            let out = &mut *guard;
            queue!(out, SetForegroundColor(color))?;
            out.flush()?;
        }

        let mut buf = Vec::new();
        let read = self.input.lock().await.read_until(b'\n', &mut buf).await;

        if color.is_some() {
            let mut guard = self.output.lock();
            let out = &mut *guard;
            queue!(out, ResetColor)?;
            out.flush()?;
        }

        if read? == 0 {
            return Ok(None);
        }
        let mut line = match String::from_utf8(buf) {
            Ok(line) => line,
            Err(err) => {
                debug!(error = %err.utf8_error(), "Replaced invalid UTF-8 in input");
                String::from_utf8_lossy(err.as_bytes()).into_owned()
            }
        };
        let trimmed_len = line.trim_end_matches(['\r', '\n']).len();
        line.truncate(trimmed_len);
        Ok(Some(line))
    }

    /// Ask a yes/no question. An empty answer accepts.
    ///
    /// End of input counts as a refusal.
    pub async fn confirm(&self, message: impl Display, color: Option<Color>) -> io::Result<bool> {
        self.confirm_on(message, color, None).await
    }

    /// [`Terminal::confirm`] with an optional background color for the question.
    pub async fn confirm_on(
        &self,
        message: impl Display,
        color: Option<Color>,
        background: Option<Color>,
    ) -> io::Result<bool> {
        self.write_on(format_args!("{message} [yes] : "), color, background)?;
        let Some(answer) = self.read_line().await? else {
            return Ok(false);
        };
        let answer = answer.trim().to_lowercase();
        Ok(CONFIRM_ANSWERS.contains(&answer.as_str()))
    }
}

fn write_colored<W: Write>(
    out: &mut W,
    value: impl Display,
    color: Option<Color>,
    background: Option<Color>,
) -> io::Result<()> {
    if color.is_none() && background.is_none() {
        return write!(out, "{value}");
    }
    if let Some(color) = color {
        queue!(out, SetForegroundColor(color))?;
    }
    if let Some(background) = background {
        queue!(out, SetBackgroundColor(background))?;
    }
    queue!(out, Print(value), ResetColor)
}

impl std::fmt::Debug for Terminal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Terminal").finish_non_exhaustive()
    }
}
