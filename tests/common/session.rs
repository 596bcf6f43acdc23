//! Scripted sessions.
//!
//! Runs an interpreter over a fixed block of input and returns everything
//! it wrote, so tests can assert on the exact transcript.

use parking_lot::Mutex;
use rexrepl::{Interpreter, Terminal};
use std::io::{self, Write};
use std::sync::Arc;

/// Output sink that keeps every byte written to it.
#[derive(Clone, Default)]
pub struct Capture(Arc<Mutex<Vec<u8>>>);

impl Capture {
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.0.lock()).into_owned()
    }
}

impl Write for Capture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Run `repl` until `exit` or the end of `input`, returning the transcript.
pub async fn run_script(repl: &Interpreter, input: &'static str) -> String {
    run_raw_script(repl, input.as_bytes()).await
}

/// [`run_script`] over raw bytes, which need not be valid UTF-8.
pub async fn run_raw_script(repl: &Interpreter, input: &'static [u8]) -> String {
    let capture = Capture::default();
    let terminal = Terminal::new(input, capture.clone());
    repl.run_with(terminal)
        .await
        .expect("session failed on terminal I/O");
    capture.text()
}
